//! Assertion claims as submitted by a staker.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{block::BlockHeight, buf::Buf32, hash::Hasher};

/// Compact digest of an off-chain execution claim.
///
/// Only carries the hashes and counts needed to check the claim, never the execution data
/// itself.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct ExecutionAssertionStub {
    pub num_gas: u64,
    pub before_machine_hash: Buf32,
    pub after_machine_hash: Buf32,
    pub before_inbox_hash: Buf32,
    pub after_inbox_hash: Buf32,
    pub first_message_hash: Buf32,
    pub last_message_hash: Buf32,
    pub message_count: u64,
    pub first_log_hash: Buf32,
    pub last_log_hash: Buf32,
    pub log_count: u64,
    /// Whether execution read from the inbox at all.
    pub did_inbox_insn: bool,
}

impl ExecutionAssertionStub {
    pub fn hash(&self) -> Buf32 {
        Hasher::new()
            .u64(self.num_gas)
            .buf32(&self.before_machine_hash)
            .buf32(&self.after_machine_hash)
            .buf32(&self.before_inbox_hash)
            .buf32(&self.after_inbox_hash)
            .buf32(&self.first_message_hash)
            .buf32(&self.last_message_hash)
            .u64(self.message_count)
            .buf32(&self.first_log_hash)
            .buf32(&self.last_log_hash)
            .u64(self.log_count)
            .bool(self.did_inbox_insn)
            .finish()
    }
}

/// Inclusive range of parent-chain heights an assertion is valid in.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct TimeBounds {
    pub start: BlockHeight,
    pub end: BlockHeight,
}

impl TimeBounds {
    pub fn new(start: BlockHeight, end: BlockHeight) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, height: BlockHeight) -> bool {
        self.start <= height && height <= self.end
    }
}

/// Parameters of an assertion that are checked against the chain, not the execution.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct AssertionParams {
    pub num_steps: u64,
    pub time_bounds: TimeBounds,
    pub imported_message_count: u64,
}

/// The execution outcome an assertion claims.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct AssertionClaim {
    pub after_pending_top: Buf32,
    pub imported_messages_slice: Buf32,
    pub assertion_stub: ExecutionAssertionStub,
}
