use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{buf::Buf32, hash::Hasher};

/// Summary of the machine and inbox state at a node.
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
pub struct VMProtoData {
    pub machine_hash: Buf32,
    pub pending_top: Buf32,
    pub pending_count: u64,
}

impl VMProtoData {
    pub fn new(machine_hash: Buf32, pending_top: Buf32, pending_count: u64) -> Self {
        Self {
            machine_hash,
            pending_top,
            pending_count,
        }
    }

    /// The proto-state hash binding a node to this machine and inbox state.
    pub fn hash(&self) -> Buf32 {
        proto_state_hash(&self.machine_hash, &self.pending_top, self.pending_count)
    }
}

/// `H(machineHash, pendingTop, pendingCount)`.
pub fn proto_state_hash(machine_hash: &Buf32, pending_top: &Buf32, pending_count: u64) -> Buf32 {
    Hasher::new()
        .buf32(machine_hash)
        .buf32(pending_top)
        .u64(pending_count)
        .finish()
}

/// Summary of the global inbox's pending queue, as last observed on the parent chain.
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
pub struct PendingInbox {
    pub top_hash: Buf32,
    pub count: u64,
}

impl PendingInbox {
    pub fn new(top_hash: Buf32, count: u64) -> Self {
        Self { top_hash, count }
    }
}
