//! Node identities in the dispute tree.
//!
//! A node hash is `H(prev, step)` where the step is `H(protoStateHash, deadlineTicks,
//! nodeDataHash, childType)`. Keeping the parent outside the inner hash is what lets
//! [`calculate_path`](crate::path::calculate_path) walk from an ancestor to a descendant using
//! only the descendants' steps.

use std::fmt;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    buf::Buf32,
    hash::{hash_pair, Hasher},
    time::TimeTicks,
};

/// Content hash identifying a node of the dispute tree.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Default,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct NodeHash(Buf32);

impl_buf_wrapper!(NodeHash, Buf32, 32);

/// Which of the four outcomes of an assertion a node represents.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum ChildType {
    InvalidPending = 0,
    InvalidMessages = 1,
    InvalidExecution = 2,
    Valid = 3,
}

impl ChildType {
    /// All branches in branch-id order.
    pub const ALL: [ChildType; 4] = [
        ChildType::InvalidPending,
        ChildType::InvalidMessages,
        ChildType::InvalidExecution,
        ChildType::Valid,
    ];

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_valid(self) -> bool {
        matches!(self, ChildType::Valid)
    }
}

impl TryFrom<u8> for ChildType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ChildType::ALL
            .get(value as usize)
            .copied()
            .ok_or(value)
    }
}

impl fmt::Display for ChildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChildType::InvalidPending => "invalid-pending",
            ChildType::InvalidMessages => "invalid-messages",
            ChildType::InvalidExecution => "invalid-execution",
            ChildType::Valid => "valid",
        };
        f.write_str(s)
    }
}

/// The step a path proof uses to move from a node's parent to the node.
pub fn node_path_step(
    vm_proto_state_hash: &Buf32,
    deadline_ticks: TimeTicks,
    node_data_hash: &Buf32,
    child_type: ChildType,
) -> Buf32 {
    Hasher::new()
        .buf32(vm_proto_state_hash)
        .u64(deadline_ticks.get())
        .buf32(node_data_hash)
        .u8(child_type.as_u8())
        .finish()
}

/// Hash of the child of `prev` with the given contents.
pub fn child_node_hash(
    prev: &NodeHash,
    deadline_ticks: TimeTicks,
    node_data_hash: &Buf32,
    child_type: ChildType,
    vm_proto_state_hash: &Buf32,
) -> NodeHash {
    let step = node_path_step(vm_proto_state_hash, deadline_ticks, node_data_hash, child_type);
    NodeHash::new(hash_pair(prev.inner(), &step))
}
