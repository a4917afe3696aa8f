use std::fmt;

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::buf::Buf32;

/// Height of a block on the parent chain.
pub type BlockHeight = u64;

/// Identifies a specific parent-chain block at some height.
///
/// Ordered by height first, the hash only disambiguates competing blocks at the same height.
#[derive(
    Copy,
    Clone,
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
pub struct BlockId {
    height: BlockHeight,
    hash: Buf32,
}

impl BlockId {
    pub fn new(height: BlockHeight, hash: Buf32) -> Self {
        Self { height, hash }
    }

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn hash(&self) -> &Buf32 {
        &self.hash
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.height, self.hash)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId(height={}, hash={:?})", self.height, self.hash)
    }
}
