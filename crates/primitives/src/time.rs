use std::{fmt, ops::Add};

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::block::BlockHeight;

/// Number of protocol ticks in one block.
pub const TICKS_PER_BLOCK: u64 = 1000;

/// Protocol time, measured in ticks. Deadlines and challenge periods are expressed in ticks so
/// sub-block durations such as an assertion's check time can be represented.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
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
#[serde(transparent)]
pub struct TimeTicks(u64);

impl TimeTicks {
    pub const ZERO: Self = Self(0);

    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Ticks at the start of the given block height.
    pub const fn from_blocks(height: BlockHeight) -> Self {
        Self(height.saturating_mul(TICKS_PER_BLOCK))
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl Add for TimeTicks {
    type Output = TimeTicks;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for TimeTicks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}t", self.0)
    }
}
