//! Small, deterministic chain fixtures.

use arbor_primitives::{hash::Hasher, Address, BlockHeight, BlockId, Buf20, ChainParams, TimeTicks};

/// Chain parameters with a five block grace period and cheap check time.
pub fn test_chain_params() -> ChainParams {
    ChainParams {
        stake_requirement: 100,
        grace_period: TimeTicks::from_blocks(5),
        max_execution_steps: 10_000,
        arb_gas_speed_limit_per_tick: 100,
    }
}

/// Staker address filled with `n`, so addresses order the same way as their indices.
pub fn test_staker(n: u8) -> Address {
    Address::new(Buf20::new([n; 20]))
}

/// Canonical block id at `height` on test fork `fork`.
pub fn test_block_id(height: BlockHeight, fork: u8) -> BlockId {
    let hash = Hasher::new().u64(height).u8(fork).finish();
    BlockId::new(height, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staker_order_follows_index() {
        assert!(test_staker(1) < test_staker(2));
        assert_ne!(test_block_id(3, 0), test_block_id(3, 1));
        assert_eq!(test_block_id(3, 0).height(), 3);
    }
}
