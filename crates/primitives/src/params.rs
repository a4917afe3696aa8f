use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::time::TimeTicks;

/// Per-rollup parameters, fixed when the chain is created.
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
pub struct ChainParams {
    /// Exact amount a staker has to put down.
    pub stake_requirement: u64,

    /// Ticks an assertion stays disputable before it can be confirmed.
    pub grace_period: TimeTicks,

    /// Upper bound on the steps a single assertion may claim.
    pub max_execution_steps: u64,

    /// Execution speed used to turn an assertion's gas into extra deadline slack.
    pub arb_gas_speed_limit_per_tick: u64,
}

impl ChainParams {
    /// Ticks of slack an assertion consuming `num_gas` gets on top of the grace period.
    pub fn check_time(&self, num_gas: u64) -> TimeTicks {
        TimeTicks::new(
            num_gas
                .checked_div(self.arb_gas_speed_limit_per_tick)
                .unwrap_or(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_time() {
        let params = ChainParams {
            stake_requirement: 10,
            grace_period: TimeTicks::new(13_000),
            max_execution_steps: 1_000_000,
            arb_gas_speed_limit_per_tick: 200_000,
        };
        assert_eq!(params.check_time(0), TimeTicks::ZERO);
        assert_eq!(params.check_time(199_999), TimeTicks::ZERO);
        assert_eq!(params.check_time(1_000_000), TimeTicks::new(5));
    }

    #[test]
    fn test_check_time_zero_speed_limit() {
        let params = ChainParams {
            stake_requirement: 10,
            grace_period: TimeTicks::new(13_000),
            max_execution_steps: 1_000_000,
            arb_gas_speed_limit_per_tick: 0,
        };
        assert_eq!(params.check_time(1_000_000), TimeTicks::ZERO);
    }
}
