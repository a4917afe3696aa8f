//! Events emitted by graph operations, for listeners that mirror or audit the dispute.

use arbor_primitives::{
    assertion::{AssertionClaim, AssertionParams},
    Address, Buf32, NodeHash,
};

/// Something observable that happened to the dispute graph.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RollupEvent {
    StakeCreated {
        staker: Address,
        location: NodeHash,
    },
    StakeRefunded {
        staker: Address,
        amount: u64,
    },
    StakeMoved {
        staker: Address,
        location: NodeHash,
    },
    Asserted(AssertedEvent),
    Confirmed {
        node: NodeHash,
    },
    /// The outgoing messages of a confirmed valid node, released to the parent chain.
    ConfirmedAssertion {
        logs_acc_hash: Buf32,
        messages: Vec<Vec<u8>>,
    },
    Pruned {
        leaf: NodeHash,
    },
}

/// A new assertion, carrying the full claim so other validators can check it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssertedEvent {
    pub prev_leaf: NodeHash,
    pub params: AssertionParams,
    pub claim: AssertionClaim,
    pub max_pending_top: Buf32,
    pub max_pending_count: u64,
}
