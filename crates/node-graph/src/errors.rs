use arbor_primitives::{Address, BlockHeight, ChildType, NodeHash, TimeTicks};
use thiserror::Error;

pub type NodeGraphResult<T> = Result<T, NodeGraphError>;

/// Reasons a dispute-graph operation is rejected.
///
/// Every operation validates before it mutates, so receiving any of these means the graph is
/// unchanged.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum NodeGraphError {
    /// A path proof did not resolve to the node it was supposed to.
    #[error("invalid path proof: {0}")]
    InvalidProof(&'static str),

    #[error("wrong stake amount (expected {expected}, got {got})")]
    WrongStakeAmount { expected: u64, got: u64 },

    #[error("staker {0:?} already has a stake")]
    DuplicateStaker(Address),

    #[error("unknown staker {0:?}")]
    UnknownStaker(Address),

    /// The recomputed predecessor of an assertion is not a current leaf.
    #[error("node {0:?} is not a leaf")]
    UnknownLeaf(NodeHash),

    #[error("unknown node {0:?}")]
    UnknownNode(NodeHash),

    #[error("assertion claims {steps} steps, max is {max}")]
    TooManySteps { steps: u64, max: u64 },

    #[error("height {height} outside assertion time bounds {start}..={end}")]
    OutOfTimeBounds {
        height: BlockHeight,
        start: BlockHeight,
        end: BlockHeight,
    },

    #[error("assertion imports messages without reading the inbox")]
    MessagesWithoutRead,

    #[error("assertion imports {requested} messages, only {available} pending")]
    InsufficientPending { requested: u64, available: u64 },

    #[error("asserting staker is not positioned on the asserted leaf")]
    StakerNotAtLeaf,

    /// Recovery proofs do not branch apart at their first step.
    #[error("staker position does not conflict with the latest confirmed node")]
    NotMoot,

    #[error("deadline {deadline} not passed at {now}")]
    NotPastDeadline { now: TimeTicks, deadline: TimeTicks },

    #[error("pruned leaf does not conflict with the latest confirmed node")]
    PruneConflict,

    #[error("recovery proof must not be empty")]
    EmptyProof,

    #[error("branch {0} cannot be confirmed as invalid")]
    WrongBranch(ChildType),

    #[error("staker alignment failed: {0}")]
    StakerAlignmentFailed(String),

    #[error("no active staker on the confirmed node")]
    NoActiveStaker,

    #[error("deadline {deadline} not reached at {now}")]
    DeadlineNotReached { now: TimeTicks, deadline: TimeTicks },

    /// The node rebuilt from the confirmation inputs is not the tracked successor of the
    /// latest confirmed node.
    #[error("confirmation target {computed:?} does not match tracked successor {tracked:?}")]
    ConfirmTargetMismatch {
        computed: NodeHash,
        tracked: Option<NodeHash>,
    },

    /// Outgoing messages supplied for a valid node do not match its claimed accumulator.
    #[error("messages do not match the assertion on node {0:?}")]
    MessagesMismatch(NodeHash),
}

impl NodeGraphError {
    pub(crate) fn alignment(msg: impl Into<String>) -> Self {
        Self::StakerAlignmentFailed(msg.into())
    }
}
