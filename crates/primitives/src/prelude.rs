pub use crate::{
    address::Address,
    assertion::{AssertionClaim, AssertionParams, ExecutionAssertionStub, TimeBounds},
    block::{BlockHeight, BlockId},
    buf::{Buf20, Buf32},
    node::{ChildType, NodeHash},
    params::ChainParams,
    path::PathProof,
    proto::{PendingInbox, VMProtoData},
    time::TimeTicks,
};
