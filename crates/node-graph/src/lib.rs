//! The dispute engine of the rollup.
//!
//! [`NodeGraph`] tracks the tree of assertion outcomes, the stakers positioned on it and the
//! latest confirmed node. Operations mirror the calls a validator can make on the parent chain
//! and return the [`RollupEvent`]s that call would have emitted.

pub mod assertion;
pub mod conf_proof;
pub mod confirm;
pub mod context;
pub mod errors;
pub mod events;
pub mod graph;
pub mod node;
pub mod staker;

pub use conf_proof::{ConfirmOpportunity, ConfirmProof, ConfirmValidOpportunity};
pub use context::{CallContext, PrevLeafContext};
pub use errors::{NodeGraphError, NodeGraphResult};
pub use events::{AssertedEvent, RollupEvent};
pub use graph::NodeGraph;
pub use node::{DisputableNode, Node};
pub use staker::{Staker, StakerProof};
