//! Hashing primitives and plain data types shared by the dispute engine and the checkpointer.
//!
//! Everything in here is pure: no I/O, no interior state. The hash layouts defined in
//! [`node`] and [`challenge`] are consensus-relevant, changing any of them changes every node
//! identity in the dispute tree.

#[macro_use]
mod macros;

pub mod address;
pub mod assertion;
pub mod block;
pub mod buf;
pub mod challenge;
pub mod hash;
pub mod node;
pub mod params;
pub mod path;
pub mod proto;
pub mod time;

pub mod prelude;

pub use address::Address;
pub use block::{BlockHeight, BlockId};
pub use buf::{Buf20, Buf32};
pub use node::{ChildType, NodeHash};
pub use params::ChainParams;
pub use path::PathProof;
pub use proto::{PendingInbox, VMProtoData};
pub use time::TimeTicks;
