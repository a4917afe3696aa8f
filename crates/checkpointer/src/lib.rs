//! Crash-safe persistence of validator state, keyed by parent-chain block.
//!
//! The [`Checkpointer`] keeps a single pending snapshot that newer snapshots replace, writes it
//! out on a timer, garbage collects checkpoints that fell out of the reorg window and, on
//! startup, restores the newest checkpoint that is still on the canonical chain.

mod checkpointer;
mod codec;
mod context;
mod daemons;
mod errors;
mod oracle;

pub use checkpointer::Checkpointer;
pub use codec::{decode_checkpoint, encode_checkpoint};
pub use context::{CheckpointContext, RestoreContext};
pub use daemons::{cleanup_daemon, spawn_daemons, write_daemon, DaemonHandles};
pub use errors::{CheckpointError, CheckpointResult};
pub use oracle::ChainTimeOracle;
