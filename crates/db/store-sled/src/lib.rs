//! Sled store for the checkpoint database.

pub mod checkpoint;
mod config;
mod init;
mod lexicographic;
pub mod macros;
mod tree;
mod utils;

pub use checkpoint::db::CheckpointDBSled;
pub use config::{Backoff, ConstantBackoff, SledDbConfig};
pub use init::open_sled_database;

pub const SLED_NAME: &str = "arbor-checkpoints";
