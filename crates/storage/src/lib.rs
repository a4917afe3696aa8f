//! Storage managers over the raw checkpoint database.

mod managers;
pub mod ops;

pub use managers::checkpoint::{CheckpointDbManager, StoredObject};
