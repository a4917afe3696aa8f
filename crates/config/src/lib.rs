//! Validator configuration, loaded from TOML.

mod config;

pub use config::{CheckpointConfig, Config, DbConfig, LoggingConfig};
