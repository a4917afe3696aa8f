use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use arbor_common::logging::{format_service_name, FileLoggingConfig, LogFormat, LoggerConfig};
use arbor_primitives::ChainParams;
use serde::{Deserialize, Serialize};

/// Default value for `datadir` in [`Config`].
const DEFAULT_DATADIR: &str = "arbor-data";

/// Default depth below the newest checkpoint that is kept around for reorgs.
const DEFAULT_MAX_REORG_HEIGHT: u64 = 100;

const DEFAULT_WRITE_INTERVAL_BLOCKS: u64 = 2;

const DEFAULT_CLEANUP_INTERVAL_BLOCKS: u64 = 25;

/// Default wall-clock duration of one parent-chain block, in ms.
const DEFAULT_BLOCK_TIME_MS: u64 = 13_000;

/// Default DB retry count.
const DEFAULT_DB_RETRY_COUNT: u16 = 3;

/// Default DB retry delay in ms.
const DEFAULT_DB_RETRY_DELAY: u64 = 150;

fn default_datadir() -> PathBuf {
    DEFAULT_DATADIR.into()
}

fn default_max_reorg_height() -> u64 {
    DEFAULT_MAX_REORG_HEIGHT
}

fn default_write_interval_blocks() -> u64 {
    DEFAULT_WRITE_INTERVAL_BLOCKS
}

fn default_cleanup_interval_blocks() -> u64 {
    DEFAULT_CLEANUP_INTERVAL_BLOCKS
}

fn default_block_time_ms() -> u64 {
    DEFAULT_BLOCK_TIME_MS
}

fn default_db_retry_count() -> u16 {
    DEFAULT_DB_RETRY_COUNT
}

fn default_db_retry_delay() -> u64 {
    DEFAULT_DB_RETRY_DELAY
}

/// Checkpointer timing and retention.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Checkpoints more than this many blocks below the newest one are garbage collected,
    /// except the most recent of them.
    #[serde(default = "default_max_reorg_height")]
    pub max_reorg_height: u64,

    #[serde(default = "default_write_interval_blocks")]
    pub write_interval_blocks: u64,

    #[serde(default = "default_cleanup_interval_blocks")]
    pub cleanup_interval_blocks: u64,

    #[serde(default = "default_block_time_ms")]
    pub block_time_ms: u64,

    /// Delete any existing checkpoint database on startup. Meant for testing.
    #[serde(default)]
    pub force_fresh_start: bool,
}

impl CheckpointConfig {
    pub fn write_interval(&self) -> Duration {
        Duration::from_millis(self.write_interval_blocks.saturating_mul(self.block_time_ms))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(
            self.cleanup_interval_blocks
                .saturating_mul(self.block_time_ms),
        )
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            max_reorg_height: DEFAULT_MAX_REORG_HEIGHT,
            write_interval_blocks: DEFAULT_WRITE_INTERVAL_BLOCKS,
            cleanup_interval_blocks: DEFAULT_CLEANUP_INTERVAL_BLOCKS,
            block_time_ms: DEFAULT_BLOCK_TIME_MS,
            force_fresh_start: false,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DbConfig {
    /// For optimistic transactions, how many times to retry if a write fails.
    #[serde(default = "default_db_retry_count")]
    pub retry_count: u16,

    /// Db retry delay in ms.
    #[serde(default = "default_db_retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_DB_RETRY_COUNT,
            retry_delay_ms: DEFAULT_DB_RETRY_DELAY,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Service label to append to the service name (e.g., "prod", "dev").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_label: Option<String>,

    /// Directory path for file-based logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<bool>,
}

impl LoggingConfig {
    /// Builds the logger config for a service, labelled if a label is configured.
    pub fn to_logger_config(&self, base_name: &str) -> LoggerConfig {
        let name = format_service_name(base_name, self.service_label.as_deref());
        let format = LogFormat::from_json_flag(self.json_format.unwrap_or(false));
        let mut config = LoggerConfig::new(name).with_stdout_format(format);

        if let Some(dir) = &self.log_dir {
            let prefix = self
                .log_file_prefix
                .clone()
                .unwrap_or_else(|| base_name.to_owned());
            config = config
                .with_file_logging(FileLoggingConfig::new(dir.clone(), prefix).with_format(format));
        }
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The data directory where database contents reside.
    #[serde(default = "default_datadir")]
    pub datadir: PathBuf,

    pub chain: ChainParams,

    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    #[serde(default)]
    pub db: DbConfig,

    /// Logging configuration (optional section in TOML).
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("parsing config")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&raw)
    }
}
