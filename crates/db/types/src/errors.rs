use arbor_primitives::BlockId;
use arbor_storage_common::exec::OpsError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DbError {
    #[error("missing checkpoint for block {0}")]
    MissingBlock(BlockId),

    #[error("codec error {0}")]
    CodecError(String),

    #[error("transaction error {0}")]
    TransactionError(String),

    #[error("IO Error: {0}")]
    IoError(String),

    /// A database worker task failed in a way that could not be determined.
    #[error("worker task exited strangely")]
    WorkerFailedStrangely,

    #[error("{0}")]
    Other(String),
}

impl DbError {
    pub fn codec(err: impl ToString) -> Self {
        Self::CodecError(err.to_string())
    }
}

impl From<anyhow::Error> for DbError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(value.to_string())
    }
}

impl From<OpsError> for DbError {
    fn from(value: OpsError) -> Self {
        match value {
            OpsError::WorkerFailedStrangely => DbError::WorkerFailedStrangely,
        }
    }
}
