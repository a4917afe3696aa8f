use arbor_db_types::DbError;
use thiserror::Error;

pub type CheckpointResult<T> = Result<T, CheckpointError>;

#[derive(Debug, Error)]
pub enum CheckpointError {
    /// A newer checkpoint was queued before this one was written.
    #[error("replaced by newer checkpoint")]
    ReplacedByNewer,

    #[error("cannot restore because no checkpoint exists")]
    NoCheckpoint,

    #[error("cannot restore because no matching checkpoint exists")]
    NoMatchingCheckpoint,

    #[error("db: {0}")]
    Db(#[from] DbError),

    /// The chain oracle failed to resolve a height.
    #[error("chain oracle: {0}")]
    Oracle(anyhow::Error),

    #[error("codec: {0}")]
    Codec(String),

    /// The write daemon went away without answering.
    #[error("checkpoint writer exited")]
    WriterExited,
}
