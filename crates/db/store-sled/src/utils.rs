use arbor_db_types::DbError;
use sled::transaction::{ConflictableTransactionError, TransactionError};

pub(crate) fn to_db_error(err: sled::Error) -> DbError {
    match err {
        sled::Error::Io(e) => DbError::IoError(e.to_string()),
        sled::Error::Corruption { .. } => DbError::Other(format!("corruption: {err}")),
        e => DbError::Other(e.to_string()),
    }
}

pub(crate) fn tx_to_db_error(err: TransactionError<DbError>) -> DbError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => DbError::TransactionError(e.to_string()),
    }
}

/// Aborts the surrounding transaction with a codec failure.
pub(crate) fn abort_codec(err: impl ToString) -> ConflictableTransactionError<DbError> {
    ConflictableTransactionError::Abort(DbError::codec(err))
}
