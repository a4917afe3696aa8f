//! Database interfaces of the checkpoint store, independent of the backend.

pub mod errors;
#[cfg(feature = "stubs")]
pub mod stubs;
pub mod traits;
pub mod types;

pub use errors::DbError;

pub type DbResult<T> = Result<T, DbError>;
