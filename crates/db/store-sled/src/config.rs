use std::{fmt, sync::Arc, thread, time::Duration};

use arbor_db_types::{DbError, DbResult};
use sled::transaction::{ConflictableTransactionResult, TransactionError};
use tracing::*;

use crate::{tree::SledTransactional, utils::tx_to_db_error};

pub(crate) const DEFAULT_RETRY_COUNT: u16 = 3;
pub(crate) const DEFAULT_RETRY_DELAY_MS: u64 = 150;
pub(crate) const TEST_RETRY_DELAY_MS: u64 = 50; // Faster for tests

/// How long to wait before retrying a transaction that failed in the storage layer.
pub trait Backoff: fmt::Debug + Send + Sync {
    fn delay(&self, attempt: u16) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantBackoff {
    delay_ms: u64,
}

impl ConstantBackoff {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms }
    }
}

impl Backoff for ConstantBackoff {
    fn delay(&self, _attempt: u16) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// database operations configuration
#[derive(Debug, Clone)]
pub struct SledDbConfig {
    pub retry_count: u16,
    pub backoff: Arc<dyn Backoff>,
}

impl SledDbConfig {
    pub fn new(retry_count: u16, backoff: Arc<dyn Backoff>) -> Self {
        Self {
            retry_count,
            backoff,
        }
    }

    pub fn new_with_constant_backoff(retry_count: u16, delay: u64) -> Self {
        Self::new(retry_count, Arc::new(ConstantBackoff::new(delay)))
    }

    /// Create production configuration with default values
    pub fn production() -> Self {
        Self::new_with_constant_backoff(DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY_MS)
    }

    /// Create test configuration with faster retry delays
    pub fn test() -> Self {
        Self::new_with_constant_backoff(DEFAULT_RETRY_COUNT, TEST_RETRY_DELAY_MS)
    }

    /// Runs `f` in a transaction over `trees`.
    ///
    /// Conflicts are retried by sled itself. Storage failures are retried up to `retry_count`
    /// times with the configured backoff, aborts are returned as is.
    pub(crate) fn with_retry<Trees, F, R>(&self, trees: Trees, f: F) -> DbResult<R>
    where
        Trees: SledTransactional,
        F: Fn(Trees::View) -> ConflictableTransactionResult<R, DbError>,
    {
        let mut attempt = 0;
        loop {
            match trees.transaction(&f) {
                Ok(res) => return Ok(res),
                Err(TransactionError::Storage(err)) if attempt < self.retry_count => {
                    let delay = self.backoff.delay(attempt);
                    warn!(%err, %attempt, ?delay, "sled transaction failed, retrying");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(tx_to_db_error(err)),
            }
        }
    }
}

impl Default for SledDbConfig {
    fn default() -> Self {
        Self::production()
    }
}
