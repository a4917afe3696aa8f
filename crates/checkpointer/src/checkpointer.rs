use std::{path::Path, sync::Arc};

use arbor_config::{CheckpointConfig, DbConfig};
use arbor_db_store_sled::{open_sled_database, CheckpointDBSled, SledDbConfig, SLED_NAME};
use arbor_primitives::BlockId;
use arbor_storage::CheckpointDbManager;
use futures::{future::BoxFuture, FutureExt};
use parking_lot::Mutex;
use threadpool::ThreadPool;
use tokio::sync::oneshot;
use tracing::*;

use crate::{
    context::{CheckpointContext, RestoreContext, StoreRestoreContext},
    errors::{CheckpointError, CheckpointResult},
    oracle::ChainTimeOracle,
};

/// A checkpoint waiting for the write daemon.
struct WritableCheckpoint {
    block_id: BlockId,
    contents: Vec<u8>,
    ctx: CheckpointContext,
    resp: oneshot::Sender<CheckpointResult<()>>,
}

/// Persists snapshots of validator state and restores the latest canonical one.
///
/// Constructing a checkpointer does not start its daemons. Call [`crate::spawn_daemons`] once
/// the state has been restored, or drive [`Self::write_pending_checkpoint`] and
/// [`Self::cleanup_checkpoints`] by hand.
#[expect(
    missing_debug_implementations,
    reason = "Inner types don't have Debug implementation"
)]
pub struct Checkpointer {
    storage: Arc<CheckpointDbManager>,
    next_to_write: Mutex<Option<WritableCheckpoint>>,
    max_reorg_height: u64,
}

impl Checkpointer {
    pub fn new(storage: Arc<CheckpointDbManager>, max_reorg_height: u64) -> Self {
        Self {
            storage,
            next_to_write: Mutex::new(None),
            max_reorg_height,
        }
    }

    /// Opens the sled checkpoint database under `datadir`.
    pub fn open(
        datadir: &Path,
        config: &CheckpointConfig,
        db_config: &DbConfig,
        pool: ThreadPool,
    ) -> anyhow::Result<Self> {
        let sled_db = open_sled_database(datadir, SLED_NAME, config.force_fresh_start)?;
        let sled_config =
            SledDbConfig::new_with_constant_backoff(db_config.retry_count, db_config.retry_delay_ms);
        let db = Arc::new(CheckpointDBSled::new(&sled_db, sled_config)?);
        let storage = Arc::new(CheckpointDbManager::new(pool, db));
        Ok(Self::new(storage, config.max_reorg_height))
    }

    pub fn storage(&self) -> &Arc<CheckpointDbManager> {
        &self.storage
    }

    pub fn max_reorg_height(&self) -> u64 {
        self.max_reorg_height
    }

    /// Whether any checkpoint has been written.
    pub async fn has_checkpointed_state(&self) -> CheckpointResult<bool> {
        Ok(!self.storage.is_empty_async().await?)
    }

    /// Queues a checkpoint for the write daemon, replacing any checkpoint still waiting.
    ///
    /// The checkpoint is queued before this returns. The returned future resolves once it has
    /// been written, or with [`CheckpointError::ReplacedByNewer`] if another one took its place
    /// first.
    pub fn async_save_checkpoint(
        &self,
        block_id: BlockId,
        contents: Vec<u8>,
        ctx: CheckpointContext,
    ) -> BoxFuture<'static, CheckpointResult<()>> {
        let (resp, resp_rx) = oneshot::channel();
        let entry = WritableCheckpoint {
            block_id,
            contents,
            ctx,
            resp,
        };

        let replaced = self.next_to_write.lock().replace(entry);
        if let Some(old) = replaced {
            debug!(old = %old.block_id, new = %block_id, "replacing queued checkpoint");
            // The old caller may have stopped waiting.
            let _ = old.resp.send(Err(CheckpointError::ReplacedByNewer));
        }

        async move { resp_rx.await.unwrap_or(Err(CheckpointError::WriterExited)) }.boxed()
    }

    /// Writes the queued checkpoint, if any, and reports the result to its caller.
    ///
    /// Returns the block id of the checkpoint that was taken from the queue.
    #[instrument(skip(self), fields(component = "checkpointer:write"))]
    pub async fn write_pending_checkpoint(&self) -> Option<BlockId> {
        let entry = self.next_to_write.lock().take()?;
        let block_id = entry.block_id;

        let (values, machines) = entry.ctx.into_objects();
        let res = self
            .storage
            .put_checkpoint_async(block_id, entry.contents, values, machines)
            .await
            .map_err(CheckpointError::from);

        match &res {
            Ok(()) => debug!(%block_id, "wrote checkpoint"),
            Err(err) => error!(%block_id, %err, "error writing checkpoint"),
        }
        let _ = entry.resp.send(res);
        Some(block_id)
    }

    /// Deletes checkpoints that are more than `max_reorg_height` below the newest one.
    ///
    /// The newest checkpointed height below the cutoff is kept so that a restore always has a
    /// fallback once the window is exhausted. Failed deletes are logged and skipped. Returns the
    /// number of checkpoints deleted.
    #[instrument(skip(self), fields(component = "checkpointer:cleanup"))]
    pub async fn cleanup_checkpoints(&self) -> CheckpointResult<usize> {
        let (Some(min), Some(max)) = (
            self.storage.min_block_height_async().await?,
            self.storage.max_block_height_async().await?,
        ) else {
            return Ok(0);
        };

        let height_limit = max.saturating_sub(self.max_reorg_height);
        let mut prev_ids = Vec::new();
        let mut deleted = 0;

        for height in min..height_limit {
            let ids = self.storage.block_ids_at_height_async(height).await?;
            if ids.is_empty() {
                continue;
            }

            for id in prev_ids {
                match self.storage.delete_checkpoint_async(id).await {
                    Ok(true) => deleted += 1,
                    Ok(false) => {}
                    Err(err) => warn!(%id, %err, "failed to delete old checkpoint"),
                }
            }
            prev_ids = ids;
        }

        if deleted > 0 {
            info!(%deleted, %height_limit, "cleaned up old checkpoints");
        }
        Ok(deleted)
    }

    /// Finds the newest checkpoint whose block is still canonical and hands it to `unmarshal`.
    ///
    /// Heights are scanned downward from the newest checkpoint. At each height `oracle` names
    /// the canonical block; checkpoints of orphaned blocks are never looked at. Records that
    /// can't be read and checkpoints `unmarshal` rejects are logged and skipped. An oracle
    /// failure aborts the scan.
    ///
    /// Must complete before the daemons are started. `unmarshal` runs on the caller's thread and
    /// its [`RestoreContext`] reads from the store synchronously.
    pub async fn restore_latest_state<O, F>(
        &self,
        oracle: &O,
        mut unmarshal: F,
    ) -> CheckpointResult<BlockId>
    where
        O: ChainTimeOracle + ?Sized,
        F: FnMut(&[u8], &dyn RestoreContext, BlockId) -> anyhow::Result<()>,
    {
        if self.storage.is_empty_async().await? {
            return Err(CheckpointError::NoCheckpoint);
        }
        let (Some(min), Some(max)) = (
            self.storage.min_block_height_async().await?,
            self.storage.max_block_height_async().await?,
        ) else {
            return Err(CheckpointError::NoCheckpoint);
        };

        let restore_ctx = StoreRestoreContext::new(&self.storage);
        for height in (min..=max).rev() {
            let block_id = oracle
                .block_id_for_height(height)
                .await
                .map_err(CheckpointError::Oracle)?;

            let entry = match self.storage.get_checkpoint_async(block_id).await {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(err) => {
                    warn!(%height, %block_id, %err, "unreadable checkpoint record");
                    continue;
                }
            };

            if let Err(err) = unmarshal(&entry.contents, &restore_ctx, block_id) {
                warn!(%height, %block_id, %err, "failed to load checkpoint");
                continue;
            }

            info!(%block_id, "restored checkpoint");
            return Ok(block_id);
        }

        Err(CheckpointError::NoMatchingCheckpoint)
    }
}
