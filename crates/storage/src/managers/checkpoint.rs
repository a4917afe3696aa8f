use std::sync::Arc;

use arbor_db_types::{
    traits::CheckpointDatabase,
    types::{CheckpointManifest, CheckpointWithManifest},
    DbResult,
};
use arbor_primitives::{BlockHeight, BlockId, Buf32};
use threadpool::ThreadPool;
use tracing::*;

use crate::ops::checkpoint::{CheckpointDbOps, Context};

/// A content-addressed object saved alongside a checkpoint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredObject {
    pub hash: Buf32,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn new(hash: Buf32, data: Vec<u8>) -> Self {
        Self { hash, data }
    }
}

#[expect(
    missing_debug_implementations,
    reason = "Inner types don't have Debug implementation"
)]
pub struct CheckpointDbManager {
    pool: ThreadPool,
    ops: CheckpointDbOps,
}

impl CheckpointDbManager {
    pub fn new(pool: ThreadPool, db: Arc<impl CheckpointDatabase + 'static>) -> Self {
        let ops = Context::new(db).into_ops(pool.clone());
        Self { pool, ops }
    }

    /// Blocks until every database call queued on the pool has finished.
    pub fn wait_idle(&self) {
        self.pool.join();
    }

    /// Saves the objects a checkpoint references, then the checkpoint record itself.
    ///
    /// The record goes last so that a crash midway never leaves a record pointing at missing
    /// objects. If a step fails, the references taken so far are dropped again. Saving over an
    /// existing checkpoint of the same block releases the objects of the old one.
    pub async fn put_checkpoint_async(
        &self,
        id: BlockId,
        contents: Vec<u8>,
        values: Vec<StoredObject>,
        machines: Vec<StoredObject>,
    ) -> DbResult<()> {
        let previous = self.ops.get_block_async(id).await?;
        let mut acquired = CheckpointManifest::default();

        let res = async {
            self.acquire_objects(values, machines, &mut acquired).await?;
            let entry = CheckpointWithManifest::new(contents, acquired.clone());
            self.ops.put_block_async(id, entry).await
        }
        .await;

        if let Err(err) = res {
            warn!(%id, %err, "failed to save checkpoint, releasing its objects");
            self.release_manifest(id, acquired).await;
            return Err(err);
        }

        if let Some(old) = previous {
            debug!(%id, "replaced existing checkpoint");
            self.release_manifest(id, old.manifest).await;
        }
        Ok(())
    }

    /// Adds a reference to every object, recording each one in `acquired` as it lands.
    async fn acquire_objects(
        &self,
        values: Vec<StoredObject>,
        machines: Vec<StoredObject>,
        acquired: &mut CheckpointManifest,
    ) -> DbResult<()> {
        for obj in values {
            self.ops.put_value_async(obj.hash, obj.data).await?;
            acquired.values.push(obj.hash);
        }
        for obj in machines {
            self.ops.put_machine_async(obj.hash, obj.data).await?;
            acquired.machines.push(obj.hash);
        }
        Ok(())
    }

    /// Drops one reference to every object of a manifest, logging failures.
    async fn release_manifest(&self, id: BlockId, manifest: CheckpointManifest) {
        for hash in manifest.values {
            if let Err(err) = self.ops.delete_value_async(hash).await {
                warn!(%id, %hash, %err, "failed to release checkpoint value");
            }
        }
        for hash in manifest.machines {
            if let Err(err) = self.ops.delete_machine_async(hash).await {
                warn!(%id, %hash, %err, "failed to release checkpoint machine");
            }
        }
    }

    pub async fn get_checkpoint_async(
        &self,
        id: BlockId,
    ) -> DbResult<Option<CheckpointWithManifest>> {
        self.ops.get_block_async(id).await
    }

    /// Deletes a checkpoint record and releases every object in its manifest.
    ///
    /// Failures to release individual objects are logged and skipped. Returns whether a
    /// record existed.
    pub async fn delete_checkpoint_async(&self, id: BlockId) -> DbResult<bool> {
        let Some(entry) = self.ops.get_block_async(id).await? else {
            return Ok(false);
        };

        if let Err(err) = self.ops.delete_block_async(id).await {
            warn!(%id, %err, "failed to delete checkpoint record");
        }
        self.release_manifest(id, entry.manifest).await;

        debug!(%id, "deleted checkpoint");
        Ok(true)
    }

    pub async fn block_ids_at_height_async(&self, height: BlockHeight) -> DbResult<Vec<BlockId>> {
        self.ops.block_ids_at_height_async(height).await
    }

    pub async fn min_block_height_async(&self) -> DbResult<Option<BlockHeight>> {
        self.ops.min_block_height_async().await
    }

    pub async fn max_block_height_async(&self) -> DbResult<Option<BlockHeight>> {
        self.ops.max_block_height_async().await
    }

    pub async fn is_empty_async(&self) -> DbResult<bool> {
        self.ops.is_block_store_empty_async().await
    }

    pub fn is_empty_blocking(&self) -> DbResult<bool> {
        self.ops.is_block_store_empty_blocking()
    }

    pub fn get_value_blocking(&self, hash: Buf32) -> DbResult<Option<Vec<u8>>> {
        self.ops.get_value_blocking(hash)
    }

    pub fn get_machine_blocking(&self, hash: Buf32) -> DbResult<Option<Vec<u8>>> {
        self.ops.get_machine_blocking(hash)
    }
}
