//! Trait definitions for the checkpoint store.

use arbor_primitives::{BlockHeight, BlockId, Buf32};

use crate::{types::CheckpointWithManifest, DbResult};

/// Persists checkpoints keyed by the block they were taken at, plus the reference-counted
/// values and machines they point to.
///
/// `put_value` and `put_machine` add a reference, `delete_value` and `delete_machine` drop one
/// and only remove the entry once no reference is left. Checkpoints sharing an object can be
/// deleted in any order.
pub trait CheckpointDatabase: Send + Sync + 'static {
    /// Stores the checkpoint for a block, replacing any previous one.
    fn put_block(&self, id: BlockId, entry: CheckpointWithManifest) -> DbResult<()>;

    fn get_block(&self, id: BlockId) -> DbResult<Option<CheckpointWithManifest>>;

    /// Removes the checkpoint record of a block. Returns whether there was one.
    ///
    /// Does not touch the objects in its manifest.
    fn delete_block(&self, id: BlockId) -> DbResult<bool>;

    /// Ids of every checkpointed block at the height, in hash order.
    fn block_ids_at_height(&self, height: BlockHeight) -> DbResult<Vec<BlockId>>;

    fn min_block_height(&self) -> DbResult<Option<BlockHeight>>;

    fn max_block_height(&self) -> DbResult<Option<BlockHeight>>;

    fn is_block_store_empty(&self) -> DbResult<bool>;

    fn put_value(&self, hash: Buf32, data: Vec<u8>) -> DbResult<()>;

    fn get_value(&self, hash: Buf32) -> DbResult<Option<Vec<u8>>>;

    fn delete_value(&self, hash: Buf32) -> DbResult<()>;

    fn put_machine(&self, hash: Buf32, data: Vec<u8>) -> DbResult<()>;

    fn get_machine(&self, hash: Buf32) -> DbResult<Option<Vec<u8>>>;

    fn delete_machine(&self, hash: Buf32) -> DbResult<()>;
}
