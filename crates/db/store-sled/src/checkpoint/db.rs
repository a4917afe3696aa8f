use arbor_db_types::{traits::CheckpointDatabase, types::CheckpointWithManifest, DbResult};
use arbor_primitives::{BlockHeight, BlockId, Buf32};

use super::schemas::{
    CheckpointBlockSchema, CheckpointMachineSchema, CheckpointValueSchema, RefCountedEntry,
};
use crate::{
    define_sled_database,
    tree::{Schema, SledTree},
};

define_sled_database!(
    pub struct CheckpointDBSled {
        block_tree: CheckpointBlockSchema,
        value_tree: CheckpointValueSchema,
        machine_tree: CheckpointMachineSchema,
    }
);

impl CheckpointDBSled {
    fn acquire<S>(&self, tree: &SledTree<S>, hash: Buf32, data: Vec<u8>) -> DbResult<()>
    where
        S: Schema<Key = Buf32, Value = RefCountedEntry>,
    {
        self.config.with_retry((tree,), |(t,)| {
            let entry = match t.get(&hash)? {
                Some(mut entry) => {
                    entry.refs += 1;
                    entry
                }
                None => RefCountedEntry {
                    refs: 1,
                    data: data.clone(),
                },
            };
            t.insert(&hash, &entry)?;
            Ok(())
        })?;
        tree.flush()
    }

    fn release<S>(&self, tree: &SledTree<S>, hash: Buf32) -> DbResult<()>
    where
        S: Schema<Key = Buf32, Value = RefCountedEntry>,
    {
        self.config.with_retry((tree,), |(t,)| {
            let Some(mut entry) = t.get(&hash)? else {
                return Ok(());
            };
            entry.refs = entry.refs.saturating_sub(1);
            if entry.refs == 0 {
                t.remove(&hash)?;
            } else {
                t.insert(&hash, &entry)?;
            }
            Ok(())
        })?;
        tree.flush()
    }
}

impl CheckpointDatabase for CheckpointDBSled {
    fn put_block(&self, id: BlockId, entry: CheckpointWithManifest) -> DbResult<()> {
        self.block_tree.insert(&id, &entry)
    }

    fn get_block(&self, id: BlockId) -> DbResult<Option<CheckpointWithManifest>> {
        self.block_tree.get(&id)
    }

    fn delete_block(&self, id: BlockId) -> DbResult<bool> {
        self.block_tree.remove(&id)
    }

    fn block_ids_at_height(&self, height: BlockHeight) -> DbResult<Vec<BlockId>> {
        let first = BlockId::new(height, Buf32::zero());
        let last = BlockId::new(height, Buf32::new([0xff; 32]));
        self.block_tree.keys_in_range(&first, &last)
    }

    fn min_block_height(&self) -> DbResult<Option<BlockHeight>> {
        Ok(self.block_tree.first_key()?.map(|id| id.height()))
    }

    fn max_block_height(&self) -> DbResult<Option<BlockHeight>> {
        Ok(self.block_tree.last_key()?.map(|id| id.height()))
    }

    fn is_block_store_empty(&self) -> DbResult<bool> {
        Ok(self.block_tree.is_empty())
    }

    fn put_value(&self, hash: Buf32, data: Vec<u8>) -> DbResult<()> {
        self.acquire(&self.value_tree, hash, data)
    }

    fn get_value(&self, hash: Buf32) -> DbResult<Option<Vec<u8>>> {
        Ok(self.value_tree.get(&hash)?.map(|e| e.data))
    }

    fn delete_value(&self, hash: Buf32) -> DbResult<()> {
        self.release(&self.value_tree, hash)
    }

    fn put_machine(&self, hash: Buf32, data: Vec<u8>) -> DbResult<()> {
        self.acquire(&self.machine_tree, hash, data)
    }

    fn get_machine(&self, hash: Buf32) -> DbResult<Option<Vec<u8>>> {
        Ok(self.machine_tree.get(&hash)?.map(|e| e.data))
    }

    fn delete_machine(&self, hash: Buf32) -> DbResult<()> {
        self.release(&self.machine_tree, hash)
    }
}

#[cfg(test)]
mod tests {
    use arbor_db_tests::checkpoint_db_tests;

    use super::*;
    use crate::sled_db_test_setup;

    sled_db_test_setup!(CheckpointDBSled, checkpoint_db_tests);
}
