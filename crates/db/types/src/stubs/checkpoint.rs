use std::collections::{BTreeMap, HashMap};

use arbor_primitives::{BlockHeight, BlockId, Buf32};
use parking_lot::Mutex;

use crate::{traits::CheckpointDatabase, types::CheckpointWithManifest, DbResult};

#[derive(Debug)]
struct RefCounted {
    refs: u64,
    data: Vec<u8>,
}

type ObjectTable = Mutex<HashMap<Buf32, RefCounted>>;

/// In-memory checkpoint store for tests.
#[derive(Debug, Default)]
pub struct StubCheckpointDb {
    blocks: Mutex<BTreeMap<BlockId, CheckpointWithManifest>>,
    values: ObjectTable,
    machines: ObjectTable,
}

impl StubCheckpointDb {
    pub fn new() -> Self {
        Self::default()
    }
}

fn put_object(table: &ObjectTable, hash: Buf32, data: Vec<u8>) {
    table
        .lock()
        .entry(hash)
        .and_modify(|e| e.refs += 1)
        .or_insert(RefCounted { refs: 1, data });
}

fn get_object(table: &ObjectTable, hash: &Buf32) -> Option<Vec<u8>> {
    table.lock().get(hash).map(|e| e.data.clone())
}

fn delete_object(table: &ObjectTable, hash: &Buf32) {
    let mut tbl = table.lock();
    if let Some(entry) = tbl.get_mut(hash) {
        entry.refs -= 1;
        if entry.refs == 0 {
            tbl.remove(hash);
        }
    }
}

impl CheckpointDatabase for StubCheckpointDb {
    fn put_block(&self, id: BlockId, entry: CheckpointWithManifest) -> DbResult<()> {
        self.blocks.lock().insert(id, entry);
        Ok(())
    }

    fn get_block(&self, id: BlockId) -> DbResult<Option<CheckpointWithManifest>> {
        Ok(self.blocks.lock().get(&id).cloned())
    }

    fn delete_block(&self, id: BlockId) -> DbResult<bool> {
        Ok(self.blocks.lock().remove(&id).is_some())
    }

    fn block_ids_at_height(&self, height: BlockHeight) -> DbResult<Vec<BlockId>> {
        let lo = BlockId::new(height, Buf32::zero());
        Ok(self
            .blocks
            .lock()
            .range(lo..)
            .map(|(id, _)| *id)
            .take_while(|id| id.height() == height)
            .collect())
    }

    fn min_block_height(&self) -> DbResult<Option<BlockHeight>> {
        Ok(self.blocks.lock().keys().next().map(BlockId::height))
    }

    fn max_block_height(&self) -> DbResult<Option<BlockHeight>> {
        Ok(self.blocks.lock().keys().next_back().map(BlockId::height))
    }

    fn is_block_store_empty(&self) -> DbResult<bool> {
        Ok(self.blocks.lock().is_empty())
    }

    fn put_value(&self, hash: Buf32, data: Vec<u8>) -> DbResult<()> {
        put_object(&self.values, hash, data);
        Ok(())
    }

    fn get_value(&self, hash: Buf32) -> DbResult<Option<Vec<u8>>> {
        Ok(get_object(&self.values, &hash))
    }

    fn delete_value(&self, hash: Buf32) -> DbResult<()> {
        delete_object(&self.values, &hash);
        Ok(())
    }

    fn put_machine(&self, hash: Buf32, data: Vec<u8>) -> DbResult<()> {
        put_object(&self.machines, hash, data);
        Ok(())
    }

    fn get_machine(&self, hash: Buf32) -> DbResult<Option<Vec<u8>>> {
        Ok(get_object(&self.machines, &hash))
    }

    fn delete_machine(&self, hash: Buf32) -> DbResult<()> {
        delete_object(&self.machines, &hash);
        Ok(())
    }
}
