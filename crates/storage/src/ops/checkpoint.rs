//! Checkpoint database operations interface.

use arbor_db_types::{traits::*, types::CheckpointWithManifest, DbError};
use arbor_primitives::{BlockHeight, BlockId, Buf32};
use arbor_storage_common::inst_ops_generic;

inst_ops_generic! {
    (<D: CheckpointDatabase> => CheckpointDbOps, DbError) {
        put_block(id: BlockId, entry: CheckpointWithManifest) => ();
        get_block(id: BlockId) => Option<CheckpointWithManifest>;
        delete_block(id: BlockId) => bool;
        block_ids_at_height(height: BlockHeight) => Vec<BlockId>;
        min_block_height() => Option<BlockHeight>;
        max_block_height() => Option<BlockHeight>;
        is_block_store_empty() => bool;
        put_value(hash: Buf32, data: Vec<u8>) => ();
        get_value(hash: Buf32) => Option<Vec<u8>>;
        delete_value(hash: Buf32) => ();
        put_machine(hash: Buf32, data: Vec<u8>) => ();
        get_machine(hash: Buf32) => Option<Vec<u8>>;
        delete_machine(hash: Buf32) => ();
    }
}
