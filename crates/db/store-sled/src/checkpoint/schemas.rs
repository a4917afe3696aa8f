use arbor_db_types::types::CheckpointWithManifest;
use arbor_primitives::{BlockId, Buf32};
use borsh::{BorshDeserialize, BorshSerialize};

use crate::define_table;

/// Stored bytes of a shared object and the number of checkpoints referencing it.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub(crate) struct RefCountedEntry {
    pub(crate) refs: u64,
    pub(crate) data: Vec<u8>,
}

define_table!(
    /// Checkpoint records keyed by the block they were taken at.
    (CheckpointBlockSchema) BlockId => CheckpointWithManifest
);

define_table!(
    /// Content-addressed values referenced by checkpoint manifests.
    (CheckpointValueSchema) Buf32 => RefCountedEntry
);

define_table!(
    /// Content-addressed machines referenced by checkpoint manifests.
    (CheckpointMachineSchema) Buf32 => RefCountedEntry
);
