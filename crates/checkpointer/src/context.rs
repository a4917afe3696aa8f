use std::collections::BTreeMap;

use arbor_db_types::types::CheckpointManifest;
use arbor_primitives::{hash::raw, Buf32};
use arbor_storage::{CheckpointDbManager, StoredObject};
use tracing::*;

/// Objects that a checkpoint's contents refer to by hash and that are stored next to it.
///
/// Values are addressed by the hash of their bytes. Machines are addressed by the machine hash
/// the execution engine reports, so the caller supplies it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CheckpointContext {
    values: BTreeMap<Buf32, Vec<u8>>,
    machines: BTreeMap<Buf32, Vec<u8>>,
}

impl CheckpointContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value and returns the hash it is stored under.
    pub fn add_value(&mut self, data: Vec<u8>) -> Buf32 {
        let hash = raw(&data);
        self.values.insert(hash, data);
        hash
    }

    pub fn add_machine(&mut self, machine_hash: Buf32, data: Vec<u8>) {
        self.machines.insert(machine_hash, data);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.machines.is_empty()
    }

    pub fn manifest(&self) -> CheckpointManifest {
        CheckpointManifest::new(
            self.values.keys().copied().collect(),
            self.machines.keys().copied().collect(),
        )
    }

    pub(crate) fn into_objects(self) -> (Vec<StoredObject>, Vec<StoredObject>) {
        let to_objects = |map: BTreeMap<Buf32, Vec<u8>>| {
            map.into_iter()
                .map(|(hash, data)| StoredObject::new(hash, data))
                .collect()
        };
        (to_objects(self.values), to_objects(self.machines))
    }
}

/// Read access to the objects saved with a checkpoint, handed to the state decoder on restore.
pub trait RestoreContext {
    fn get_value(&self, hash: &Buf32) -> Option<Vec<u8>>;

    fn get_machine(&self, hash: &Buf32) -> Option<Vec<u8>>;
}

impl RestoreContext for CheckpointContext {
    fn get_value(&self, hash: &Buf32) -> Option<Vec<u8>> {
        self.values.get(hash).cloned()
    }

    fn get_machine(&self, hash: &Buf32) -> Option<Vec<u8>> {
        self.machines.get(hash).cloned()
    }
}

/// Restore context reading straight from the store, on the caller's thread.
pub(crate) struct StoreRestoreContext<'a> {
    storage: &'a CheckpointDbManager,
}

impl<'a> StoreRestoreContext<'a> {
    pub(crate) fn new(storage: &'a CheckpointDbManager) -> Self {
        Self { storage }
    }
}

impl RestoreContext for StoreRestoreContext<'_> {
    fn get_value(&self, hash: &Buf32) -> Option<Vec<u8>> {
        self.storage
            .get_value_blocking(*hash)
            .inspect_err(|err| warn!(%hash, %err, "failed to read checkpoint value"))
            .ok()
            .flatten()
    }

    fn get_machine(&self, hash: &Buf32) -> Option<Vec<u8>> {
        self.storage
            .get_machine_blocking(*hash)
            .inspect_err(|err| warn!(%hash, %err, "failed to read checkpoint machine"))
            .ok()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_manifest_and_lookup() {
        let mut ctx = CheckpointContext::new();
        assert!(ctx.is_empty());

        let hash = ctx.add_value(b"value".to_vec());
        assert_eq!(hash, raw(b"value"));
        // Adding the same bytes twice stores them once.
        ctx.add_value(b"value".to_vec());
        let machine = Buf32::new([4; 32]);
        ctx.add_machine(machine, b"machine".to_vec());

        let manifest = ctx.manifest();
        assert_eq!(manifest.values, vec![hash]);
        assert_eq!(manifest.machines, vec![machine]);
        assert_eq!(ctx.get_value(&hash), Some(b"value".to_vec()));
        assert_eq!(ctx.get_machine(&machine), Some(b"machine".to_vec()));
        assert_eq!(ctx.get_machine(&hash), None);

        let (values, machines) = ctx.into_objects();
        assert_eq!(values, vec![StoredObject::new(hash, b"value".to_vec())]);
        assert_eq!(machines.len(), 1);
    }
}
