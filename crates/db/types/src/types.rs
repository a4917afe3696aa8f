use arbitrary::Arbitrary;
use arbor_primitives::Buf32;
use borsh::{BorshDeserialize, BorshSerialize};

/// Content-addressed objects a checkpoint holds references to.
///
/// Deleting the checkpoint releases one reference to each of them.
#[derive(Clone, Debug, Default, Eq, PartialEq, Arbitrary, BorshSerialize, BorshDeserialize)]
pub struct CheckpointManifest {
    pub values: Vec<Buf32>,
    pub machines: Vec<Buf32>,
}

impl CheckpointManifest {
    pub fn new(values: Vec<Buf32>, machines: Vec<Buf32>) -> Self {
        Self { values, machines }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.machines.is_empty()
    }
}

/// The record stored per block: opaque state bytes plus the objects they reference.
#[derive(Clone, Debug, Default, Eq, PartialEq, Arbitrary, BorshSerialize, BorshDeserialize)]
pub struct CheckpointWithManifest {
    pub contents: Vec<u8>,
    pub manifest: CheckpointManifest,
}

impl CheckpointWithManifest {
    pub fn new(contents: Vec<u8>, manifest: CheckpointManifest) -> Self {
        Self { contents, manifest }
    }
}
