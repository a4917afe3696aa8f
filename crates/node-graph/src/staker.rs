use arbor_primitives::{Address, BlockHeight, NodeHash, PathProof};
use borsh::{BorshDeserialize, BorshSerialize};

/// A party with collateral down on some node of the tree.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct Staker {
    pub address: Address,
    pub location: NodeHash,
    pub creation_height: BlockHeight,
    pub stake_amount: u64,
}

/// A staker together with the proof leading from a confirmation target to its location.
///
/// Supplied in ascending address order when confirming a node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakerProof {
    pub address: Address,
    pub proof: PathProof,
}

impl StakerProof {
    pub fn new(address: Address, proof: PathProof) -> Self {
        Self { address, proof }
    }
}
