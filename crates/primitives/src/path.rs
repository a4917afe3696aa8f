use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{buf::Buf32, hash::hash_pair, node::NodeHash};

/// Ordered list of path steps leading from some node down to one of its descendants.
///
/// Reduced with [`calculate_path`]: each step is folded in as `cur = H(cur, step)`, an empty
/// proof leaves the start node unchanged.
#[derive(
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct PathProof(Vec<Buf32>);

impl PathProof {
    pub fn new(steps: Vec<Buf32>) -> Self {
        Self(steps)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn steps(&self) -> &[Buf32] {
        &self.0
    }

    pub fn first(&self) -> Option<&Buf32> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, step: Buf32) {
        self.0.push(step);
    }

    /// Proof for walking `self` and then `other`.
    pub fn concat(&self, other: &PathProof) -> PathProof {
        let mut steps = self.0.clone();
        steps.extend_from_slice(&other.0);
        PathProof(steps)
    }

    /// Whether the two proofs leave their common start node through different children.
    ///
    /// An empty proof never diverges, since it does not leave the start node at all.
    pub fn diverges_from(&self, other: &PathProof) -> bool {
        match (self.first(), other.first()) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }

    /// Walks this proof from `start`.
    pub fn walk(&self, start: &NodeHash) -> NodeHash {
        calculate_path(start, self)
    }
}

impl From<Vec<Buf32>> for PathProof {
    fn from(steps: Vec<Buf32>) -> Self {
        Self(steps)
    }
}

/// Folds the proof steps into `start`, returning the node the proof leads to.
pub fn calculate_path(start: &NodeHash, proof: &PathProof) -> NodeHash {
    let end = proof
        .steps()
        .iter()
        .fold(*start.inner(), |cur, step| hash_pair(&cur, step));
    NodeHash::new(end)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::hash::raw;

    fn arb_buf32() -> impl Strategy<Value = Buf32> {
        any::<[u8; 32]>().prop_map(Buf32::new)
    }

    fn arb_proof() -> impl Strategy<Value = PathProof> {
        prop::collection::vec(arb_buf32(), 0..8).prop_map(PathProof::new)
    }

    #[test]
    fn test_empty_proof_is_identity() {
        let start = NodeHash::new(raw(b"start"));
        assert_eq!(calculate_path(&start, &PathProof::empty()), start);
    }

    #[test]
    fn test_diverges_requires_both_nonempty() {
        let a = PathProof::new(vec![raw(b"a")]);
        let b = PathProof::new(vec![raw(b"b")]);
        assert!(a.diverges_from(&b));
        assert!(!a.diverges_from(&a));
        assert!(!a.diverges_from(&PathProof::empty()));
        assert!(!PathProof::empty().diverges_from(&PathProof::empty()));
    }

    proptest! {
        #[test]
        fn proptest_path_composes(start in arb_buf32(), first in arb_proof(), second in arb_proof()) {
            let start = NodeHash::new(start);
            let mid = calculate_path(&start, &first);
            prop_assert_eq!(
                calculate_path(&mid, &second),
                calculate_path(&start, &first.concat(&second))
            );
        }

        #[test]
        fn proptest_divergent_first_steps_reach_different_nodes(
            start in arb_buf32(),
            a in arb_buf32(),
            b in arb_buf32(),
        ) {
            prop_assume!(a != b);
            let start = NodeHash::new(start);
            let pa = PathProof::new(vec![a]);
            let pb = PathProof::new(vec![b]);
            prop_assert!(pa.diverges_from(&pb));
            prop_assert_ne!(pa.walk(&start), pb.walk(&start));
        }
    }
}
