use borsh::{BorshDeserialize, BorshSerialize};

use crate::errors::{CheckpointError, CheckpointResult};

/// Serializes a state snapshot into checkpoint contents.
pub fn encode_checkpoint<T: BorshSerialize>(state: &T) -> CheckpointResult<Vec<u8>> {
    borsh::to_vec(state).map_err(|e| CheckpointError::Codec(e.to_string()))
}

pub fn decode_checkpoint<T: BorshDeserialize>(contents: &[u8]) -> CheckpointResult<T> {
    borsh::from_slice(contents).map_err(|e| CheckpointError::Codec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_garbage() {
        let contents = encode_checkpoint(&(7u64, vec![1u8, 2, 3])).unwrap();
        let decoded: (u64, Vec<u8>) = decode_checkpoint(&contents).unwrap();
        assert_eq!(decoded, (7, vec![1, 2, 3]));

        assert!(matches!(
            decode_checkpoint::<(u64, Vec<u8>)>(&contents[..5]),
            Err(CheckpointError::Codec(_))
        ));
    }

    #[test]
    fn test_node_graph_round_trip() {
        use arbor_node_graph::{CallContext, NodeGraph};
        use arbor_primitives::{hash::raw, PathProof};
        use arbor_test_utils::chain::{test_chain_params, test_staker};

        let mut graph = NodeGraph::new(test_chain_params(), raw(b"genesis machine"));
        let req = graph.params().stake_requirement;
        let empty = PathProof::empty();
        graph
            .place_stake(&CallContext::new(test_staker(1), 1), req, &empty, &empty)
            .unwrap();

        let contents = encode_checkpoint(&graph).unwrap();
        let restored: NodeGraph = decode_checkpoint(&contents).unwrap();
        assert_eq!(restored.latest_confirmed(), graph.latest_confirmed());
        assert_eq!(restored.staker_count(), 1);
        assert!(restored.staker(&test_staker(1)).is_some());
    }
}
