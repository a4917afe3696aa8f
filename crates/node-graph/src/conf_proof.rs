//! Finding confirmable runs of valid nodes and packaging them as a single proof.

use arbor_primitives::{
    challenge::{bytes_array_accum_hash, valid_data_hash},
    node::child_node_hash,
    Buf32, ChildType, NodeHash, TimeTicks,
};
use thiserror::Error;

use crate::graph::NodeGraph;

/// A valid node that is ready to be confirmed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfirmValidOpportunity {
    pub node_hash: NodeHash,
    pub deadline_ticks: TimeTicks,
    pub messages: Vec<Vec<u8>>,
    pub logs_acc: Buf32,
    pub vm_proto_state_hash: Buf32,
}

/// A run of valid nodes hanging off the latest confirmed node, each past its deadline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfirmOpportunity {
    pub prev_confirmed: NodeHash,
    pub initial_proto_state_hash: Buf32,
    pub before_send_count: u64,
    pub nodes: Vec<ConfirmValidOpportunity>,
}

impl ConfirmOpportunity {
    /// Hash of the last node of the run.
    pub fn final_node(&self) -> NodeHash {
        self.nodes
            .last()
            .map(|n| n.node_hash)
            .unwrap_or(self.prev_confirmed)
    }

    /// Flattens the run into the proof format a verifier replays.
    pub fn prepare_proof(&self) -> ConfirmProof {
        let mut proof = ConfirmProof {
            initial_proto_state_hash: self.initial_proto_state_hash,
            before_send_count: self.before_send_count,
            ..Default::default()
        };

        let mut send_count = self.before_send_count;
        for node in &self.nodes {
            proof.branches.push(ChildType::Valid);
            proof.deadline_ticks.push(node.deadline_ticks);
            proof.logs_acc.push(node.logs_acc);
            proof.vm_proto_state_hashes.push(node.vm_proto_state_hash);
            proof.message_counts.push(node.messages.len() as u64);
            proof.before_send_counts.push(send_count);
            for msg in &node.messages {
                encode_message(&mut proof.messages, msg);
            }
            send_count = send_count.saturating_add(node.messages.len() as u64);
        }
        proof
    }
}

/// Compact proof that a run of nodes extends a confirmed node.
///
/// Per-node fields are parallel vectors. Invalid nodes consume one entry of
/// `challenge_node_data` each, valid nodes one entry of `logs_acc` and a slice of `messages`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfirmProof {
    pub initial_proto_state_hash: Buf32,
    pub before_send_count: u64,
    pub branches: Vec<ChildType>,
    pub deadline_ticks: Vec<TimeTicks>,
    pub challenge_node_data: Vec<Buf32>,
    pub logs_acc: Vec<Buf32>,
    pub vm_proto_state_hashes: Vec<Buf32>,
    pub message_counts: Vec<u64>,
    pub before_send_counts: Vec<u64>,

    /// Outgoing messages of every valid node, each prefixed by its length as a big-endian u32.
    pub messages: Vec<u8>,
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ProofReplayError {
    #[error("proof field {0} is shorter than the branch list")]
    MissingField(&'static str),

    #[error("message buffer ends inside a message")]
    TruncatedMessages,

    #[error("{0} message bytes left over after replay")]
    TrailingMessages(usize),
}

impl ConfirmProof {
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Recomputes the node hashes the proof walks through, starting at `start`.
    pub fn replay(&self, start: &NodeHash) -> Result<Vec<NodeHash>, ProofReplayError> {
        let mut out = Vec::with_capacity(self.branches.len());
        let mut prev = *start;
        let mut valid_idx = 0;
        let mut invalid_idx = 0;
        let mut buf = self.messages.as_slice();

        for (i, branch) in self.branches.iter().enumerate() {
            let deadline = *self
                .deadline_ticks
                .get(i)
                .ok_or(ProofReplayError::MissingField("deadline_ticks"))?;
            let proto = self
                .vm_proto_state_hashes
                .get(i)
                .ok_or(ProofReplayError::MissingField("vm_proto_state_hashes"))?;

            let data = if branch.is_valid() {
                let logs_acc = self
                    .logs_acc
                    .get(valid_idx)
                    .ok_or(ProofReplayError::MissingField("logs_acc"))?;
                let count = *self
                    .message_counts
                    .get(valid_idx)
                    .ok_or(ProofReplayError::MissingField("message_counts"))?;
                valid_idx += 1;

                let mut msgs = Vec::new();
                for _ in 0..count {
                    let (msg, rest) = decode_message(buf)?;
                    msgs.push(msg);
                    buf = rest;
                }
                valid_data_hash(&bytes_array_accum_hash(Buf32::zero(), msgs), logs_acc)
            } else {
                let data = *self
                    .challenge_node_data
                    .get(invalid_idx)
                    .ok_or(ProofReplayError::MissingField("challenge_node_data"))?;
                invalid_idx += 1;
                data
            };

            prev = child_node_hash(&prev, deadline, &data, *branch, proto);
            out.push(prev);
        }

        if !buf.is_empty() {
            return Err(ProofReplayError::TrailingMessages(buf.len()));
        }
        Ok(out)
    }
}

fn encode_message(buf: &mut Vec<u8>, msg: &[u8]) {
    buf.extend_from_slice(&(msg.len() as u32).to_be_bytes());
    buf.extend_from_slice(msg);
}

fn decode_message(buf: &[u8]) -> Result<(&[u8], &[u8]), ProofReplayError> {
    let (len, rest) = buf
        .split_first_chunk::<4>()
        .ok_or(ProofReplayError::TruncatedMessages)?;
    let len = u32::from_be_bytes(*len) as usize;
    if rest.len() < len {
        return Err(ProofReplayError::TruncatedMessages);
    }
    Ok(rest.split_at(len))
}

impl NodeGraph {
    /// Collects the longest run of valid nodes after the latest confirmed node that are past
    /// their deadline at `now` and whose outgoing messages are known.
    pub fn generate_next_conf_proof(&self, now: TimeTicks) -> Option<ConfirmOpportunity> {
        let confirmed = self.latest_confirmed_node()?;
        let mut nodes = Vec::new();
        let mut cur = confirmed;

        while let Some(next) = cur
            .successor(ChildType::Valid)
            .and_then(|h| self.node(&h))
        {
            if next.deadline_ticks() > now {
                break;
            }
            let (Some(messages), Some(disputable)) = (next.outgoing_messages(), next.disputable())
            else {
                break;
            };
            nodes.push(ConfirmValidOpportunity {
                node_hash: next.hash(),
                deadline_ticks: next.deadline_ticks(),
                messages: messages.to_vec(),
                logs_acc: disputable.logs_acc(),
                vm_proto_state_hash: next.vm_proto_data().hash(),
            });
            cur = next;
        }

        if nodes.is_empty() {
            return None;
        }
        Some(ConfirmOpportunity {
            prev_confirmed: confirmed.hash(),
            initial_proto_state_hash: confirmed.vm_proto_data().hash(),
            before_send_count: self.sent_message_count,
            nodes,
        })
    }
}
