//! Confirming the successor of the latest confirmed node.

use std::collections::BTreeSet;

use arbor_primitives::{
    challenge::{bytes_array_accum_hash, valid_data_hash},
    node::child_node_hash,
    path::calculate_path,
    Address, Buf32, ChildType, NodeHash, PathProof, TimeTicks,
};
use tracing::*;

use crate::{
    context::CallContext,
    errors::{NodeGraphError, NodeGraphResult},
    events::RollupEvent,
    graph::NodeGraph,
    staker::StakerProof,
};

impl NodeGraph {
    /// Confirms the valid successor of the latest confirmed node, releasing its outgoing
    /// messages.
    pub fn confirm_valid(
        &mut self,
        ctx: &CallContext,
        deadline_ticks: TimeTicks,
        messages: &[Vec<u8>],
        logs_acc: &Buf32,
        vm_proto_state_hash: &Buf32,
        stakers: &[StakerProof],
    ) -> NodeGraphResult<Vec<RollupEvent>> {
        let last_message_hash = bytes_array_accum_hash(Buf32::zero(), messages);
        let node_data = valid_data_hash(&last_message_hash, logs_acc);
        let to = self.check_confirmation(
            ctx,
            deadline_ticks,
            &node_data,
            ChildType::Valid,
            vm_proto_state_hash,
            stakers,
        )?;

        self.confirm_node(to);
        self.sent_message_count = self
            .sent_message_count
            .saturating_add(messages.len() as u64);

        Ok(vec![
            RollupEvent::Confirmed { node: to },
            RollupEvent::ConfirmedAssertion {
                logs_acc_hash: *logs_acc,
                messages: messages.to_vec(),
            },
        ])
    }

    /// Confirms one of the invalid successors of the latest confirmed node.
    pub fn confirm_invalid(
        &mut self,
        ctx: &CallContext,
        deadline_ticks: TimeTicks,
        challenge_node_data: &Buf32,
        branch: ChildType,
        vm_proto_state_hash: &Buf32,
        stakers: &[StakerProof],
    ) -> NodeGraphResult<Vec<RollupEvent>> {
        if branch.is_valid() {
            return Err(NodeGraphError::WrongBranch(branch));
        }
        let to = self.check_confirmation(
            ctx,
            deadline_ticks,
            challenge_node_data,
            branch,
            vm_proto_state_hash,
            stakers,
        )?;

        self.confirm_node(to);
        Ok(vec![RollupEvent::Confirmed { node: to }])
    }

    fn check_confirmation(
        &self,
        ctx: &CallContext,
        deadline_ticks: TimeTicks,
        node_data: &Buf32,
        branch: ChildType,
        vm_proto_state_hash: &Buf32,
        stakers: &[StakerProof],
    ) -> NodeGraphResult<NodeHash> {
        let to = child_node_hash(
            &self.latest_confirmed,
            deadline_ticks,
            node_data,
            branch,
            vm_proto_state_hash,
        );

        let tracked = self
            .nodes
            .get(&self.latest_confirmed)
            .and_then(|n| n.successor(branch));
        if tracked != Some(to) {
            return Err(NodeGraphError::ConfirmTargetMismatch {
                computed: to,
                tracked,
            });
        }

        let now = ctx.now();
        if now < deadline_ticks {
            return Err(NodeGraphError::DeadlineNotReached {
                now,
                deadline: deadline_ticks,
            });
        }

        let active = self.check_aligned_stakers(&to, deadline_ticks, stakers)?;
        if active == 0 {
            return Err(NodeGraphError::NoActiveStaker);
        }
        Ok(to)
    }

    /// Checks that `stakers` lists every staker in ascending address order, and that every
    /// staker placed before `deadline_ticks` sits on `to` or below it. Returns how many did.
    pub fn check_aligned_stakers(
        &self,
        to: &NodeHash,
        deadline_ticks: TimeTicks,
        stakers: &[StakerProof],
    ) -> NodeGraphResult<usize> {
        if stakers.len() != self.stakers.len() {
            return Err(NodeGraphError::alignment(format!(
                "expected {} stakers, got {}",
                self.stakers.len(),
                stakers.len()
            )));
        }

        let mut prev: Option<Address> = None;
        let mut active = 0;
        for entry in stakers {
            if prev.is_some_and(|p| entry.address <= p) {
                return Err(NodeGraphError::alignment("stakers not in ascending order"));
            }
            prev = Some(entry.address);

            let staker = self.stakers.get(&entry.address).ok_or_else(|| {
                NodeGraphError::alignment(format!("{} is not a staker", entry.address))
            })?;

            if TimeTicks::from_blocks(staker.creation_height) < deadline_ticks {
                if calculate_path(to, &entry.proof) != staker.location {
                    return Err(NodeGraphError::alignment(format!(
                        "proof for {} does not reach its stake",
                        entry.address
                    )));
                }
                active += 1;
            }
        }
        Ok(active)
    }

    /// Builds the staker set [`Self::check_aligned_stakers`] expects for confirming `to`.
    ///
    /// Stakers placed at or after the deadline get an empty proof since they are not checked.
    pub fn aligned_stakers(
        &self,
        to: &NodeHash,
        deadline_ticks: TimeTicks,
    ) -> NodeGraphResult<Vec<StakerProof>> {
        self.stakers
            .values()
            .map(|staker| {
                let proof = if TimeTicks::from_blocks(staker.creation_height) < deadline_ticks {
                    self.path_proof(to, &staker.location).map_err(|_| {
                        NodeGraphError::alignment(format!(
                            "stake of {} is not on the confirmed branch",
                            staker.address
                        ))
                    })?
                } else {
                    PathProof::empty()
                };
                Ok(StakerProof::new(staker.address, proof))
            })
            .collect()
    }

    /// Records the outgoing messages of a valid node, once they check out against its claim.
    pub fn update_valid_opinion(
        &mut self,
        hash: &NodeHash,
        messages: Vec<Vec<u8>>,
    ) -> NodeGraphResult<()> {
        let node = self
            .nodes
            .get_mut(hash)
            .ok_or(NodeGraphError::UnknownNode(*hash))?;
        if !node.child_type().is_valid() {
            return Err(NodeGraphError::WrongBranch(node.child_type()));
        }
        let stub = node
            .disputable()
            .map(|d| d.claim.assertion_stub)
            .ok_or(NodeGraphError::MessagesMismatch(*hash))?;

        let acc = bytes_array_accum_hash(Buf32::zero(), &messages);
        if acc != stub.last_message_hash || messages.len() as u64 != stub.message_count {
            return Err(NodeGraphError::MessagesMismatch(*hash));
        }

        node.set_outgoing_messages(messages);
        Ok(())
    }

    /// Moves the latest confirmed node to `to` and forgets every node outside its subtree.
    ///
    /// Forgotten leaves stay in the leaf set until they are pruned.
    fn confirm_node(&mut self, to: NodeHash) {
        let mut keep = BTreeSet::new();
        let mut stack = vec![to];
        while let Some(hash) = stack.pop() {
            if !keep.insert(hash) {
                continue;
            }
            if let Some(succ) = self.nodes.get(&hash).and_then(|n| n.successors()) {
                stack.extend(succ.iter().copied());
            }
        }

        let before = self.nodes.len();
        self.nodes.retain(|hash, _| keep.contains(hash));
        self.latest_confirmed = to;

        info!(node = %to, dropped = before - self.nodes.len(), "confirmed node");
    }
}

#[cfg(test)]
mod tests {
    use arbor_primitives::{
        assertion::{AssertionClaim, AssertionParams, ExecutionAssertionStub, TimeBounds},
        hash::raw,
    };
    use arbor_test_utils::chain::{test_chain_params, test_staker};

    use super::*;
    use crate::{context::PrevLeafContext, node::Node};

    const MESSAGES: [&[u8]; 2] = [b"first", b"second"];

    fn messages() -> Vec<Vec<u8>> {
        MESSAGES.iter().map(|m| m.to_vec()).collect()
    }

    /// Graph with one staker who asserted on the root at height 10, claiming [`MESSAGES`].
    fn asserted_graph() -> (NodeGraph, NodeHash) {
        let mut graph = NodeGraph::new(test_chain_params(), raw(b"machine"));
        let ctx = CallContext::new(test_staker(1), 10);
        let req = graph.params().stake_requirement;
        graph
            .place_stake(&ctx, req, &PathProof::empty(), &PathProof::empty())
            .expect("test: stake");

        let root = graph.latest_confirmed_node().expect("test: root").clone();
        let prev = PrevLeafContext {
            prev_prev_leaf_hash: root.prev_hash(),
            prev_deadline: root.deadline_ticks(),
            prev_data_hash: *root.node_data_hash(),
            prev_child_type: root.child_type(),
        };
        let stub = ExecutionAssertionStub {
            after_machine_hash: raw(b"after"),
            last_message_hash: bytes_array_accum_hash(Buf32::zero(), messages()),
            message_count: 2,
            last_log_hash: raw(b"logs"),
            ..Default::default()
        };
        let claim = AssertionClaim {
            after_pending_top: root.vm_proto_data().pending_top,
            imported_messages_slice: Buf32::zero(),
            assertion_stub: stub,
        };
        let params = AssertionParams {
            num_steps: 10,
            time_bounds: TimeBounds::new(0, 100),
            imported_message_count: 0,
        };
        graph
            .make_assertion(
                &ctx,
                &prev,
                root.vm_proto_data(),
                &params,
                &claim,
                &PathProof::empty(),
            )
            .expect("test: assert");
        let valid = root_successor(&graph, ChildType::Valid);
        (graph, valid)
    }

    fn root_successor(graph: &NodeGraph, branch: ChildType) -> NodeHash {
        graph
            .latest_confirmed_node()
            .and_then(|n| n.successor(branch))
            .expect("test: successor")
    }

    /// Asserts an empty execution on top of `leaf`.
    fn assert_on(
        graph: &mut NodeGraph,
        ctx: &CallContext,
        leaf: &Node,
        staker_proof: &PathProof,
    ) -> NodeGraphResult<Vec<RollupEvent>> {
        let prev = PrevLeafContext {
            prev_prev_leaf_hash: leaf.prev_hash(),
            prev_deadline: leaf.deadline_ticks(),
            prev_data_hash: *leaf.node_data_hash(),
            prev_child_type: leaf.child_type(),
        };
        let claim = AssertionClaim {
            after_pending_top: leaf.vm_proto_data().pending_top,
            imported_messages_slice: Buf32::zero(),
            assertion_stub: ExecutionAssertionStub {
                after_machine_hash: raw(b"next"),
                ..Default::default()
            },
        };
        let params = AssertionParams {
            num_steps: 10,
            time_bounds: TimeBounds::new(0, u64::MAX),
            imported_message_count: 0,
        };
        graph.make_assertion(
            ctx,
            &prev,
            leaf.vm_proto_data(),
            &params,
            &claim,
            staker_proof,
        )
    }

    fn deadline_height(graph: &NodeGraph, node: &NodeHash) -> u64 {
        let deadline = graph.node(node).expect("test: node").deadline_ticks();
        deadline.get().div_ceil(arbor_primitives::time::TICKS_PER_BLOCK)
    }

    #[test]
    fn test_confirm_valid() {
        let (mut graph, valid) = asserted_graph();
        let node = graph.node(&valid).expect("test: valid").clone();
        let proto = node.vm_proto_data().hash();
        let deadline = node.deadline_ticks();
        let stakers = graph
            .aligned_stakers(&valid, deadline)
            .expect("test: aligned");
        let ctx = CallContext::new(test_staker(2), deadline_height(&graph, &valid));

        let events = graph
            .confirm_valid(&ctx, deadline, &messages(), &raw(b"logs"), &proto, &stakers)
            .expect("test: confirm");
        assert_eq!(events[0], RollupEvent::Confirmed { node: valid });
        assert!(matches!(
            events[1],
            RollupEvent::ConfirmedAssertion { ref messages, .. } if messages.len() == 2
        ));
        assert_eq!(graph.latest_confirmed(), valid);
        assert_eq!(graph.sent_message_count(), 2);

        // Invalid siblings are forgotten but stay leaves until pruned.
        let sibling_count = graph.leaves().filter(|l| graph.node(l).is_none()).count();
        assert_eq!(sibling_count, 3);
    }

    #[test]
    fn test_confirm_valid_before_deadline() {
        let (mut graph, valid) = asserted_graph();
        let node = graph.node(&valid).expect("test: valid").clone();
        let deadline = node.deadline_ticks();
        let stakers = graph
            .aligned_stakers(&valid, deadline)
            .expect("test: aligned");
        let ctx = CallContext::new(test_staker(2), 10);
        assert!(matches!(
            graph.confirm_valid(
                &ctx,
                deadline,
                &messages(),
                &raw(b"logs"),
                &node.vm_proto_data().hash(),
                &stakers
            ),
            Err(NodeGraphError::DeadlineNotReached { .. })
        ));
    }

    #[test]
    fn test_confirm_valid_wrong_messages() {
        let (mut graph, valid) = asserted_graph();
        let node = graph.node(&valid).expect("test: valid").clone();
        let deadline = node.deadline_ticks();
        let ctx = CallContext::new(test_staker(2), deadline_height(&graph, &valid));
        let stakers = graph
            .aligned_stakers(&valid, deadline)
            .expect("test: aligned");
        assert!(matches!(
            graph.confirm_valid(
                &ctx,
                deadline,
                &[b"other".to_vec()],
                &raw(b"logs"),
                &node.vm_proto_data().hash(),
                &stakers
            ),
            Err(NodeGraphError::ConfirmTargetMismatch { .. })
        ));
    }

    #[test]
    fn test_confirm_invalid_rejects_valid_branch() {
        let (mut graph, valid) = asserted_graph();
        let node = graph.node(&valid).expect("test: valid").clone();
        let ctx = CallContext::new(test_staker(2), 1_000);
        assert_eq!(
            graph.confirm_invalid(
                &ctx,
                node.deadline_ticks(),
                node.node_data_hash(),
                ChildType::Valid,
                &node.vm_proto_data().hash(),
                &[]
            ),
            Err(NodeGraphError::WrongBranch(ChildType::Valid))
        );
    }

    #[test]
    fn test_confirm_invalid_misaligned_staker() {
        let (mut graph, _) = asserted_graph();
        let target = root_successor(&graph, ChildType::InvalidExecution);
        let node: Node = graph.node(&target).expect("test: node").clone();
        let ctx = CallContext::new(test_staker(2), deadline_height(&graph, &target));

        // The only staker sits on the valid branch and cannot be aligned with this one.
        assert!(graph.aligned_stakers(&target, node.deadline_ticks()).is_err());
        let stakers = vec![StakerProof::new(test_staker(1), PathProof::empty())];
        assert!(matches!(
            graph.confirm_invalid(
                &ctx,
                node.deadline_ticks(),
                node.node_data_hash(),
                ChildType::InvalidExecution,
                &node.vm_proto_data().hash(),
                &stakers
            ),
            Err(NodeGraphError::StakerAlignmentFailed(_))
        ));
    }

    #[test]
    fn test_aligned_stakers_checks() {
        let (mut graph, valid) = asserted_graph();
        let req = graph.params().stake_requirement;
        let late = CallContext::new(test_staker(0), 1_000_000);
        let to_leaf = PathProof::new(vec![graph.node(&valid).expect("test: valid").path_step()]);
        graph
            .place_stake(&late, req, &PathProof::empty(), &to_leaf)
            .expect("test: late stake");
        let deadline = graph.node(&valid).expect("test: valid").deadline_ticks();

        let aligned = graph
            .aligned_stakers(&valid, deadline)
            .expect("test: aligned");
        assert_eq!(aligned.len(), 2);
        assert_eq!(graph.check_aligned_stakers(&valid, deadline, &aligned), Ok(1));

        let mut reversed = aligned.clone();
        reversed.reverse();
        assert!(graph
            .check_aligned_stakers(&valid, deadline, &reversed)
            .is_err());
        assert!(graph
            .check_aligned_stakers(&valid, deadline, &aligned[..1])
            .is_err());
    }

    #[test]
    fn test_update_valid_opinion() {
        let (mut graph, valid) = asserted_graph();
        assert_eq!(
            graph.update_valid_opinion(&valid, vec![b"nope".to_vec()]),
            Err(NodeGraphError::MessagesMismatch(valid))
        );
        graph
            .update_valid_opinion(&valid, messages())
            .expect("test: opinion");
        assert_eq!(
            graph.node(&valid).and_then(Node::outgoing_messages),
            Some(messages().as_slice())
        );

        let invalid = root_successor(&graph, ChildType::InvalidPending);
        assert_eq!(
            graph.update_valid_opinion(&invalid, messages()),
            Err(NodeGraphError::WrongBranch(ChildType::InvalidPending))
        );
    }

    #[test]
    fn test_confirm_without_active_staker() {
        let (mut graph, a_valid) = asserted_graph();
        let a_node = graph.node(&a_valid).expect("test: valid").clone();
        let a_deadline = a_node.deadline_ticks();
        let req = graph.params().stake_requirement;
        let empty = PathProof::empty();

        // Staker 2 joins after the deadline of A and asserts on top of it.
        let late = CallContext::new(test_staker(2), deadline_height(&graph, &a_valid));
        graph
            .place_stake(&late, req, &PathProof::new(vec![a_node.path_step()]), &empty)
            .expect("test: late stake");
        assert_on(&mut graph, &late, &a_node, &empty).expect("test: assert on A");
        let b_valid = graph
            .node(&a_valid)
            .and_then(|n| n.successor(ChildType::Valid))
            .expect("test: B");
        let b_node = graph.node(&b_valid).expect("test: B node").clone();

        // Staker 1 never moved on to B and is refunded once its deadline passes.
        let after_b = CallContext::new(test_staker(3), deadline_height(&graph, &b_valid));
        graph
            .recover_stake_passed_deadline(
                &after_b,
                &test_staker(1),
                b_node.deadline_ticks(),
                b_node.node_data_hash(),
                ChildType::Valid,
                &b_node.vm_proto_data().hash(),
                &empty,
            )
            .expect("test: passed deadline");

        let stakers = graph
            .aligned_stakers(&a_valid, a_deadline)
            .expect("test: aligned");
        assert_eq!(stakers, vec![StakerProof::new(test_staker(2), empty)]);
        assert_eq!(
            graph.confirm_valid(
                &after_b,
                a_deadline,
                &messages(),
                &raw(b"logs"),
                &a_node.vm_proto_data().hash(),
                &stakers
            ),
            Err(NodeGraphError::NoActiveStaker)
        );
        assert_eq!(graph.latest_confirmed(), a_node.prev_hash());
    }

    /// Confirms `valid`, a child of the root, after staker 9 joined late on the root itself.
    fn confirm_with_stale_staker(graph: &mut NodeGraph, valid: &NodeHash) -> Node {
        let node = graph.node(valid).expect("test: valid").clone();
        let req = graph.params().stake_requirement;
        let late = CallContext::new(test_staker(9), deadline_height(graph, valid));
        graph
            .place_stake(
                &late,
                req,
                &PathProof::empty(),
                &PathProof::new(vec![node.path_step()]),
            )
            .expect("test: late stake");

        let stakers = graph
            .aligned_stakers(valid, node.deadline_ticks())
            .expect("test: aligned");
        graph
            .confirm_valid(
                &late,
                node.deadline_ticks(),
                &messages(),
                &raw(b"logs"),
                &node.vm_proto_data().hash(),
                &stakers,
            )
            .expect("test: confirm");
        node
    }

    #[test]
    fn test_recover_stake_old() {
        let (mut graph, valid) = asserted_graph();
        let node = confirm_with_stale_staker(&mut graph, &valid);
        let req = graph.params().stake_requirement;

        let wrong = PathProof::new(vec![raw(b"elsewhere")]);
        assert!(matches!(
            graph.recover_stake_old(&test_staker(9), &wrong),
            Err(NodeGraphError::InvalidProof(_))
        ));
        assert_eq!(
            graph.recover_stake_old(&test_staker(9), &PathProof::empty()),
            Err(NodeGraphError::EmptyProof)
        );

        let events = graph
            .recover_stake_old(&test_staker(9), &PathProof::new(vec![node.path_step()]))
            .expect("test: recover old");
        assert_eq!(
            events,
            vec![RollupEvent::StakeRefunded {
                staker: test_staker(9),
                amount: req
            }]
        );
        assert!(graph.staker(&test_staker(9)).is_none());
        assert!(graph.staker(&test_staker(1)).is_some());
    }

    #[test]
    fn test_prune_leaf_needs_path_to_latest_confirmed() {
        let (mut graph, valid) = asserted_graph();
        let root = graph.latest_confirmed();
        let sibling = root_successor(&graph, ChildType::InvalidPending);
        let sibling_step = graph.node(&sibling).expect("test: sibling").path_step();
        let leaf_proof = PathProof::new(vec![sibling_step]);
        let node = confirm_with_stale_staker(&mut graph, &valid);

        assert_eq!(
            graph.prune_leaf(&root, &leaf_proof, &PathProof::new(vec![raw(b"other")])),
            Err(NodeGraphError::InvalidProof(
                "ancestor proof does not reach the latest confirmed node"
            ))
        );
        assert!(graph.is_leaf(&sibling));

        let events = graph
            .prune_leaf(&root, &leaf_proof, &PathProof::new(vec![node.path_step()]))
            .expect("test: prune");
        assert_eq!(events, vec![RollupEvent::Pruned { leaf: sibling }]);
        assert!(!graph.is_leaf(&sibling));
    }

    #[test]
    fn test_assert_on_forgotten_leaf() {
        let (mut graph, valid) = asserted_graph();
        let sibling = root_successor(&graph, ChildType::InvalidExecution);
        let sibling_node = graph.node(&sibling).expect("test: sibling").clone();
        confirm_with_stale_staker(&mut graph, &valid);
        assert!(graph.is_leaf(&sibling));
        assert!(graph.node(&sibling).is_none());

        let nodes_before = graph.node_count();
        assert_eq!(
            assert_on(
                &mut graph,
                &CallContext::new(test_staker(1), 1_000),
                &sibling_node,
                &PathProof::empty()
            ),
            Err(NodeGraphError::UnknownNode(sibling))
        );
        assert_eq!(graph.node_count(), nodes_before);
        assert!(graph.is_leaf(&sibling));
    }
}
