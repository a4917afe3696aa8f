//! Making an assertion: splitting a leaf into its four possible outcomes.

use arbor_primitives::{
    assertion::{AssertionClaim, AssertionParams},
    challenge::{
        challenge_data_hash, empty_tuple_hash, execution_data_hash, execution_precondition_hash,
        message_challenge_data_hash, pending_top_challenge_data_hash, valid_data_hash,
    },
    node::child_node_hash,
    path::calculate_path,
    ChainParams, ChildType, NodeHash, PathProof, PendingInbox, TimeTicks, VMProtoData,
};
use tracing::*;

use crate::{
    context::{CallContext, PrevLeafContext},
    errors::{NodeGraphError, NodeGraphResult},
    events::{AssertedEvent, RollupEvent},
    graph::NodeGraph,
    node::{DisputableNode, Node},
};

/// Deadline shared by the children of an assertion made at `now` on top of a node with
/// deadline `prev_deadline`.
pub fn assertion_deadline(
    params: &ChainParams,
    now: TimeTicks,
    prev_deadline: TimeTicks,
    claim: &AssertionClaim,
) -> TimeTicks {
    let earliest = now + params.grace_period;
    earliest.max(prev_deadline) + params.check_time(claim.assertion_stub.num_gas)
}

/// Builds the four children of `prev_leaf`, indexed by [`ChildType::index`].
pub fn build_children(
    params: &ChainParams,
    prev_leaf: NodeHash,
    deadline_ticks: TimeTicks,
    before_state: &VMProtoData,
    assertion_params: &AssertionParams,
    claim: &AssertionClaim,
    pending_inbox: &PendingInbox,
) -> [Node; 4] {
    let imported = assertion_params.imported_message_count;
    let after_count = before_state.pending_count.saturating_add(imported);
    let stub = &claim.assertion_stub;

    let disputable = DisputableNode {
        params: *assertion_params,
        claim: *claim,
        max_pending_top: pending_inbox.top_hash,
        max_pending_count: pending_inbox.count,
    };

    let one_block = TimeTicks::from_blocks(1);
    let inbox_challenge_period = params.grace_period + one_block;
    let execution_challenge_period = params.grace_period + params.check_time(stub.num_gas);

    let pending_data = challenge_data_hash(
        &pending_top_challenge_data_hash(
            &claim.after_pending_top,
            &pending_inbox.top_hash,
            pending_inbox.count.saturating_sub(after_count),
        ),
        inbox_challenge_period,
    );
    let messages_data = challenge_data_hash(
        &message_challenge_data_hash(
            &before_state.pending_top,
            &claim.after_pending_top,
            &empty_tuple_hash(),
            &claim.imported_messages_slice,
            imported,
        ),
        inbox_challenge_period,
    );
    let execution_data = challenge_data_hash(
        &execution_data_hash(
            assertion_params.num_steps,
            &execution_precondition_hash(
                &before_state.machine_hash,
                &assertion_params.time_bounds,
                &claim.imported_messages_slice,
            ),
            &stub.hash(),
        ),
        execution_challenge_period,
    );
    let valid_data = valid_data_hash(&stub.last_message_hash, &stub.last_log_hash);
    let valid_proto = VMProtoData::new(stub.after_machine_hash, claim.after_pending_top, after_count);

    let child = |data, child_type, proto| {
        Node::new_child(
            prev_leaf,
            deadline_ticks,
            data,
            child_type,
            proto,
            disputable.clone(),
        )
    };

    [
        child(pending_data, ChildType::InvalidPending, *before_state),
        child(messages_data, ChildType::InvalidMessages, *before_state),
        child(execution_data, ChildType::InvalidExecution, *before_state),
        child(valid_data, ChildType::Valid, valid_proto),
    ]
}

impl NodeGraph {
    /// Asserts an execution outcome on top of a leaf, replacing it by its four children and
    /// moving the sender onto the valid one.
    pub fn make_assertion(
        &mut self,
        ctx: &CallContext,
        prev: &PrevLeafContext,
        before_state: &VMProtoData,
        assertion_params: &AssertionParams,
        claim: &AssertionClaim,
        staker_proof: &PathProof,
    ) -> NodeGraphResult<Vec<RollupEvent>> {
        let prev_leaf = child_node_hash(
            &prev.prev_prev_leaf_hash,
            prev.prev_deadline,
            &prev.prev_data_hash,
            prev.prev_child_type,
            &before_state.hash(),
        );
        if !self.leaves.contains(&prev_leaf) {
            return Err(NodeGraphError::UnknownLeaf(prev_leaf));
        }
        // Losing siblings of a confirmed node stay leaves but lose their record.
        if !self.nodes.contains_key(&prev_leaf) {
            return Err(NodeGraphError::UnknownNode(prev_leaf));
        }

        if assertion_params.num_steps > self.params.max_execution_steps {
            return Err(NodeGraphError::TooManySteps {
                steps: assertion_params.num_steps,
                max: self.params.max_execution_steps,
            });
        }

        let bounds = assertion_params.time_bounds;
        if !bounds.contains(ctx.height) {
            return Err(NodeGraphError::OutOfTimeBounds {
                height: ctx.height,
                start: bounds.start,
                end: bounds.end,
            });
        }

        let imported = assertion_params.imported_message_count;
        if imported > 0 && !claim.assertion_stub.did_inbox_insn {
            return Err(NodeGraphError::MessagesWithoutRead);
        }

        let available = self
            .pending_inbox
            .count
            .saturating_sub(before_state.pending_count);
        if imported > available {
            return Err(NodeGraphError::InsufficientPending {
                requested: imported,
                available,
            });
        }

        let staker = self
            .stakers
            .get(&ctx.sender)
            .ok_or(NodeGraphError::UnknownStaker(ctx.sender))?;
        if calculate_path(&staker.location, staker_proof) != prev_leaf {
            return Err(NodeGraphError::StakerNotAtLeaf);
        }

        let deadline_ticks = assertion_deadline(&self.params, ctx.now(), prev.prev_deadline, claim);
        let children = build_children(
            &self.params,
            prev_leaf,
            deadline_ticks,
            before_state,
            assertion_params,
            claim,
            &self.pending_inbox,
        );
        let successors = children.each_ref().map(Node::hash);
        let valid = successors[ChildType::Valid.index()];

        // Checks are done, everything below mutates.
        self.nodes
            .get_mut(&prev_leaf)
            .ok_or(NodeGraphError::UnknownNode(prev_leaf))?
            .set_successors(successors);
        self.leaves.remove(&prev_leaf);
        for node in children {
            self.leaves.insert(node.hash());
            self.nodes.insert(node.hash(), node);
        }
        self.move_staker(ctx.sender, valid);

        info!(%prev_leaf, %valid, %deadline_ticks, staker = %ctx.sender, "new assertion");

        Ok(vec![
            RollupEvent::Asserted(AssertedEvent {
                prev_leaf,
                params: *assertion_params,
                claim: *claim,
                max_pending_top: self.pending_inbox.top_hash,
                max_pending_count: self.pending_inbox.count,
            }),
            RollupEvent::StakeMoved {
                staker: ctx.sender,
                location: valid,
            },
        ])
    }
}
