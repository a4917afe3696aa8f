use std::collections::{BTreeMap, BTreeSet};

use arbor_primitives::{
    node::child_node_hash, path::calculate_path, Address, Buf32, ChainParams, ChildType,
    NodeHash, PathProof, PendingInbox, TimeTicks,
};
use borsh::{BorshDeserialize, BorshSerialize};
use tracing::*;

use crate::{
    context::CallContext,
    errors::{NodeGraphError, NodeGraphResult},
    events::RollupEvent,
    node::Node,
    staker::Staker,
};

/// The dispute tree together with the stakers positioned on it.
///
/// Single-owner and not internally synchronized. Each operation takes the caller and height
/// through a [`CallContext`], checks every precondition first and only then mutates, returning
/// the events it emitted.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct NodeGraph {
    pub(crate) params: ChainParams,
    pub(crate) nodes: BTreeMap<NodeHash, Node>,
    pub(crate) leaves: BTreeSet<NodeHash>,
    pub(crate) stakers: BTreeMap<Address, Staker>,
    pub(crate) latest_confirmed: NodeHash,
    pub(crate) pending_inbox: PendingInbox,

    /// Messages released to the parent chain by confirmed valid nodes so far.
    pub(crate) sent_message_count: u64,
}

impl NodeGraph {
    /// Creates a graph whose only node is the root built from `initial_machine_hash`.
    pub fn new(params: ChainParams, initial_machine_hash: Buf32) -> Self {
        let root = Node::root(initial_machine_hash);
        let root_hash = root.hash();
        let pending_inbox = PendingInbox::new(root.vm_proto_data().pending_top, 0);

        let mut nodes = BTreeMap::new();
        nodes.insert(root_hash, root);

        Self {
            params,
            nodes,
            leaves: BTreeSet::from([root_hash]),
            stakers: BTreeMap::new(),
            latest_confirmed: root_hash,
            pending_inbox,
            sent_message_count: 0,
        }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn latest_confirmed(&self) -> NodeHash {
        self.latest_confirmed
    }

    pub fn latest_confirmed_node(&self) -> Option<&Node> {
        self.nodes.get(&self.latest_confirmed)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &NodeHash> + '_ {
        self.leaves.iter()
    }

    pub fn is_leaf(&self, hash: &NodeHash) -> bool {
        self.leaves.contains(hash)
    }

    pub fn node(&self, hash: &NodeHash) -> Option<&Node> {
        self.nodes.get(hash)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn staker(&self, address: &Address) -> Option<&Staker> {
        self.stakers.get(address)
    }

    /// Stakers in ascending address order.
    pub fn stakers(&self) -> impl Iterator<Item = &Staker> + '_ {
        self.stakers.values()
    }

    pub fn staker_count(&self) -> usize {
        self.stakers.len()
    }

    pub fn pending_inbox(&self) -> &PendingInbox {
        &self.pending_inbox
    }

    pub fn sent_message_count(&self) -> u64 {
        self.sent_message_count
    }

    /// Records the latest pending-queue summary of the global inbox.
    pub fn update_pending_inbox(&mut self, top_hash: Buf32, count: u64) {
        self.pending_inbox = PendingInbox::new(top_hash, count);
    }

    /// Builds the proof leading from `from` down to its descendant `to`.
    pub fn path_proof(&self, from: &NodeHash, to: &NodeHash) -> NodeGraphResult<PathProof> {
        let mut steps = Vec::new();
        let mut cur = *to;
        while cur != *from {
            let node = self
                .nodes
                .get(&cur)
                .ok_or(NodeGraphError::UnknownNode(cur))?;
            if node.prev_hash().is_zero() {
                return Err(NodeGraphError::InvalidProof("target does not descend from start"));
            }
            steps.push(node.path_step());
            cur = node.prev_hash();
        }
        steps.reverse();
        Ok(PathProof::new(steps))
    }

    fn sender_staker(&self, ctx: &CallContext) -> NodeGraphResult<&Staker> {
        self.stakers
            .get(&ctx.sender)
            .ok_or(NodeGraphError::UnknownStaker(ctx.sender))
    }

    fn require_staker(&self, address: &Address) -> NodeGraphResult<&Staker> {
        self.stakers
            .get(address)
            .ok_or(NodeGraphError::UnknownStaker(*address))
    }

    fn require_leaf(&self, leaf: &NodeHash, what: &'static str) -> NodeGraphResult<()> {
        if self.leaves.contains(leaf) {
            Ok(())
        } else {
            Err(NodeGraphError::InvalidProof(what))
        }
    }

    /// Puts down a stake for the sender on `walk(latestConfirmed, p1)`, which must lead on to
    /// a leaf through `p2`.
    pub fn place_stake(
        &mut self,
        ctx: &CallContext,
        stake_amount: u64,
        proof1: &PathProof,
        proof2: &PathProof,
    ) -> NodeGraphResult<Vec<RollupEvent>> {
        let location = calculate_path(&self.latest_confirmed, proof1);
        let leaf = calculate_path(&location, proof2);
        self.require_leaf(&leaf, "stake location does not lead to a leaf")?;

        if stake_amount != self.params.stake_requirement {
            return Err(NodeGraphError::WrongStakeAmount {
                expected: self.params.stake_requirement,
                got: stake_amount,
            });
        }
        if self.stakers.contains_key(&ctx.sender) {
            return Err(NodeGraphError::DuplicateStaker(ctx.sender));
        }

        self.stakers.insert(
            ctx.sender,
            Staker {
                address: ctx.sender,
                location,
                creation_height: ctx.height,
                stake_amount,
            },
        );
        debug!(staker = %ctx.sender, %location, "created stake");

        Ok(vec![RollupEvent::StakeCreated {
            staker: ctx.sender,
            location,
        }])
    }

    /// Advances the sender's stake to `walk(location, p1)`.
    pub fn move_stake(
        &mut self,
        ctx: &CallContext,
        proof1: &PathProof,
        proof2: &PathProof,
    ) -> NodeGraphResult<Vec<RollupEvent>> {
        let staker = self.sender_staker(ctx)?;
        let new_location = calculate_path(&staker.location, proof1);
        let leaf = calculate_path(&new_location, proof2);
        self.require_leaf(&leaf, "new location does not lead to a leaf")?;

        self.move_staker(ctx.sender, new_location);
        Ok(vec![RollupEvent::StakeMoved {
            staker: ctx.sender,
            location: new_location,
        }])
    }

    pub(crate) fn move_staker(&mut self, address: Address, location: NodeHash) {
        if let Some(staker) = self.stakers.get_mut(&address) {
            staker.location = location;
            debug!(staker = %address, %location, "moved stake");
        }
    }

    /// Removes a leaf that branches off the path to the latest confirmed node.
    ///
    /// `from` is the last common ancestor; `leaf_proof` leads to the leaf and `anc_proof` to
    /// the latest confirmed node, and they have to leave `from` through different children.
    pub fn prune_leaf(
        &mut self,
        from: &NodeHash,
        leaf_proof: &PathProof,
        anc_proof: &PathProof,
    ) -> NodeGraphResult<Vec<RollupEvent>> {
        let leaf = calculate_path(from, leaf_proof);
        self.require_leaf(&leaf, "pruned node is not a leaf")?;
        if !leaf_proof.diverges_from(anc_proof) {
            return Err(NodeGraphError::PruneConflict);
        }
        if calculate_path(from, anc_proof) != self.latest_confirmed {
            return Err(NodeGraphError::InvalidProof(
                "ancestor proof does not reach the latest confirmed node",
            ));
        }

        self.leaves.remove(&leaf);
        self.nodes.remove(&leaf);
        debug!(%leaf, "pruned leaf");

        Ok(vec![RollupEvent::Pruned { leaf }])
    }

    /// Refunds the sender, whose stake sits on an ancestor of the latest confirmed node.
    pub fn recover_stake_confirmed(
        &mut self,
        ctx: &CallContext,
        proof: &PathProof,
    ) -> NodeGraphResult<Vec<RollupEvent>> {
        let staker = self.sender_staker(ctx)?;
        if calculate_path(&staker.location, proof) != self.latest_confirmed {
            return Err(NodeGraphError::InvalidProof(
                "stake does not lead to the latest confirmed node",
            ));
        }
        Ok(self.refund_staker(ctx.sender))
    }

    /// Refunds any staker left strictly behind the latest confirmed node.
    pub fn recover_stake_old(
        &mut self,
        staker: &Address,
        proof: &PathProof,
    ) -> NodeGraphResult<Vec<RollupEvent>> {
        if proof.is_empty() {
            return Err(NodeGraphError::EmptyProof);
        }
        let st = self.require_staker(staker)?;
        if calculate_path(&st.location, proof) != self.latest_confirmed {
            return Err(NodeGraphError::InvalidProof(
                "stake does not lead to the latest confirmed node",
            ));
        }
        Ok(self.refund_staker(*staker))
    }

    /// Refunds a staker sitting on a branch that conflicts with the latest confirmed node.
    ///
    /// `node` is the branching point: `lc_proof` leads from it to the latest confirmed node
    /// and `staker_proof` to the stake, through different children.
    pub fn recover_stake_mooted(
        &mut self,
        staker: &Address,
        node: &NodeHash,
        lc_proof: &PathProof,
        staker_proof: &PathProof,
    ) -> NodeGraphResult<Vec<RollupEvent>> {
        if !lc_proof.diverges_from(staker_proof) {
            return Err(NodeGraphError::NotMoot);
        }
        let st = self.require_staker(staker)?;
        if calculate_path(node, lc_proof) != self.latest_confirmed {
            return Err(NodeGraphError::InvalidProof(
                "branch point does not lead to the latest confirmed node",
            ));
        }
        if calculate_path(node, staker_proof) != st.location {
            return Err(NodeGraphError::InvalidProof(
                "branch point does not lead to the stake",
            ));
        }
        Ok(self.refund_staker(*staker))
    }

    /// Refunds a staker whose next node's deadline has passed without it moving on.
    #[expect(clippy::too_many_arguments, reason = "mirrors the on-chain call")]
    pub fn recover_stake_passed_deadline(
        &mut self,
        ctx: &CallContext,
        staker: &Address,
        deadline_ticks: TimeTicks,
        node_data_hash: &Buf32,
        child_type: ChildType,
        vm_proto_state_hash: &Buf32,
        proof: &PathProof,
    ) -> NodeGraphResult<Vec<RollupEvent>> {
        let st = self.require_staker(staker)?;
        let next = child_node_hash(
            &st.location,
            deadline_ticks,
            node_data_hash,
            child_type,
            vm_proto_state_hash,
        );
        let leaf = calculate_path(&next, proof);
        self.require_leaf(&leaf, "next node does not lead to a leaf")?;

        let now = ctx.now();
        if now < deadline_ticks {
            return Err(NodeGraphError::NotPastDeadline {
                now,
                deadline: deadline_ticks,
            });
        }
        Ok(self.refund_staker(*staker))
    }

    fn refund_staker(&mut self, address: Address) -> Vec<RollupEvent> {
        let Some(staker) = self.stakers.remove(&address) else {
            return Vec::new();
        };
        info!(staker = %address, amount = staker.stake_amount, "refunded stake");
        vec![RollupEvent::StakeRefunded {
            staker: address,
            amount: staker.stake_amount,
        }]
    }
}

#[cfg(test)]
mod tests {
    use arbor_primitives::hash::raw;
    use arbor_test_utils::chain::{test_chain_params, test_staker};

    use super::*;

    fn ctx(n: u8, height: u64) -> CallContext {
        CallContext::new(test_staker(n), height)
    }

    fn graph() -> NodeGraph {
        NodeGraph::new(test_chain_params(), raw(b"machine"))
    }

    #[test]
    fn test_new_graph_root_is_leaf_and_confirmed() {
        let g = graph();
        let root = g.latest_confirmed();
        assert!(g.is_leaf(&root));
        assert_eq!(g.leaves().count(), 1);
        assert_eq!(g.node(&root).map(|n| n.child_type()), Some(ChildType::Valid));
    }

    #[test]
    fn test_place_stake() {
        let mut g = graph();
        let params = *g.params();
        let events = g
            .place_stake(&ctx(1, 5), params.stake_requirement, &PathProof::empty(), &PathProof::empty())
            .expect("test: place stake");
        let root = g.latest_confirmed();
        assert_eq!(
            events,
            vec![RollupEvent::StakeCreated {
                staker: test_staker(1),
                location: root
            }]
        );
        let st = g.staker(&test_staker(1)).expect("test: staker");
        assert_eq!(st.creation_height, 5);
        assert_eq!(st.location, root);
    }

    #[test]
    fn test_place_stake_rejects() {
        let mut g = graph();
        let req = g.params().stake_requirement;
        let empty = PathProof::empty();

        assert_eq!(
            g.place_stake(&ctx(1, 0), req + 1, &empty, &empty),
            Err(NodeGraphError::WrongStakeAmount {
                expected: req,
                got: req + 1
            })
        );

        let bogus = PathProof::new(vec![raw(b"nowhere")]);
        assert!(matches!(
            g.place_stake(&ctx(1, 0), req, &bogus, &empty),
            Err(NodeGraphError::InvalidProof(_))
        ));

        g.place_stake(&ctx(1, 0), req, &empty, &empty)
            .expect("test: first stake");
        assert_eq!(
            g.place_stake(&ctx(1, 0), req, &empty, &empty),
            Err(NodeGraphError::DuplicateStaker(test_staker(1)))
        );
        assert_eq!(g.staker_count(), 1);
    }

    #[test]
    fn test_recover_stake_confirmed_at_latest() {
        let mut g = graph();
        let req = g.params().stake_requirement;
        let empty = PathProof::empty();
        g.place_stake(&ctx(1, 0), req, &empty, &empty)
            .expect("test: stake");

        assert_eq!(
            g.recover_stake_confirmed(&ctx(2, 0), &empty),
            Err(NodeGraphError::UnknownStaker(test_staker(2)))
        );

        let events = g
            .recover_stake_confirmed(&ctx(1, 0), &empty)
            .expect("test: recover");
        assert_eq!(
            events,
            vec![RollupEvent::StakeRefunded {
                staker: test_staker(1),
                amount: req
            }]
        );
        assert!(g.staker(&test_staker(1)).is_none());
    }

    #[test]
    fn test_recover_stake_old_rejects_empty_proof() {
        let mut g = graph();
        let req = g.params().stake_requirement;
        let empty = PathProof::empty();
        g.place_stake(&ctx(1, 0), req, &empty, &empty)
            .expect("test: stake");
        assert_eq!(
            g.recover_stake_old(&test_staker(1), &empty),
            Err(NodeGraphError::EmptyProof)
        );
    }

    #[test]
    fn test_recover_stake_mooted_requires_divergence() {
        let mut g = graph();
        let req = g.params().stake_requirement;
        let empty = PathProof::empty();
        g.place_stake(&ctx(1, 0), req, &empty, &empty)
            .expect("test: stake");
        let root = g.latest_confirmed();
        let p = PathProof::new(vec![raw(b"x")]);
        assert_eq!(
            g.recover_stake_mooted(&test_staker(1), &root, &p, &p),
            Err(NodeGraphError::NotMoot)
        );
        assert_eq!(
            g.recover_stake_mooted(&test_staker(1), &root, &empty, &p),
            Err(NodeGraphError::NotMoot)
        );
    }

    #[test]
    fn test_path_proof_to_self_is_empty() {
        let g = graph();
        let root = g.latest_confirmed();
        assert_eq!(g.path_proof(&root, &root), Ok(PathProof::empty()));
        assert!(g.path_proof(&root, &NodeHash::new(raw(b"missing"))).is_err());
    }

    #[test]
    fn test_borsh_round_trip() {
        let mut g = graph();
        let req = g.params().stake_requirement;
        let empty = PathProof::empty();
        g.place_stake(&ctx(3, 7), req, &empty, &empty)
            .expect("test: stake");

        let bytes = borsh::to_vec(&g).expect("test: encode");
        let decoded: NodeGraph = borsh::from_slice(&bytes).expect("test: decode");
        assert_eq!(decoded.latest_confirmed(), g.latest_confirmed());
        assert_eq!(decoded.staker(&test_staker(3)), g.staker(&test_staker(3)));
        assert_eq!(decoded.node_count(), g.node_count());
    }
}
