use arbor_primitives::{
    assertion::{AssertionClaim, AssertionParams},
    challenge::empty_tuple_hash,
    node::{child_node_hash, node_path_step},
    Buf32, ChildType, NodeHash, TimeTicks, VMProtoData,
};
use borsh::{BorshDeserialize, BorshSerialize};

/// The assertion whose outcome a node stands for.
///
/// Shared by the four siblings an assertion creates.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct DisputableNode {
    pub params: AssertionParams,
    pub claim: AssertionClaim,
    pub max_pending_top: Buf32,
    pub max_pending_count: u64,
}

impl DisputableNode {
    /// Accumulator over the logs the assertion claims to have produced.
    pub fn logs_acc(&self) -> Buf32 {
        self.claim.assertion_stub.last_log_hash
    }
}

/// A node of the dispute tree.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct Node {
    hash: NodeHash,
    prev_hash: NodeHash,
    deadline_ticks: TimeTicks,
    node_data_hash: Buf32,
    child_type: ChildType,
    vm_proto_data: VMProtoData,
    disputable: Option<DisputableNode>,

    /// Children in branch-id order, set once an assertion is made on this node.
    successors: Option<[NodeHash; 4]>,

    /// Outgoing messages of a valid node, once the local execution agrees with the claim.
    outgoing_messages: Option<Vec<Vec<u8>>>,
}

impl Node {
    /// The genesis node the graph starts from.
    pub fn root(machine_hash: Buf32) -> Self {
        let vm_proto_data = VMProtoData::new(machine_hash, empty_tuple_hash(), 0);
        let prev_hash = NodeHash::zero();
        let deadline_ticks = TimeTicks::ZERO;
        let node_data_hash = Buf32::zero();
        let child_type = ChildType::Valid;
        let hash = child_node_hash(
            &prev_hash,
            deadline_ticks,
            &node_data_hash,
            child_type,
            &vm_proto_data.hash(),
        );
        Self {
            hash,
            prev_hash,
            deadline_ticks,
            node_data_hash,
            child_type,
            vm_proto_data,
            disputable: None,
            successors: None,
            outgoing_messages: None,
        }
    }

    pub(crate) fn new_child(
        prev_hash: NodeHash,
        deadline_ticks: TimeTicks,
        node_data_hash: Buf32,
        child_type: ChildType,
        vm_proto_data: VMProtoData,
        disputable: DisputableNode,
    ) -> Self {
        let hash = child_node_hash(
            &prev_hash,
            deadline_ticks,
            &node_data_hash,
            child_type,
            &vm_proto_data.hash(),
        );
        Self {
            hash,
            prev_hash,
            deadline_ticks,
            node_data_hash,
            child_type,
            vm_proto_data,
            disputable: Some(disputable),
            successors: None,
            outgoing_messages: None,
        }
    }

    pub fn hash(&self) -> NodeHash {
        self.hash
    }

    pub fn prev_hash(&self) -> NodeHash {
        self.prev_hash
    }

    pub fn deadline_ticks(&self) -> TimeTicks {
        self.deadline_ticks
    }

    pub fn node_data_hash(&self) -> &Buf32 {
        &self.node_data_hash
    }

    pub fn child_type(&self) -> ChildType {
        self.child_type
    }

    pub fn vm_proto_data(&self) -> &VMProtoData {
        &self.vm_proto_data
    }

    pub fn disputable(&self) -> Option<&DisputableNode> {
        self.disputable.as_ref()
    }

    pub fn successors(&self) -> Option<&[NodeHash; 4]> {
        self.successors.as_ref()
    }

    pub fn successor(&self, branch: ChildType) -> Option<NodeHash> {
        self.successors.map(|s| s[branch.index()])
    }

    pub fn outgoing_messages(&self) -> Option<&[Vec<u8>]> {
        self.outgoing_messages.as_deref()
    }

    /// The step a path proof takes to move from this node's parent onto it.
    pub fn path_step(&self) -> Buf32 {
        node_path_step(
            &self.vm_proto_data.hash(),
            self.deadline_ticks,
            &self.node_data_hash,
            self.child_type,
        )
    }

    pub(crate) fn set_successors(&mut self, successors: [NodeHash; 4]) {
        self.successors = Some(successors);
    }

    pub(crate) fn set_outgoing_messages(&mut self, messages: Vec<Vec<u8>>) {
        self.outgoing_messages = Some(messages);
    }
}
