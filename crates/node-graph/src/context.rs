use arbor_primitives::{Address, BlockHeight, Buf32, ChildType, NodeHash, TimeTicks};

/// Who is calling into the graph, and at which parent-chain height.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CallContext {
    pub sender: Address,
    pub height: BlockHeight,
}

impl CallContext {
    pub fn new(sender: Address, height: BlockHeight) -> Self {
        Self { sender, height }
    }

    pub fn now(&self) -> TimeTicks {
        TimeTicks::from_blocks(self.height)
    }
}

/// What an asserter supplies to identify the leaf it builds on, minus the proto-state which is
/// given separately as the assertion's before-state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PrevLeafContext {
    pub prev_prev_leaf_hash: NodeHash,
    pub prev_deadline: TimeTicks,
    pub prev_data_hash: Buf32,
    pub prev_child_type: ChildType,
}
