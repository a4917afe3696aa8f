use arbor_primitives::{BlockHeight, BlockId};
use async_trait::async_trait;

/// Canonical-chain lookup used to tell live checkpoints from orphaned ones.
#[async_trait]
pub trait ChainTimeOracle: Send + Sync {
    /// Id of the block currently canonical at `height`.
    async fn block_id_for_height(&self, height: BlockHeight) -> anyhow::Result<BlockId>;
}
