//! Consensus/storage engine port.

use crate::domain::{BlockHeader, BlockId, StateRoot, TopoEntry, TxId, TxRecord};
use crate::error::{Result, StoreError};

/// Result type for storage reads and writes.
///
/// Kept separate from [`crate::error::Result`] so callers such as the repair
/// walker can tell transient failures from corruption.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Port for the block store and its topological index.
///
/// Implementations are internally synchronized; every method may be called
/// from any task.
pub trait ChainStore: Send + Sync {
    /// Current block height.
    fn height(&self) -> i64;

    /// Highest committed topological height.
    fn topo_height(&self) -> i64;

    /// Current DAG tips, highest first.
    fn tips(&self) -> Vec<BlockId>;

    /// Load a stored block header.
    ///
    /// # Errors
    /// `NotFound` when the block is unknown, `Io` on storage failure.
    fn load_block(&self, id: &BlockId) -> StoreResult<BlockHeader>;

    fn block_exists(&self, id: &BlockId) -> bool;

    /// Height recorded for a stored block.
    fn height_of(&self, id: &BlockId) -> StoreResult<i64>;

    /// Topological height a block was committed at.
    fn topo_of(&self, id: &BlockId) -> StoreResult<i64>;

    /// Read the persisted index entry at a topological height.
    fn read_topo_entry(&self, topo: i64) -> StoreResult<TopoEntry>;

    /// Overwrite the persisted index entry at a topological height.
    fn write_topo_entry(&self, topo: i64, entry: TopoEntry) -> StoreResult<()>;

    /// Block id committed at a topological height.
    fn block_at_topo(&self, topo: i64) -> StoreResult<BlockId> {
        self.read_topo_entry(topo).map(|entry| entry.block_id)
    }

    /// Recompute the state-tree version a block committed.
    fn snapshot_version(&self, id: &BlockId) -> StoreResult<u64>;

    /// Balance tree root at a snapshot version.
    fn state_root(&self, version: u64) -> StoreResult<StateRoot>;

    /// Every block (main and side) stored at a height.
    fn blocks_at_height(&self, height: i64) -> Vec<BlockId>;

    /// Remove `count` blocks from the top of the chain.
    ///
    /// # Errors
    /// Fails when the chain is shorter than `count` or storage fails.
    fn rewind(&self, count: u64) -> StoreResult<()>;

    /// Network hashrate in hashes per second, estimated from difficulty.
    fn network_hashrate(&self) -> u64;

    /// Miniblocks waiting to be folded into the next block.
    fn miniblock_count(&self) -> usize;

    /// Encode a complete block (header plus transactions) for export.
    fn export_block(&self, id: &BlockId) -> StoreResult<Vec<u8>>;

    /// Decode and add a block previously produced by [`Self::export_block`].
    fn import_block(&self, bytes: &[u8]) -> StoreResult<BlockId>;

    /// Look up a mined transaction.
    fn transaction(&self, id: &TxId) -> StoreResult<TxRecord>;

    /// Address credited with integrator rewards for blocks built here.
    fn integrator_address(&self) -> String;

    /// # Errors
    /// Returns [`crate::error::Error::InvalidAddress`] for malformed input.
    fn set_integrator_address(&self, address: &str) -> Result<()>;

    /// Topo height history was pruned to, if any.
    fn pruned_topo(&self) -> Option<i64>;

    /// Flush and stop the engine.
    fn shutdown(&self) -> Result<()>;
}
