//! Block, topological index and transaction placement records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{BlockId, TxId};

/// How a block sits relative to the canonical chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Normal,
    /// Included in the DAG but not on the main chain.
    Side,
    /// A sync point: every block below it is final.
    Sync,
}

/// Header view of a stored block as exposed by the chain collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub id: BlockId,
    pub height: i64,
    /// Parent references; the first entry is the designated primary parent.
    pub tips: Vec<BlockId>,
    pub timestamp: DateTime<Utc>,
    pub difficulty: u128,
    pub major_version: u8,
    pub minor_version: u8,
    /// Miner address for each miniblock folded into this block.
    pub miniblock_miners: Vec<String>,
    pub tx_hashes: Vec<TxId>,
    pub miner: String,
    pub kind: BlockKind,
}

impl BlockHeader {
    /// The designated parent used for canonical single-parent walks.
    #[must_use]
    pub fn primary_parent(&self) -> Option<BlockId> {
        self.tips.first().copied()
    }
}

/// Persisted `topo height -> block` mapping owned by the storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopoEntry {
    pub block_id: BlockId,
    pub snapshot_version: u64,
    pub height: i64,
}

/// Cursor used while walking the DAG backwards along primary parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLink {
    pub block_id: BlockId,
    pub height: i64,
}

/// Where a transaction ended up, as reported by the chain collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxLocation {
    /// Valid and included in the given block.
    Valid(BlockId),
    /// Mined only in side blocks.
    SideChain,
    /// Mined in blocks where it was rejected.
    Invalid(Vec<BlockId>),
}

/// Transaction lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRecord {
    pub id: TxId,
    pub location: TxLocation,
    pub registration: bool,
}

/// A pending transaction as held by one of the pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry {
    pub id: TxId,
    pub size: usize,
    pub fee: u64,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_parent_is_first_tip() {
        let a = BlockId::digest(b"a");
        let b = BlockId::digest(b"b");
        let header = BlockHeader {
            id: BlockId::digest(b"child"),
            height: 2,
            tips: vec![a, b],
            timestamp: Utc::now(),
            difficulty: 1,
            major_version: 1,
            minor_version: 0,
            miniblock_miners: Vec::new(),
            tx_hashes: Vec::new(),
            miner: String::new(),
            kind: BlockKind::Normal,
        };
        assert_eq!(header.primary_parent(), Some(a));
    }
}
