//! In-memory block store with a topological index.
//!
//! Main-chain blocks are committed at topo height == height. Side blocks are
//! stored but never indexed.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    BlockHeader, BlockId, BlockKind, StateRoot, TopoEntry, TxId, TxLocation, TxRecord,
};
use crate::error::{Error, Result, StoreError};
use crate::port::outbound::{ChainStore, StoreResult};

/// Block time used to space timestamps of generated blocks.
const BLOCK_TIME_SECS: i64 = 18;

/// Serialized form used by block export and import.
#[derive(Debug, Serialize, Deserialize)]
struct ExportedBlock {
    header: BlockHeader,
    txs: Vec<(TxId, bool)>,
}

#[derive(Debug, Default)]
struct ChainState {
    blocks: HashMap<BlockId, BlockHeader>,
    versions: HashMap<BlockId, u64>,
    by_height: BTreeMap<i64, Vec<BlockId>>,
    /// Canonical chain, index == height.
    main: Vec<BlockId>,
    topo: BTreeMap<i64, TopoEntry>,
    txs: HashMap<TxId, TxRecord>,
    failing_reads: HashSet<i64>,
    next_version: u64,
}

impl ChainState {
    fn tip(&self) -> Option<BlockId> {
        self.main.last().copied()
    }

    fn height(&self) -> i64 {
        self.main.len() as i64 - 1
    }

    fn insert(&mut self, header: BlockHeader, indexed: bool) -> BlockId {
        let id = header.id;
        let height = header.height;
        self.next_version += 1;
        let version = self.next_version;

        for (i, tx) in header.tx_hashes.iter().enumerate() {
            self.txs.insert(
                *tx,
                TxRecord {
                    id: *tx,
                    location: if indexed {
                        TxLocation::Valid(id)
                    } else {
                        TxLocation::SideChain
                    },
                    registration: i == 0 && header.miner.is_empty(),
                },
            );
        }

        self.blocks.insert(id, header);
        self.versions.insert(id, version);
        self.by_height.entry(height).or_default().push(id);
        if indexed {
            self.main.push(id);
            self.topo.insert(
                height,
                TopoEntry {
                    block_id: id,
                    snapshot_version: version,
                    height,
                },
            );
        }
        id
    }
}

/// Parameters of a generated block.
#[derive(Debug, Clone, Default)]
pub struct NewBlock {
    pub miner: String,
    pub miniblock_miners: Vec<String>,
    pub tx_hashes: Vec<TxId>,
}

/// In-memory [`ChainStore`].
#[derive(Debug)]
pub struct MemoryChain {
    state: RwLock<ChainState>,
    integrator: RwLock<String>,
    pruned: RwLock<Option<i64>>,
    hashrate: AtomicU64,
    miniblocks: AtomicUsize,
    topo_writes: AtomicU64,
    stopped: AtomicBool,
}

impl MemoryChain {
    /// A chain holding only the genesis block.
    #[must_use]
    pub fn new() -> Self {
        let chain = Self::empty();
        {
            let mut state = chain.state.write();
            let genesis = BlockHeader {
                id: BlockId::digest(b"genesis"),
                height: 0,
                tips: Vec::new(),
                timestamp: Utc::now() - ChronoDuration::days(1),
                difficulty: 1,
                major_version: 1,
                minor_version: 0,
                miniblock_miners: Vec::new(),
                tx_hashes: Vec::new(),
                miner: String::new(),
                kind: BlockKind::Sync,
            };
            state.insert(genesis, true);
        }
        chain
    }

    /// A store with no blocks at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            state: RwLock::new(ChainState::default()),
            integrator: RwLock::new(String::new()),
            pruned: RwLock::new(None),
            hashrate: AtomicU64::new(0),
            miniblocks: AtomicUsize::new(0),
            topo_writes: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    /// Append a block on top of the current tip.
    pub fn append(&self, block: NewBlock) -> BlockId {
        let mut state = self.state.write();
        let parent = state.tip();
        let height = state.height() + 1;
        let parent_time = parent
            .and_then(|p| state.blocks.get(&p))
            .map_or_else(Utc::now, |h| h.timestamp);

        let mut seed = Vec::with_capacity(40);
        seed.extend_from_slice(&height.to_le_bytes());
        if let Some(parent) = parent {
            seed.extend_from_slice(parent.as_bytes());
        }
        seed.extend_from_slice(block.miner.as_bytes());

        let header = BlockHeader {
            id: BlockId::digest(&seed),
            height,
            tips: parent.into_iter().collect(),
            timestamp: parent_time + ChronoDuration::seconds(BLOCK_TIME_SECS),
            difficulty: 1_000 + height.unsigned_abs() as u128,
            major_version: 1,
            minor_version: 0,
            miniblock_miners: block.miniblock_miners,
            tx_hashes: block.tx_hashes,
            miner: block.miner,
            kind: if height % 10 == 0 {
                BlockKind::Sync
            } else {
                BlockKind::Normal
            },
        };
        state.insert(header, true)
    }

    /// Append `count` anonymous blocks. Returns their ids in height order.
    pub fn extend(&self, count: i64) -> Vec<BlockId> {
        (0..count)
            .map(|_| {
                self.append(NewBlock {
                    miner: "devnet".into(),
                    ..NewBlock::default()
                })
            })
            .collect()
    }

    /// Store a side block at `height` whose primary parent is the main-chain
    /// block just below it. Side blocks are not indexed.
    pub fn add_side_block(&self, height: i64, miner: &str) -> StoreResult<BlockId> {
        let mut state = self.state.write();
        let parent = usize::try_from(height - 1)
            .ok()
            .and_then(|h| state.main.get(h).copied())
            .ok_or_else(|| StoreError::not_found(format!("main block at height {}", height - 1)))?;
        let mut seed = b"side".to_vec();
        seed.extend_from_slice(&height.to_le_bytes());
        seed.extend_from_slice(miner.as_bytes());

        let header = BlockHeader {
            id: BlockId::digest(&seed),
            height,
            tips: vec![parent],
            timestamp: Utc::now(),
            difficulty: 1_000,
            major_version: 1,
            minor_version: 0,
            miniblock_miners: Vec::new(),
            tx_hashes: Vec::new(),
            miner: miner.to_string(),
            kind: BlockKind::Side,
        };
        Ok(state.insert(header, false))
    }

    pub fn set_network_hashrate(&self, hashrate: u64) {
        self.hashrate.store(hashrate, Ordering::Relaxed);
    }

    pub fn set_miniblock_count(&self, count: usize) {
        self.miniblocks.store(count, Ordering::Relaxed);
    }

    pub fn set_pruned(&self, topo: Option<i64>) {
        *self.pruned.write() = topo;
    }

    /// Overwrite an index entry without going through [`ChainStore`],
    /// simulating a torn commit.
    pub fn corrupt_topo(&self, topo: i64, block_id: BlockId) {
        let mut state = self.state.write();
        let version = state.topo.get(&topo).map_or(0, |e| e.snapshot_version);
        state.topo.insert(
            topo,
            TopoEntry {
                block_id,
                snapshot_version: version,
                height: topo,
            },
        );
    }

    pub fn remove_topo(&self, topo: i64) {
        self.state.write().topo.remove(&topo);
    }

    /// Drop a block's body while leaving the index untouched.
    pub fn forget_block(&self, id: &BlockId) {
        let mut state = self.state.write();
        state.blocks.remove(id);
        state.versions.remove(id);
    }

    /// Make index reads at `topo` fail with an I/O error.
    pub fn fail_reads_at(&self, topo: i64) {
        self.state.write().failing_reads.insert(topo);
    }

    /// Number of index writes made through [`ChainStore::write_topo_entry`].
    #[must_use]
    pub fn topo_writes(&self) -> u64 {
        self.topo_writes.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

fn valid_integrator(address: &str) -> bool {
    address.len() >= 8 && address.chars().all(|c| c.is_ascii_alphanumeric())
}

impl ChainStore for MemoryChain {
    fn height(&self) -> i64 {
        self.state.read().height().max(0)
    }

    fn topo_height(&self) -> i64 {
        self.state
            .read()
            .topo
            .keys()
            .next_back()
            .copied()
            .unwrap_or(0)
    }

    fn tips(&self) -> Vec<BlockId> {
        self.state.read().tip().into_iter().collect()
    }

    fn load_block(&self, id: &BlockId) -> StoreResult<BlockHeader> {
        self.state
            .read()
            .blocks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("block {id}")))
    }

    fn block_exists(&self, id: &BlockId) -> bool {
        self.state.read().blocks.contains_key(id)
    }

    fn height_of(&self, id: &BlockId) -> StoreResult<i64> {
        self.load_block(id).map(|h| h.height)
    }

    fn topo_of(&self, id: &BlockId) -> StoreResult<i64> {
        let state = self.state.read();
        let header = state
            .blocks
            .get(id)
            .ok_or_else(|| StoreError::not_found(format!("block {id}")))?;
        match usize::try_from(header.height)
            .ok()
            .and_then(|h| state.main.get(h))
        {
            Some(main) if main == id => Ok(header.height),
            _ => Err(StoreError::not_found(format!("topo order of side block {id}"))),
        }
    }

    fn read_topo_entry(&self, topo: i64) -> StoreResult<TopoEntry> {
        let state = self.state.read();
        if state.failing_reads.contains(&topo) {
            return Err(StoreError::Io(format!("read of topo {topo} failed")));
        }
        state
            .topo
            .get(&topo)
            .copied()
            .ok_or_else(|| StoreError::not_found(format!("topo entry {topo}")))
    }

    fn write_topo_entry(&self, topo: i64, entry: TopoEntry) -> StoreResult<()> {
        self.state.write().topo.insert(topo, entry);
        self.topo_writes.fetch_add(1, Ordering::SeqCst);
        debug!(topo, block = %entry.block_id, "Topo entry written");
        Ok(())
    }

    fn snapshot_version(&self, id: &BlockId) -> StoreResult<u64> {
        self.state
            .read()
            .versions
            .get(id)
            .copied()
            .ok_or_else(|| StoreError::not_found(format!("snapshot version of {id}")))
    }

    fn state_root(&self, version: u64) -> StoreResult<StateRoot> {
        if version == 0 {
            return Err(StoreError::not_found("state tree version 0"));
        }
        Ok(StateRoot::digest(&version.to_le_bytes()))
    }

    fn blocks_at_height(&self, height: i64) -> Vec<BlockId> {
        self.state
            .read()
            .by_height
            .get(&height)
            .cloned()
            .unwrap_or_default()
    }

    fn rewind(&self, count: u64) -> StoreResult<()> {
        let mut state = self.state.write();
        let height = state.height();
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        if count > height {
            return Err(StoreError::Rejected(format!(
                "cannot pop {count} blocks from a chain of height {height}"
            )));
        }
        for _ in 0..count {
            let Some(id) = state.main.pop() else { break };
            if let Some(header) = state.blocks.remove(&id) {
                state.topo.remove(&header.height);
                if let Some(ids) = state.by_height.get_mut(&header.height) {
                    ids.retain(|b| *b != id);
                }
                for tx in &header.tx_hashes {
                    state.txs.remove(tx);
                }
            }
            state.versions.remove(&id);
        }
        Ok(())
    }

    fn network_hashrate(&self) -> u64 {
        self.hashrate.load(Ordering::Relaxed)
    }

    fn miniblock_count(&self) -> usize {
        self.miniblocks.load(Ordering::Relaxed)
    }

    fn export_block(&self, id: &BlockId) -> StoreResult<Vec<u8>> {
        let state = self.state.read();
        let header = state
            .blocks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("block {id}")))?;
        let txs = header
            .tx_hashes
            .iter()
            .map(|tx| {
                state
                    .txs
                    .get(tx)
                    .map(|r| (*tx, r.registration))
                    .ok_or_else(|| StoreError::not_found(format!("transaction {tx}")))
            })
            .collect::<StoreResult<Vec<_>>>()?;
        serde_json::to_vec(&ExportedBlock { header, txs })
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn import_block(&self, bytes: &[u8]) -> StoreResult<BlockId> {
        let exported: ExportedBlock =
            serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let header = exported.header;
        let mut state = self.state.write();
        if state.blocks.contains_key(&header.id) {
            return Err(StoreError::Rejected(format!("block {} already present", header.id)));
        }
        if let Some(missing) = header.tips.iter().find(|t| !state.blocks.contains_key(t)) {
            return Err(StoreError::Rejected(format!("parent {missing} not in store")));
        }
        let extends_tip = header.height == state.height() + 1 && header.primary_parent() == state.tip();
        Ok(state.insert(header, extends_tip))
    }

    fn transaction(&self, id: &TxId) -> StoreResult<TxRecord> {
        self.state
            .read()
            .txs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("transaction {id}")))
    }

    fn integrator_address(&self) -> String {
        self.integrator.read().clone()
    }

    fn set_integrator_address(&self, address: &str) -> Result<()> {
        if !valid_integrator(address) {
            return Err(Error::InvalidAddress(address.to_string()));
        }
        *self.integrator.write() = address.to_string();
        Ok(())
    }

    fn pruned_topo(&self) -> Option<i64> {
        *self.pruned.read()
    }

    fn shutdown(&self) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_only_chain() {
        let chain = MemoryChain::new();
        assert_eq!(chain.height(), 0);
        assert_eq!(chain.topo_height(), 0);
        assert_eq!(chain.tips().len(), 1);
    }

    #[test]
    fn appended_blocks_link_to_parent() {
        let chain = MemoryChain::new();
        let ids = chain.extend(3);
        let top = chain.load_block(&ids[2]).unwrap();
        assert_eq!(top.height, 3);
        assert_eq!(top.primary_parent(), Some(ids[1]));
        assert_eq!(chain.block_at_topo(2).unwrap(), ids[1]);
    }

    #[test]
    fn rewind_drops_top_blocks_and_index() {
        let chain = MemoryChain::new();
        let ids = chain.extend(5);
        chain.rewind(2).unwrap();
        assert_eq!(chain.height(), 3);
        assert!(!chain.block_exists(&ids[4]));
        assert!(chain.read_topo_entry(5).is_err());
        assert!(matches!(chain.rewind(10), Err(StoreError::Rejected(_))));
    }

    #[test]
    fn export_then_import_into_fresh_store() {
        let source = MemoryChain::new();
        let ids = source.extend(1);
        let bytes = source.export_block(&ids[0]).unwrap();

        let target = MemoryChain::new();
        assert_eq!(target.import_block(&bytes).unwrap(), ids[0]);
        assert_eq!(target.height(), 1);
        assert!(matches!(target.import_block(&bytes), Err(StoreError::Rejected(_))));
    }

    #[test]
    fn side_blocks_are_not_indexed() {
        let chain = MemoryChain::new();
        chain.extend(3);
        let side = chain.add_side_block(2, "alt").unwrap();
        assert_eq!(chain.blocks_at_height(2).len(), 2);
        assert!(chain.topo_of(&side).is_err());
        assert_eq!(chain.load_block(&side).unwrap().kind, BlockKind::Side);
    }

    #[test]
    fn integrator_address_is_validated() {
        let chain = MemoryChain::new();
        assert!(matches!(
            chain.set_integrator_address("bad addr"),
            Err(Error::InvalidAddress(_))
        ));
        chain.set_integrator_address("dero1qyintegrator").unwrap();
        assert_eq!(chain.integrator_address(), "dero1qyintegrator");
    }
}
