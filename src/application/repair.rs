//! Topological index consistency check and repair.
//!
//! Walks the DAG backwards along each block's primary parent and makes the
//! persisted `topo height -> block` index agree with what the walk reaches.
//! The startup self-check and the `fix` command are the same walk with
//! different floors.

use tracing::{debug, info, warn};

use crate::domain::{BlockId, ChainLink, TopoEntry};
use crate::error::{RepairError, StoreError};
use crate::port::outbound::ChainStore;

/// Default number of blocks below the tip checked at startup.
pub const STARTUP_CHECK_DEPTH: i64 = 100;

/// Lowest height visited by a full walk.
pub const FULL_WALK_FLOOR: i64 = 1;

/// Where the walk begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStart {
    /// The current highest tip.
    Tip,
    /// The block committed at a fixed topological index.
    TopoIndex(i64),
}

/// Parameters of one walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairPlan {
    pub start: RepairStart,
    /// The walk stops once the height drops below this.
    pub floor: i64,
}

impl RepairPlan {
    /// Walk from the tip all the way down.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            start: RepairStart::Tip,
            floor: FULL_WALK_FLOOR,
        }
    }

    /// Bounded walk covering the top `depth` blocks below `tip_height`.
    #[must_use]
    pub fn bounded(tip_height: i64, depth: i64) -> Self {
        Self {
            start: RepairStart::Tip,
            floor: (tip_height - depth).max(FULL_WALK_FLOOR),
        }
    }
}

/// One index entry that was overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedEntry {
    pub height: i64,
    /// What the index held before, `None` when the entry was missing.
    pub previous: Option<BlockId>,
    pub block_id: BlockId,
    pub snapshot_version: u64,
}

/// Summary of a completed walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub visited: u64,
    pub repaired: Vec<RepairedEntry>,
}

impl RepairReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.repaired.is_empty()
    }
}

fn start_link(chain: &dyn ChainStore, start: RepairStart) -> Result<Option<ChainLink>, RepairError> {
    let (block_id, probe_height) = match start {
        RepairStart::Tip => {
            let Some(tip) = chain.tips().first().copied() else {
                return Ok(None);
            };
            (tip, chain.height())
        }
        RepairStart::TopoIndex(topo) => {
            let id = chain
                .block_at_topo(topo)
                .map_err(|e| RepairError::at(topo, e))?;
            (id, topo)
        }
    };
    let height = chain
        .height_of(&block_id)
        .map_err(|e| RepairError::at(probe_height, e))?;
    Ok(Some(ChainLink { block_id, height }))
}

/// Walk and heal the topological index according to `plan`.
///
/// A second run over an already consistent range performs no writes.
///
/// # Errors
/// Any failure to load a block or recompute its snapshot version aborts the
/// walk; everything below the failing height is left unexamined.
pub fn repair_topo_index(chain: &dyn ChainStore, plan: RepairPlan) -> Result<RepairReport, RepairError> {
    let mut report = RepairReport::default();
    let Some(mut link) = start_link(chain, plan.start)? else {
        debug!("No tips, nothing to check");
        return Ok(report);
    };
    debug!(start = %link.block_id, height = link.height, floor = plan.floor, "Topo index walk started");

    while link.height >= plan.floor {
        let at = |e: StoreError| RepairError::at(link.height, e);

        let previous = match chain.read_topo_entry(link.height) {
            Ok(entry) if entry.block_id == link.block_id => None,
            Ok(entry) => Some(Some(entry.block_id)),
            Err(StoreError::NotFound { .. }) => Some(None),
            Err(e) => return Err(at(e)),
        };

        if let Some(previous) = previous {
            let snapshot_version = chain.snapshot_version(&link.block_id).map_err(at)?;
            warn!(
                height = link.height,
                expected = %link.block_id,
                found = ?previous,
                "Topo index diverges from chain, rewriting entry"
            );
            chain
                .write_topo_entry(
                    link.height,
                    TopoEntry {
                        block_id: link.block_id,
                        snapshot_version,
                        height: link.height,
                    },
                )
                .map_err(at)?;
            report.repaired.push(RepairedEntry {
                height: link.height,
                previous,
                block_id: link.block_id,
                snapshot_version,
            });
        }
        report.visited += 1;

        let header = chain.load_block(&link.block_id).map_err(at)?;
        let Some(parent) = header.primary_parent() else {
            break;
        };
        let parent_height = chain.height_of(&parent).map_err(at)?;
        if parent_height >= link.height {
            return Err(at(StoreError::Corrupt(format!(
                "parent {parent} at height {parent_height} is not below its child"
            ))));
        }
        link = ChainLink {
            block_id: parent,
            height: parent_height,
        };
    }

    info!(
        visited = report.visited,
        repaired = report.repaired.len(),
        floor = plan.floor,
        "Topo index walk finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryChain;

    fn chain_of(len: i64) -> MemoryChain {
        let chain = MemoryChain::new();
        chain.extend(len);
        chain
    }

    #[test]
    fn consistent_chain_needs_no_writes() {
        let chain = chain_of(20);
        let before = chain.topo_writes();
        let report = repair_topo_index(&chain, RepairPlan::full()).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.visited, 20);
        assert_eq!(chain.topo_writes(), before);
    }

    #[test]
    fn divergent_entry_is_rewritten_then_stable() {
        let chain = chain_of(20);
        let expected = chain.block_at_topo(7).unwrap();
        chain.corrupt_topo(7, BlockId::digest(b"bogus"));

        let report = repair_topo_index(&chain, RepairPlan::full()).unwrap();
        assert_eq!(report.repaired.len(), 1);
        assert_eq!(report.repaired[0].height, 7);
        assert_eq!(report.repaired[0].previous, Some(BlockId::digest(b"bogus")));
        assert_eq!(chain.block_at_topo(7).unwrap(), expected);

        let writes = chain.topo_writes();
        let second = repair_topo_index(&chain, RepairPlan::full()).unwrap();
        assert!(second.is_clean());
        assert_eq!(chain.topo_writes(), writes);
    }

    #[test]
    fn missing_entry_is_restored() {
        let chain = chain_of(10);
        let expected = chain.block_at_topo(4).unwrap();
        chain.remove_topo(4);

        let report = repair_topo_index(&chain, RepairPlan::full()).unwrap();
        assert_eq!(report.repaired[0].previous, None);
        assert_eq!(chain.block_at_topo(4).unwrap(), expected);
    }

    #[test]
    fn bounded_walk_stops_at_floor() {
        let chain = chain_of(50);
        chain.corrupt_topo(5, BlockId::digest(b"deep"));

        let report = repair_topo_index(&chain, RepairPlan::bounded(chain.height(), 10)).unwrap();
        assert_eq!(report.visited, 11);
        assert!(report.is_clean());
    }

    #[test]
    fn topo_index_start_walks_from_that_block() {
        let chain = chain_of(30);
        chain.corrupt_topo(25, BlockId::digest(b"above"));
        let plan = RepairPlan {
            start: RepairStart::TopoIndex(20),
            floor: 10,
        };
        let report = repair_topo_index(&chain, plan).unwrap();
        assert_eq!(report.visited, 11);
        assert!(report.is_clean());
    }

    #[test]
    fn missing_block_aborts_as_corruption() {
        let chain = chain_of(10);
        let victim = chain.block_at_topo(6).unwrap();
        chain.forget_block(&victim);

        let err = repair_topo_index(&chain, RepairPlan::full()).unwrap_err();
        assert!(!err.retry_advised());
        assert_eq!(err.height(), 7);
    }

    #[test]
    fn storage_io_failure_advises_retry() {
        let chain = chain_of(10);
        chain.fail_reads_at(3);
        let err = repair_topo_index(&chain, RepairPlan::full()).unwrap_err();
        assert!(err.retry_advised());
        assert_eq!(err.height(), 3);
    }

    #[test]
    fn empty_chain_is_clean() {
        let chain = MemoryChain::empty();
        let report = repair_topo_index(&chain, RepairPlan::full()).unwrap();
        assert_eq!(report, RepairReport::default());
    }
}
