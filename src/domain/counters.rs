//! Process-lifetime counters fed by the chain and network collaborators.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Counters describing this node's own block production since start.
///
/// Shared behind an `Arc`; every field is independently atomic. Readers that
/// need a consistent view across fields go through the telemetry snapshot.
#[derive(Debug)]
pub struct NodeCounters {
    started_at: DateTime<Utc>,
    chain_start_height: AtomicI64,
    blocks_accepted: AtomicU64,
    minis_accepted: AtomicU64,
    orphan_blocks: AtomicU64,
    orphan_minis: AtomicU64,
    minis_rejected: AtomicU64,
    total_blocks: AtomicU64,
    pop_count: AtomicU64,
    turtle: AtomicBool,
}

impl NodeCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::started(Utc::now())
    }

    #[must_use]
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            started_at: at,
            chain_start_height: AtomicI64::new(0),
            blocks_accepted: AtomicU64::new(0),
            minis_accepted: AtomicU64::new(0),
            orphan_blocks: AtomicU64::new(0),
            orphan_minis: AtomicU64::new(0),
            minis_rejected: AtomicU64::new(0),
            total_blocks: AtomicU64::new(0),
            pop_count: AtomicU64::new(0),
            turtle: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Height at which the node first observed the network, 0 until known.
    #[must_use]
    pub fn chain_start_height(&self) -> i64 {
        self.chain_start_height.load(Ordering::Relaxed)
    }

    /// Record the start height once; later calls are ignored.
    pub fn mark_chain_start(&self, height: i64) {
        let _ = self.chain_start_height.compare_exchange(
            0,
            height,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
    }

    /// A block arrived from the network, ours or not.
    pub fn record_network_block(&self) {
        self.total_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_block_accepted(&self) {
        self.blocks_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mini_accepted(&self) {
        self.minis_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_block_orphaned(&self) {
        self.orphan_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mini_orphaned(&self) {
        self.orphan_minis.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mini_rejected(&self) {
        self.minis_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pop(&self, count: u64) {
        self.pop_count.fetch_add(count, Ordering::Relaxed);
    }

    #[must_use]
    pub fn blocks_accepted(&self) -> u64 {
        self.blocks_accepted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn minis_accepted(&self) -> u64 {
        self.minis_accepted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn orphan_blocks(&self) -> u64 {
        self.orphan_blocks.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn orphan_minis(&self) -> u64 {
        self.orphan_minis.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn minis_rejected(&self) -> u64 {
        self.minis_rejected.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn pop_count(&self) -> u64 {
        self.pop_count.load(Ordering::Relaxed)
    }

    /// Accepted blocks plus miniblocks.
    #[must_use]
    pub fn minted(&self) -> u64 {
        self.blocks_accepted() + self.minis_accepted()
    }

    #[must_use]
    pub fn own_orphans(&self) -> u64 {
        self.orphan_blocks() + self.orphan_minis()
    }

    #[must_use]
    pub fn turtle(&self) -> bool {
        self.turtle.load(Ordering::Relaxed)
    }

    pub fn set_turtle(&self, value: bool) {
        self.turtle.store(value, Ordering::Relaxed);
    }
}

impl Default for NodeCounters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_start_is_recorded_once() {
        let counters = NodeCounters::new();
        counters.mark_chain_start(120);
        counters.mark_chain_start(130);
        assert_eq!(counters.chain_start_height(), 120);
    }

    #[test]
    fn minted_sums_blocks_and_minis() {
        let counters = NodeCounters::new();
        counters.record_block_accepted();
        counters.record_mini_accepted();
        counters.record_mini_accepted();
        counters.record_mini_orphaned();
        assert_eq!(counters.minted(), 3);
        assert_eq!(counters.own_orphans(), 1);
    }
}
