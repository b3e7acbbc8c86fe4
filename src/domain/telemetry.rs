//! Telemetry snapshot published by the sampler.

use chrono::{DateTime, Utc};

/// One fully formed telemetry sample.
///
/// Built once per sampling tick and never mutated afterwards; readers always
/// see a whole sample, never fields from two different ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub our_height: i64,
    pub best_peer_height: i64,
    pub best_peer_topo_height: i64,
    pub peer_count: u64,
    pub whitelisted_peer_count: u64,
    pub topo_height: i64,
    pub mempool_tx_count: usize,
    pub regpool_tx_count: usize,
    /// Hashes per second.
    pub network_hashrate: u64,
    pub miniblock_count: usize,
    pub miner_count: usize,
    pub total_orphans: u64,
    pub own_orphan_count: u64,
    pub network_loss_percent: f64,
    /// Blocks and miniblocks this node produced and got accepted.
    pub blocks_minted: u64,
    pub sampled_at: DateTime<Utc>,
}

impl TelemetrySnapshot {
    /// Sample used before the first tick lands.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            our_height: 0,
            best_peer_height: 0,
            best_peer_topo_height: 0,
            peer_count: 0,
            whitelisted_peer_count: 0,
            topo_height: 0,
            mempool_tx_count: 0,
            regpool_tx_count: 0,
            network_hashrate: 0,
            miniblock_count: 0,
            miner_count: 0,
            total_orphans: 0,
            own_orphan_count: 0,
            network_loss_percent: 0.0,
            blocks_minted: 0,
            sampled_at: Utc::now(),
        }
    }
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
