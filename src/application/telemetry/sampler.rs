//! Periodic telemetry sampling.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::application::context::NodeContext;
use crate::application::panic_reason;
use crate::application::statistics::network_loss_percent;
use crate::domain::TelemetrySnapshot;

/// Default sampling period.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Polls collaborators and publishes one snapshot per tick.
///
/// The only writer of [`NodeContext::snapshot`].
pub struct Sampler {
    ctx: NodeContext,
    interval: Duration,
}

impl Sampler {
    #[must_use]
    pub fn new(ctx: NodeContext) -> Self {
        Self {
            ctx,
            interval: SAMPLE_INTERVAL,
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Build a snapshot from the collaborators' current state. Reads only.
    #[must_use]
    pub fn sample(&self) -> TelemetrySnapshot {
        let ctx = &self.ctx;
        let keep = ctx.config.get(|c| c.network_stats_keep);

        let our_height = ctx.chain.height();
        let (best_peer_height, best_peer_topo_height) = ctx.network.best_peer_height();
        let total_orphans = ctx.network.network_orphans_since(our_height - keep);
        let total_blocks = ctx.counters.total_blocks();

        TelemetrySnapshot {
            our_height,
            best_peer_height,
            best_peer_topo_height,
            peer_count: ctx.network.peer_count(),
            whitelisted_peer_count: ctx.network.whitelisted_peer_count(),
            topo_height: ctx.chain.topo_height(),
            mempool_tx_count: ctx.mempool.len(),
            regpool_tx_count: ctx.regpool.len(),
            network_hashrate: ctx.chain.network_hashrate(),
            miniblock_count: ctx.chain.miniblock_count(),
            miner_count: ctx.mining.miner_count(),
            total_orphans,
            own_orphan_count: ctx.counters.own_orphans(),
            network_loss_percent: network_loss_percent(keep, total_blocks, total_orphans),
            blocks_minted: ctx.counters.minted(),
            sampled_at: Utc::now(),
        }
    }

    /// Sample and publish once. A faulting collaborator skips the tick and
    /// leaves the previous snapshot in place.
    pub fn tick(&self) -> bool {
        match catch_unwind(AssertUnwindSafe(|| self.sample())) {
            Ok(snapshot) => {
                let counters = &self.ctx.counters;
                if counters.chain_start_height() == 0 && counters.total_blocks() >= 1 {
                    counters.mark_chain_start(snapshot.our_height);
                }
                self.ctx.snapshot.publish(snapshot);
                true
            }
            Err(panic) => {
                warn!(reason = %panic_reason(&*panic), "Telemetry sample failed, skipping tick");
                false
            }
        }
    }

    /// Run until shutdown. The signal is checked before each sample so an
    /// in-flight sample always completes.
    pub async fn run(self) {
        info!(interval_ms = self.interval.as_millis() as u64, "Telemetry sampler started");
        loop {
            if self.ctx.shutdown.is_fired() {
                break;
            }
            self.tick();
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = self.ctx.shutdown.wait() => {}
            }
        }
        debug!("Telemetry sampler stopped");
    }
}
