//! Peer health diagnostics.
//!
//! A run checks every connected peer's latency and block transmission success
//! against the running configuration's thresholds and logs what it finds.
//! Only one run may be in flight at a time.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::config::RunningConfig;
use crate::application::context::NodeContext;
use crate::domain::PeerInfo;

/// How often the scheduler re-reads a disabled diagnostic delay.
const IDLE_RECHECK: Duration = Duration::from_secs(5);

/// Limits a healthy peer stays within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub max_latency: Duration,
    /// Highest tolerated share of rejected relayed blocks, in percent.
    pub max_reject_percent: f64,
}

impl Thresholds {
    #[must_use]
    pub fn from_config(config: &RunningConfig) -> Self {
        Self {
            max_latency: config.peer_latency_threshold(),
            max_reject_percent: config.block_reject_threshold as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerIssue {
    HighLatency,
    LowTransmissionSuccess,
}

/// A peer outside at least one threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerFinding {
    pub address: String,
    pub latency: Duration,
    pub success: f64,
    pub issues: Vec<PeerIssue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticsReport {
    pub checked: usize,
    pub findings: Vec<PeerFinding>,
}

impl DiagnosticsReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Check connected peers against `thresholds`. Disconnected peers are skipped.
#[must_use]
pub fn check_peers(peers: &[PeerInfo], thresholds: Thresholds) -> DiagnosticsReport {
    let mut report = DiagnosticsReport::default();
    for peer in peers.iter().filter(|p| p.connected) {
        report.checked += 1;
        let success = peer.transmission_success();
        let mut issues = Vec::new();
        if peer.latency > thresholds.max_latency {
            issues.push(PeerIssue::HighLatency);
        }
        if 100.0 - success > thresholds.max_reject_percent {
            issues.push(PeerIssue::LowTransmissionSuccess);
        }
        if !issues.is_empty() {
            report.findings.push(PeerFinding {
                address: peer.address.clone(),
                latency: peer.latency,
                success,
                issues,
            });
        }
    }
    report
}

/// Run one diagnostics pass and log the outcome.
pub fn run_diagnostics(ctx: &NodeContext) -> DiagnosticsReport {
    let thresholds = ctx.config.get(Thresholds::from_config);
    info!(
        max_latency_ms = thresholds.max_latency.as_millis() as u64,
        max_reject_percent = thresholds.max_reject_percent,
        "Diagnostics started"
    );

    let report = check_peers(&ctx.network.peers(), thresholds);
    for finding in &report.findings {
        for issue in &finding.issues {
            match issue {
                PeerIssue::HighLatency => warn!(
                    peer = %finding.address,
                    latency_ms = finding.latency.as_millis() as u64,
                    "Peer latency above threshold"
                ),
                PeerIssue::LowTransmissionSuccess => warn!(
                    peer = %finding.address,
                    success = finding.success,
                    "Peer block transmission success below threshold"
                ),
            }
        }
    }
    info!(
        checked = report.checked,
        flagged = report.findings.len(),
        "Diagnostics finished"
    );
    report
}

/// Releases the diagnostics slot even if the run unwinds.
struct DiagnosticsSlot(NodeContext);

impl Drop for DiagnosticsSlot {
    fn drop(&mut self) {
        self.0.end_diagnostics();
    }
}

/// Start a background run. Returns `false` if one is already in progress.
pub fn spawn_diagnostics(ctx: &NodeContext) -> bool {
    if !ctx.try_begin_diagnostics() {
        return false;
    }
    let slot = DiagnosticsSlot(ctx.clone());
    ctx.subsystems.spawn("diagnostics", async move {
        run_diagnostics(&slot.0);
        drop(slot);
    });
    true
}

/// Start a run every `diagnostic_delay_secs` until shutdown. A delay of zero
/// disables scheduled runs; the value is re-read after every wait.
pub async fn run_schedule(ctx: NodeContext) {
    loop {
        if ctx.shutdown.is_fired() {
            break;
        }
        let delay = ctx.config.get(|c| c.diagnostic_delay_secs);
        let wait = if delay == 0 {
            IDLE_RECHECK
        } else {
            Duration::from_secs(delay)
        };
        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            () = ctx.shutdown.wait() => break,
        }
        if delay > 0 && !spawn_diagnostics(&ctx) {
            debug!("Scheduled diagnostics skipped, previous run still active");
        }
    }
    debug!("Diagnostics scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryNetwork;

    fn thresholds() -> Thresholds {
        Thresholds {
            max_latency: Duration::from_millis(1000),
            max_reject_percent: 5.0,
        }
    }

    #[test]
    fn healthy_peers_produce_no_findings() {
        let peers = vec![MemoryNetwork::peer("10.0.0.1:1", 5)];
        let report = check_peers(&peers, thresholds());
        assert_eq!(report.checked, 1);
        assert!(report.is_healthy());
    }

    #[test]
    fn slow_and_lossy_peers_are_flagged() {
        let mut slow = MemoryNetwork::peer("10.0.0.1:1", 5);
        slow.latency = Duration::from_millis(1500);
        let mut lossy = MemoryNetwork::peer("10.0.0.2:1", 5);
        lossy.relayed_blocks = 100;
        lossy.rejected_blocks = 10;

        let report = check_peers(&[slow, lossy], thresholds());
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].issues, [PeerIssue::HighLatency]);
        assert_eq!(report.findings[1].issues, [PeerIssue::LowTransmissionSuccess]);
    }

    #[test]
    fn disconnected_peers_are_not_checked() {
        let mut gone = MemoryNetwork::peer("10.0.0.3:1", 5);
        gone.connected = false;
        gone.latency = Duration::from_secs(10);
        let report = check_peers(&[gone], thresholds());
        assert_eq!(report.checked, 0);
        assert!(report.is_healthy());
    }
}
