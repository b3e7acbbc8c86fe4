//! Network statistics over the trailing window of accepted blocks.
//!
//! Collection belongs to the networking collaborator; this module only ranks
//! and derives percentages from what it reports.

use std::fmt;

use crate::domain::format::percent;
use crate::domain::{Likelihood, MinerActivity, MinerCounts, NodeActivity, NodeCounts};

/// Rows shown by `active_nodes`/`active_miners` when no count is given.
pub const DEFAULT_SHOW_COUNT: usize = 25;

/// The trailing window the statistics cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    /// Configured window size in blocks.
    pub keep: i64,
    /// Blocks observed since this node started following the chain.
    pub observed: i64,
}

impl StatsWindow {
    #[must_use]
    pub fn new(keep: i64, height: i64, chain_start_height: i64) -> Self {
        Self {
            keep,
            observed: height - chain_start_height,
        }
    }

    /// Blocks actually covered: the configured size, or fewer right after start.
    #[must_use]
    pub fn effective(&self) -> i64 {
        self.keep.min(self.observed.max(0))
    }
}

impl fmt::Display for StatsWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.observed < self.keep {
            write!(f, "Last {}/{} Blocks", self.observed.max(0), self.keep)
        } else {
            write!(f, "Last {} Blocks", self.keep)
        }
    }
}

/// One ranked peer node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRank {
    pub node: String,
    pub counts: NodeCounts,
    pub dominance: f64,
    pub orphan_loss: f64,
}

/// One ranked miner address.
#[derive(Debug, Clone, PartialEq)]
pub struct MinerRank {
    pub miner: String,
    pub counts: MinerCounts,
    pub dominance: f64,
    pub orphan_loss: f64,
}

/// Rank nodes by total contribution, descending.
///
/// Dominance is each node's accepted blocks over the accepted blocks of all
/// nodes in the window, so the shares add up to 100. Ties keep the order the
/// collaborator reported.
#[must_use]
pub fn rank_nodes(activity: Vec<NodeActivity>) -> Vec<NodeRank> {
    let window_total: u64 = activity.iter().map(|a| a.counts.produced()).sum();

    let mut ranked: Vec<NodeRank> = activity
        .into_iter()
        .map(|a| NodeRank {
            dominance: percent(a.counts.produced() as f64, window_total as f64),
            orphan_loss: percent(a.counts.orphans as f64, a.counts.total() as f64),
            node: a.node,
            counts: a.counts,
        })
        .collect();
    ranked.sort_by(|a, b| b.counts.total().cmp(&a.counts.total()));
    ranked
}

/// Rank miners by total contribution, descending. Same rules as [`rank_nodes`].
#[must_use]
pub fn rank_miners(activity: Vec<MinerActivity>) -> Vec<MinerRank> {
    let window_total: u64 = activity.iter().map(|a| a.counts.produced()).sum();

    let mut ranked: Vec<MinerRank> = activity
        .into_iter()
        .map(|a| MinerRank {
            dominance: percent(a.counts.produced() as f64, window_total as f64),
            orphan_loss: percent(a.counts.orphans() as f64, a.counts.total() as f64),
            miner: a.miner,
            counts: a.counts,
        })
        .collect();
    ranked.sort_by(|a, b| b.counts.total().cmp(&a.counts.total()));
    ranked
}

/// Order best-guess matches by likelihood, most probable first.
#[must_use]
pub fn order_likelihoods(mut matches: Vec<Likelihood>) -> Vec<Likelihood> {
    matches.sort_by(|a, b| b.likelihood.total_cmp(&a.likelihood));
    matches
}

/// Share of network blocks lost to orphans.
///
/// The window is ten times the stats keep count; until the node has counted
/// that many blocks the counted total is used instead, otherwise the orphans
/// are added on top.
#[must_use]
pub fn network_loss_percent(keep: i64, total_blocks: u64, network_orphans: u64) -> f64 {
    let full_window = u64::try_from(keep.max(0)).unwrap_or(0) * 10;
    let window = if total_blocks < full_window {
        total_blocks
    } else {
        full_window + network_orphans
    };
    if network_orphans > 0 && window > 0 {
        network_orphans as f64 / window as f64 * 100.0
    } else {
        0.0
    }
}
