//! Per-node and per-miner block production counters over a stats window.

use serde::{Deserialize, Serialize};

/// Block production counters for a single peer node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounts {
    /// Full (integrator) blocks.
    pub finals: u64,
    pub minis: u64,
    pub orphans: u64,
}

impl NodeCounts {
    /// Accepted blocks, used as the dominance numerator.
    #[must_use]
    pub const fn produced(&self) -> u64 {
        self.finals + self.minis
    }

    /// Everything seen, orphans included; used for ranking and orphan loss.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.finals + self.minis + self.orphans
    }
}

/// Block production counters for a single miner address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerCounts {
    pub finals: u64,
    pub minis: u64,
    /// Orphaned full blocks.
    pub ibo: u64,
    /// Orphaned miniblocks.
    pub mbo: u64,
}

impl MinerCounts {
    #[must_use]
    pub const fn produced(&self) -> u64 {
        self.finals + self.minis
    }

    #[must_use]
    pub const fn orphans(&self) -> u64 {
        self.ibo + self.mbo
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.produced() + self.orphans()
    }
}

/// Activity of one peer node, in the order the network collaborator saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeActivity {
    pub node: String,
    pub counts: NodeCounts,
}

/// Activity of one miner address, in the order the network collaborator saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerActivity {
    pub miner: String,
    pub counts: MinerCounts,
}

/// Best-guess attribution of a miner to a node (or the reverse).
#[derive(Debug, Clone, PartialEq)]
pub struct Likelihood {
    pub name: String,
    pub counts: NodeCounts,
    /// Percentage in `0..=100`.
    pub likelihood: f64,
}

/// A block this node produced, as remembered by the network collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedBlock {
    pub miner: String,
    pub height: i64,
}

/// A miner currently connected to the work server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedMiner {
    pub address: String,
    pub wallet: String,
    pub blocks: u64,
    pub minis: u64,
    pub rejected: u64,
}
