//! The explicit context handed to every loop and command handler.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::application::config::RunningConfigStore;
use crate::application::shutdown::{ShutdownSignal, SubsystemCounter};
use crate::application::telemetry::SnapshotCell;
use crate::domain::NodeCounters;
use crate::port::outbound::{
    ChainStore, LogLevelControl, MiningService, PeerNetwork, RequestServer, TxPool,
};

/// Which network the node joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkMode {
    #[default]
    Mainnet,
    Testnet,
}

impl NetworkMode {
    #[must_use]
    pub const fn is_mainnet(self) -> bool {
        matches!(self, Self::Mainnet)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mainnet => "MAINNET",
            Self::Testnet => "TESTNET",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Static facts about this process fixed at startup.
#[derive(Debug, Clone)]
pub struct NodeEnvironment {
    pub network: NetworkMode,
    pub data_dir: PathBuf,
    /// Target of `block_export` and source of `block_import`.
    pub export_dir: PathBuf,
    /// Seed and priority nodes dialed by `connect_to_seeds`.
    pub seed_nodes: Vec<String>,
    pub hostname: String,
}

impl NodeEnvironment {
    #[must_use]
    pub fn new(network: NetworkMode, data_dir: PathBuf) -> Self {
        Self {
            network,
            export_dir: data_dir.join("export"),
            data_dir,
            seed_nodes: Vec::new(),
            hostname: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".into()),
        }
    }
}

/// The external collaborators, each behind its port.
#[derive(Clone)]
pub struct Collaborators {
    pub chain: Arc<dyn ChainStore>,
    pub network: Arc<dyn PeerNetwork>,
    pub mempool: Arc<dyn TxPool>,
    pub regpool: Arc<dyn TxPool>,
    pub mining: Arc<dyn MiningService>,
    pub servers: Vec<Arc<dyn RequestServer>>,
    pub log: Arc<dyn LogLevelControl>,
}

/// Everything the sampler, renderer and dispatcher share.
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct NodeContext {
    pub chain: Arc<dyn ChainStore>,
    pub network: Arc<dyn PeerNetwork>,
    pub mempool: Arc<dyn TxPool>,
    pub regpool: Arc<dyn TxPool>,
    pub mining: Arc<dyn MiningService>,
    pub servers: Vec<Arc<dyn RequestServer>>,
    pub log: Arc<dyn LogLevelControl>,
    pub config: Arc<RunningConfigStore>,
    pub counters: Arc<NodeCounters>,
    pub snapshot: SnapshotCell,
    pub shutdown: ShutdownSignal,
    pub subsystems: SubsystemCounter,
    pub env: Arc<NodeEnvironment>,
    diagnostics_running: Arc<AtomicBool>,
}

impl NodeContext {
    #[must_use]
    pub fn new(
        collaborators: Collaborators,
        config: Arc<RunningConfigStore>,
        counters: Arc<NodeCounters>,
        env: NodeEnvironment,
    ) -> Self {
        Self {
            chain: collaborators.chain,
            network: collaborators.network,
            mempool: collaborators.mempool,
            regpool: collaborators.regpool,
            mining: collaborators.mining,
            servers: collaborators.servers,
            log: collaborators.log,
            config,
            counters,
            snapshot: SnapshotCell::new(),
            shutdown: ShutdownSignal::new(),
            subsystems: SubsystemCounter::new(),
            env: Arc::new(env),
            diagnostics_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Lowest height of the network statistics window.
    #[must_use]
    pub fn stats_window_start(&self) -> i64 {
        self.chain.height() - self.config.get(|c| c.network_stats_keep)
    }

    /// Claim the diagnostics slot. Returns `false` if a run is in progress.
    pub fn try_begin_diagnostics(&self) -> bool {
        self.diagnostics_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn end_diagnostics(&self) {
        self.diagnostics_running.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn diagnostics_running(&self) -> bool {
        self.diagnostics_running.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeContext")
            .field("network", &self.env.network)
            .field("data_dir", &self.env.data_dir)
            .field("shutdown", &self.shutdown.is_fired())
            .field("active_subsystems", &self.subsystems.active())
            .finish_non_exhaustive()
    }
}
