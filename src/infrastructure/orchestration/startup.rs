//! Collaborator wiring and the startup index check.

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::outbound::memory::{
    Devnet, MemoryChain, MemoryMining, MemoryNetwork, MemoryPool, MemoryServer,
};
use crate::application::config::RunningConfigStore;
use crate::application::context::{Collaborators, NodeContext};
use crate::application::repair::{repair_topo_index, RepairPlan, RepairReport};
use crate::domain::NodeCounters;
use crate::error::Result;
use crate::infrastructure::config::Settings;
use crate::port::outbound::{ChainStore, LogLevelControl, PeerNetwork, RequestServer};

/// Synthetic peers connected when no exclusive nodes are configured.
const DEVNET_PEERS: usize = 12;

/// A wired node and its block producer.
pub struct PreparedNode {
    pub ctx: NodeContext,
    pub devnet: Devnet,
}

/// Load the running configuration and wire every collaborator.
///
/// # Errors
/// Fails when the data or export directory cannot be created.
pub fn prepare_node(settings: &Settings, log: Arc<dyn LogLevelControl>) -> Result<PreparedNode> {
    let env = settings.environment();
    std::fs::create_dir_all(&env.data_dir)?;
    std::fs::create_dir_all(&env.export_dir)?;

    let config = Arc::new(RunningConfigStore::load(settings.running_config_path()));
    settings.apply_overrides(&config);
    let running = config.snapshot();

    let chain = Arc::new(MemoryChain::new());
    let network = Arc::new(MemoryNetwork::new(rand::random()));
    let mempool = Arc::new(MemoryPool::mempool());
    let regpool = Arc::new(MemoryPool::regpool());
    let mining = Arc::new(MemoryMining::new(running.job_dispatch_delay()));
    let counters = Arc::new(NodeCounters::new());

    network.set_peer_bounds(running.min_peers, running.max_peers);
    network.set_node_tag(&running.node_tag);

    if let Some(address) = &settings.integrator_address {
        chain.set_integrator_address(address)?;
    }
    if let Some(height) = settings.prune_history {
        if height <= chain.topo_height() {
            chain.set_pruned(Some(height));
            info!(height, "History pruned");
        } else {
            warn!(height, tip = chain.topo_height(), "Pruning height above chain tip, skipped");
        }
    }

    let servers: Vec<Arc<dyn RequestServer>> = vec![
        Arc::new(MemoryServer::new(format!("rpc {}", settings.rpc_bind))),
        Arc::new(MemoryServer::new(format!("getwork {}", settings.getwork_bind))),
        Arc::new(MemoryServer::new(format!("p2p {}", settings.p2p_bind))),
    ];

    let devnet = Devnet::new(
        Arc::clone(&chain),
        Arc::clone(&network),
        Arc::clone(&mempool),
        Arc::clone(&counters),
        settings.block_time,
    );

    for node in settings.exclusive_nodes.iter().chain(&settings.priority_nodes) {
        if let Err(e) = network.connect(node) {
            warn!(node = %node, error = %e, "Failed to connect to configured node");
        }
    }
    if settings.exclusive_nodes.is_empty() {
        devnet.seed_peers(DEVNET_PEERS);
    }

    let ctx = NodeContext::new(
        Collaborators {
            chain,
            network,
            mempool,
            regpool,
            mining,
            servers,
            log,
        },
        config,
        counters,
        env,
    );
    info!(peers = ctx.network.peer_count(), height = ctx.chain.height(), "Node wired");

    Ok(PreparedNode { ctx, devnet })
}

/// Walk the last `depth` blocks below the tip and rewrite divergent index
/// entries. Corruption fails startup.
///
/// # Errors
/// Returns the repair error when the walk aborts.
pub fn verify_topo_index(chain: &dyn ChainStore, depth: i64) -> Result<RepairReport> {
    let plan = RepairPlan::bounded(chain.height(), depth);
    let report = repair_topo_index(chain, plan)?;
    if report.is_clean() {
        info!(visited = report.visited, "Topo index verified");
    } else {
        warn!(
            visited = report.visited,
            repaired = report.repaired.len(),
            "Topo index repaired at startup"
        );
    }
    Ok(report)
}
