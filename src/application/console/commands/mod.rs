//! Built-in console commands, grouped by what they touch.

pub mod chain;
pub mod lifecycle;
pub mod network_stats;
pub mod node;
pub mod peers;
pub mod pools;

use std::sync::Arc;

use super::command::CommandHandler;
use crate::application::context::NodeContext;
use crate::application::statistics::StatsWindow;
use pools::PoolKind;

/// The trailing statistics window as of the current tip.
fn window(ctx: &NodeContext) -> StatsWindow {
    StatsWindow::new(
        ctx.config.get(|c| c.network_stats_keep),
        ctx.chain.height(),
        ctx.counters.chain_start_height(),
    )
}

/// Every built-in handler except `help`, which needs the finished registry.
#[must_use]
pub fn all() -> Vec<Arc<dyn CommandHandler>> {
    vec![
        // node
        Arc::new(node::Status),
        Arc::new(node::Uptime),
        Arc::new(node::Version),
        Arc::new(node::Config),
        Arc::new(node::DebugLevel),
        Arc::new(node::RunDiagnostics),
        // peers
        Arc::new(peers::PeerList),
        Arc::new(peers::SyncInfo),
        Arc::new(peers::PeerInfoCommand),
        Arc::new(peers::Ban),
        Arc::new(peers::PermBan),
        Arc::new(peers::Unban),
        Arc::new(peers::Bans),
        Arc::new(peers::BanAboveHeight),
        Arc::new(peers::ConnectToPeer),
        Arc::new(peers::DisconnectPeer),
        Arc::new(peers::ConnectToSeeds),
        Arc::new(peers::AddTrusted),
        Arc::new(peers::RemoveTrusted),
        Arc::new(peers::ListTrusted),
        Arc::new(peers::PeerErrors),
        Arc::new(peers::ClearPeerStats),
        Arc::new(peers::ClearAllPeerStats),
        Arc::new(peers::ShowSelfish),
        // chain
        Arc::new(chain::PrintBc),
        Arc::new(chain::PrintBlock),
        Arc::new(chain::PrintTx),
        Arc::new(chain::BlockExport),
        Arc::new(chain::BlockImport),
        Arc::new(chain::Fix),
        Arc::new(chain::Graph),
        Arc::new(chain::Pop),
        Arc::new(chain::SetIntegratorAddress),
        // network statistics
        Arc::new(network_stats::ActiveNodes),
        Arc::new(network_stats::ActiveMiners),
        Arc::new(network_stats::MinerInfo),
        Arc::new(network_stats::MinedBlocks),
        Arc::new(network_stats::ListMiners),
        Arc::new(network_stats::AddressToName),
        // pools
        Arc::new(pools::PoolPrint(PoolKind::Mempool)),
        Arc::new(pools::PoolFlush(PoolKind::Mempool)),
        Arc::new(pools::PoolDeleteTx(PoolKind::Mempool)),
        Arc::new(pools::MempoolDump),
        Arc::new(pools::PoolPrint(PoolKind::Regpool)),
        Arc::new(pools::PoolFlush(PoolKind::Regpool)),
        Arc::new(pools::PoolDeleteTx(PoolKind::Regpool)),
        // lifecycle
        Arc::new(lifecycle::Exit),
    ]
}
