//! Peer-to-peer networking port.

use std::time::Duration;

use crate::domain::{
    BanEntry, ConnectionInfo, Likelihood, MinedBlock, MinerActivity, NodeActivity, PeerInfo,
};
use crate::error::Result;

/// Port for the peer-to-peer stack.
///
/// Ban and trust lists are owned and synchronized by the implementation.
/// Activity queries take the lowest height of the stats window.
pub trait PeerNetwork: Send + Sync {
    fn peer_count(&self) -> u64;

    fn whitelisted_peer_count(&self) -> u64;

    /// `(height, topo_height)` of the best connected peer.
    fn best_peer_height(&self) -> (i64, i64);

    /// `(incoming, outgoing)` connection counts.
    fn direction_counts(&self) -> (u64, u64);

    /// Known peers, connected first.
    fn peers(&self) -> Vec<PeerInfo>;

    fn peer(&self, address: &str) -> Option<PeerInfo>;

    fn connections(&self) -> Vec<ConnectionInfo>;

    /// # Errors
    /// [`crate::error::Error::InvalidAddress`] when `address` is not an IP.
    fn ban(&self, address: &str, duration: Duration) -> Result<()>;

    fn perm_ban(&self, address: &str) -> Result<()>;

    /// # Errors
    /// Fails when the address is malformed or not banned.
    fn unban(&self, address: &str) -> Result<()>;

    /// Active bans; expired entries are never returned.
    fn bans(&self) -> Vec<BanEntry>;

    /// Ban every peer claiming a height above `height`. Returns how many.
    fn ban_above_height(&self, height: i64) -> usize;

    fn connect(&self, address: &str) -> Result<()>;

    fn disconnect(&self, address: &str) -> Result<()>;

    fn add_trusted(&self, address: &str) -> Result<()>;

    fn remove_trusted(&self, address: &str) -> Result<()>;

    fn trusted(&self) -> Vec<String>;

    /// Drop every connection to an untrusted peer. Returns how many.
    fn drop_untrusted(&self) -> usize;

    /// Reset the relayed and rejected block counters of one peer.
    ///
    /// # Errors
    /// Fails when the address is malformed or not a known peer.
    fn clear_peer_stats(&self, address: &str) -> Result<()>;

    /// Reset the block counters of every known peer. Returns how many.
    fn clear_all_peer_stats(&self) -> usize;

    fn node_tag(&self) -> String;

    fn set_node_tag(&self, tag: &str);

    fn peer_id(&self) -> u64;

    fn peer_bounds(&self) -> (u32, u32);

    fn set_peer_bounds(&self, min: u32, max: u32);

    /// Orphans seen on the network at or above `height`.
    fn network_orphans_since(&self, height: i64) -> u64;

    /// Per-node production in iteration order.
    fn active_nodes(&self, since: i64) -> Vec<NodeActivity>;

    /// Per-miner production in iteration order.
    fn active_miners(&self, since: i64) -> Vec<MinerActivity>;

    /// Node most likely hosting `miner`.
    fn best_guess_miner_node(&self, since: i64, miner: &str) -> Option<Likelihood>;

    fn potential_miner_nodes(&self, since: i64, miner: &str) -> Vec<Likelihood>;

    fn potential_miners_on_node(&self, since: i64, node: &str) -> Vec<Likelihood>;

    fn potential_integrators(&self, since: i64, node: &str) -> Vec<Likelihood>;

    /// Blocks produced by miners attached to this node.
    fn mined_blocks(&self) -> Vec<MinedBlock>;

    fn shutdown(&self) -> Result<()>;
}
