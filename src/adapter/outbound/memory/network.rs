//! In-memory peer table, ban list and block activity log.

use std::collections::{BTreeSet, HashMap};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::domain::{
    BanEntry, ConnectionInfo, Direction, Likelihood, MinedBlock, MinerActivity, MinerCounts,
    NodeActivity, NodeCounts, PeerInfo,
};
use crate::error::{Error, Result};
use crate::port::outbound::PeerNetwork;

/// Ban applied by `ban_above_height`.
const HEIGHT_BAN: Duration = Duration::from_secs(600);

/// Kind of block observed on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockClass {
    Final,
    Mini,
}

/// One block seen on the network, attributed to the node that relayed it
/// first and the miner that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub height: i64,
    pub node: String,
    pub miner: String,
    pub class: BlockClass,
    pub orphan: bool,
}

#[derive(Debug, Default)]
struct NetState {
    peers: Vec<PeerInfo>,
    bans: HashMap<IpAddr, Option<DateTime<Utc>>>,
    trusted: BTreeSet<IpAddr>,
    node_tag: String,
    bounds: (u32, u32),
    activity: Vec<ActivityRecord>,
    mined: Vec<MinedBlock>,
}

/// In-memory [`PeerNetwork`].
#[derive(Debug)]
pub struct MemoryNetwork {
    peer_id: u64,
    state: RwLock<NetState>,
    stopped: AtomicBool,
}

fn parse_ip(address: &str) -> Result<IpAddr> {
    address
        .parse::<IpAddr>()
        .or_else(|_| address.parse::<SocketAddr>().map(|s| s.ip()))
        .map_err(|_| Error::InvalidAddress(address.to_string()))
}

fn peer_ip(peer: &PeerInfo) -> Option<IpAddr> {
    parse_ip(&peer.address).ok()
}

/// Group records by a key, keeping first-seen order.
fn group_by<'a, K, F>(records: impl Iterator<Item = &'a ActivityRecord>, key: F) -> Vec<(String, NodeCounts)>
where
    F: Fn(&'a ActivityRecord) -> K,
    K: Into<String>,
{
    let mut order: Vec<(String, NodeCounts)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        let name: String = key(record).into();
        let slot = *index.entry(name.clone()).or_insert_with(|| {
            order.push((name, NodeCounts::default()));
            order.len() - 1
        });
        let counts = &mut order[slot].1;
        if record.orphan {
            counts.orphans += 1;
        } else {
            match record.class {
                BlockClass::Final => counts.finals += 1,
                BlockClass::Mini => counts.minis += 1,
            }
        }
    }
    order
}

fn likelihoods(groups: Vec<(String, NodeCounts)>) -> Vec<Likelihood> {
    let total: u64 = groups.iter().map(|(_, c)| c.total()).sum();
    groups
        .into_iter()
        .map(|(name, counts)| Likelihood {
            likelihood: crate::domain::format::percent(counts.total() as f64, total as f64),
            name,
            counts,
        })
        .collect()
}

impl MemoryNetwork {
    #[must_use]
    pub fn new(peer_id: u64) -> Self {
        Self {
            peer_id,
            state: RwLock::new(NetState {
                bounds: (16, 64),
                ..NetState::default()
            }),
            stopped: AtomicBool::new(false),
        }
    }

    /// A connected outgoing peer with sensible defaults.
    #[must_use]
    pub fn peer(address: &str, height: i64) -> PeerInfo {
        PeerInfo {
            address: address.to_string(),
            peer_id: 0,
            height,
            topo_height: height,
            latency: Duration::from_millis(50),
            direction: Direction::Outgoing,
            tag: String::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            whitelisted: false,
            trusted: false,
            connected: true,
            rejected_blocks: 0,
            relayed_blocks: 0,
        }
    }

    pub fn add_peer(&self, mut peer: PeerInfo) {
        let mut state = self.state.write();
        if let Some(ip) = peer_ip(&peer) {
            peer.trusted = state.trusted.contains(&ip);
        }
        state.peers.retain(|p| p.address != peer.address);
        state.peers.push(peer);
    }

    /// Move every connected peer to the given chain position.
    pub fn advance_peers(&self, height: i64, topo_height: i64) {
        for peer in self.state.write().peers.iter_mut().filter(|p| p.connected) {
            peer.height = height;
            peer.topo_height = topo_height;
        }
    }

    pub fn record(&self, record: ActivityRecord) {
        self.state.write().activity.push(record);
    }

    pub fn record_mined(&self, miner: &str, height: i64) {
        self.state.write().mined.push(MinedBlock {
            miner: miner.to_string(),
            height,
        });
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn is_banned(state: &NetState, ip: IpAddr, now: DateTime<Utc>) -> bool {
        state
            .bans
            .get(&ip)
            .is_some_and(|expires| expires.map_or(true, |at| at > now))
    }

    fn disconnect_ip(state: &mut NetState, ip: IpAddr) -> usize {
        let mut dropped = 0;
        for peer in state.peers.iter_mut().filter(|p| p.connected) {
            if peer_ip(peer) == Some(ip) {
                peer.connected = false;
                dropped += 1;
            }
        }
        dropped
    }

    fn window(&self, since: i64) -> Vec<ActivityRecord> {
        self.state
            .read()
            .activity
            .iter()
            .filter(|r| r.height >= since)
            .cloned()
            .collect()
    }
}

impl PeerNetwork for MemoryNetwork {
    fn peer_count(&self) -> u64 {
        self.state.read().peers.iter().filter(|p| p.connected).count() as u64
    }

    fn whitelisted_peer_count(&self) -> u64 {
        self.state
            .read()
            .peers
            .iter()
            .filter(|p| p.connected && p.whitelisted)
            .count() as u64
    }

    fn best_peer_height(&self) -> (i64, i64) {
        self.state
            .read()
            .peers
            .iter()
            .filter(|p| p.connected)
            .map(|p| (p.height, p.topo_height))
            .max()
            .unwrap_or((0, 0))
    }

    fn direction_counts(&self) -> (u64, u64) {
        let state = self.state.read();
        let connected = state.peers.iter().filter(|p| p.connected);
        connected.fold((0, 0), |(inc, out), p| match p.direction {
            Direction::Incoming => (inc + 1, out),
            Direction::Outgoing => (inc, out + 1),
        })
    }

    fn peers(&self) -> Vec<PeerInfo> {
        let mut peers = self.state.read().peers.clone();
        peers.sort_by_key(|p| !p.connected);
        peers
    }

    fn peer(&self, address: &str) -> Option<PeerInfo> {
        let ip = parse_ip(address).ok()?;
        self.state
            .read()
            .peers
            .iter()
            .find(|p| peer_ip(p) == Some(ip))
            .cloned()
    }

    fn connections(&self) -> Vec<ConnectionInfo> {
        self.state
            .read()
            .peers
            .iter()
            .filter(|p| p.connected)
            .map(|p| ConnectionInfo {
                address: p.address.clone(),
                peer_id: p.peer_id,
                direction: p.direction,
                height: p.height,
                topo_height: p.topo_height,
                latency: p.latency,
                tag: p.tag.clone(),
                state: "ACTIVE".into(),
            })
            .collect()
    }

    fn ban(&self, address: &str, duration: Duration) -> Result<()> {
        let ip = parse_ip(address)?;
        let expires = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d));
        let mut state = self.state.write();
        state.bans.insert(ip, Some(expires.unwrap_or(DateTime::<Utc>::MAX_UTC)));
        let dropped = Self::disconnect_ip(&mut state, ip);
        info!(%ip, secs = duration.as_secs(), dropped, "Peer banned");
        Ok(())
    }

    fn perm_ban(&self, address: &str) -> Result<()> {
        let ip = parse_ip(address)?;
        let mut state = self.state.write();
        state.bans.insert(ip, None);
        Self::disconnect_ip(&mut state, ip);
        info!(%ip, "Peer permanently banned");
        Ok(())
    }

    fn unban(&self, address: &str) -> Result<()> {
        let ip = parse_ip(address)?;
        if self.state.write().bans.remove(&ip).is_none() {
            return Err(Error::Network(format!("{ip} is not banned")));
        }
        info!(%ip, "Peer unbanned");
        Ok(())
    }

    fn bans(&self) -> Vec<BanEntry> {
        let now = Utc::now();
        let mut state = self.state.write();
        state.bans.retain(|_, expires| expires.map_or(true, |at| at > now));
        let mut entries: Vec<BanEntry> = state
            .bans
            .iter()
            .map(|(ip, expires)| BanEntry {
                address: ip.to_string(),
                expires_at: *expires,
            })
            .collect();
        entries.sort_by(|a, b| a.address.cmp(&b.address));
        entries
    }

    fn ban_above_height(&self, height: i64) -> usize {
        let targets: Vec<String> = self
            .state
            .read()
            .peers
            .iter()
            .filter(|p| p.height > height)
            .map(|p| p.address.clone())
            .collect();
        targets
            .iter()
            .filter(|address| self.ban(address, HEIGHT_BAN).is_ok())
            .count()
    }

    fn connect(&self, address: &str) -> Result<()> {
        let socket: SocketAddr = address
            .parse()
            .map_err(|_| Error::InvalidAddress(address.to_string()))?;
        let now = Utc::now();
        {
            let state = self.state.read();
            if Self::is_banned(&state, socket.ip(), now) {
                return Err(Error::Network(format!("{} is banned", socket.ip())));
            }
        }
        debug!(%socket, "Connecting to peer");
        self.add_peer(Self::peer(&socket.to_string(), 0));
        Ok(())
    }

    fn disconnect(&self, address: &str) -> Result<()> {
        let ip = parse_ip(address)?;
        if Self::disconnect_ip(&mut self.state.write(), ip) == 0 {
            return Err(Error::Network(format!("not connected to {ip}")));
        }
        Ok(())
    }

    fn add_trusted(&self, address: &str) -> Result<()> {
        let ip = parse_ip(address)?;
        let mut state = self.state.write();
        state.trusted.insert(ip);
        for peer in state.peers.iter_mut() {
            if peer_ip(peer) == Some(ip) {
                peer.trusted = true;
            }
        }
        Ok(())
    }

    fn remove_trusted(&self, address: &str) -> Result<()> {
        let ip = parse_ip(address)?;
        let mut state = self.state.write();
        if !state.trusted.remove(&ip) {
            return Err(Error::Network(format!("{ip} is not trusted")));
        }
        for peer in state.peers.iter_mut() {
            if peer_ip(peer) == Some(ip) {
                peer.trusted = false;
            }
        }
        Ok(())
    }

    fn trusted(&self) -> Vec<String> {
        self.state
            .read()
            .trusted
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn drop_untrusted(&self) -> usize {
        let mut state = self.state.write();
        let mut dropped = 0;
        for peer in state.peers.iter_mut().filter(|p| p.connected && !p.trusted) {
            peer.connected = false;
            dropped += 1;
        }
        dropped
    }

    fn clear_peer_stats(&self, address: &str) -> Result<()> {
        let ip = parse_ip(address)?;
        let mut state = self.state.write();
        let mut cleared = 0;
        for peer in state.peers.iter_mut().filter(|p| peer_ip(p) == Some(ip)) {
            peer.relayed_blocks = 0;
            peer.rejected_blocks = 0;
            cleared += 1;
        }
        if cleared == 0 {
            return Err(Error::Network(format!("{ip} is not a known peer")));
        }
        debug!(%ip, "Peer block stats cleared");
        Ok(())
    }

    fn clear_all_peer_stats(&self) -> usize {
        let mut state = self.state.write();
        for peer in &mut state.peers {
            peer.relayed_blocks = 0;
            peer.rejected_blocks = 0;
        }
        state.peers.len()
    }

    fn node_tag(&self) -> String {
        self.state.read().node_tag.clone()
    }

    fn set_node_tag(&self, tag: &str) {
        self.state.write().node_tag = tag.to_string();
    }

    fn peer_id(&self) -> u64 {
        self.peer_id
    }

    fn peer_bounds(&self) -> (u32, u32) {
        self.state.read().bounds
    }

    fn set_peer_bounds(&self, min: u32, max: u32) {
        self.state.write().bounds = (min, max);
    }

    fn network_orphans_since(&self, height: i64) -> u64 {
        self.state
            .read()
            .activity
            .iter()
            .filter(|r| r.height >= height && r.orphan)
            .count() as u64
    }

    fn active_nodes(&self, since: i64) -> Vec<NodeActivity> {
        let window = self.window(since);
        group_by(window.iter(), |r| r.node.as_str())
            .into_iter()
            .map(|(node, counts)| NodeActivity { node, counts })
            .collect()
    }

    fn active_miners(&self, since: i64) -> Vec<MinerActivity> {
        let window = self.window(since);
        let mut order: Vec<MinerActivity> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for record in &window {
            let slot = *index.entry(record.miner.as_str()).or_insert_with(|| {
                order.push(MinerActivity {
                    miner: record.miner.clone(),
                    counts: MinerCounts::default(),
                });
                order.len() - 1
            });
            let counts = &mut order[slot].counts;
            match (record.class, record.orphan) {
                (BlockClass::Final, false) => counts.finals += 1,
                (BlockClass::Mini, false) => counts.minis += 1,
                (BlockClass::Final, true) => counts.ibo += 1,
                (BlockClass::Mini, true) => counts.mbo += 1,
            }
        }
        order
    }

    fn best_guess_miner_node(&self, since: i64, miner: &str) -> Option<Likelihood> {
        self.potential_miner_nodes(since, miner)
            .into_iter()
            .fold(None, |best: Option<Likelihood>, candidate| match best {
                Some(b) if b.likelihood >= candidate.likelihood => Some(b),
                _ => Some(candidate),
            })
    }

    fn potential_miner_nodes(&self, since: i64, miner: &str) -> Vec<Likelihood> {
        let window = self.window(since);
        likelihoods(group_by(
            window.iter().filter(|r| r.miner == miner),
            |r| r.node.as_str(),
        ))
    }

    fn potential_miners_on_node(&self, since: i64, node: &str) -> Vec<Likelihood> {
        let window = self.window(since);
        likelihoods(group_by(
            window.iter().filter(|r| r.node == node),
            |r| r.miner.as_str(),
        ))
    }

    fn potential_integrators(&self, since: i64, node: &str) -> Vec<Likelihood> {
        let window = self.window(since);
        likelihoods(group_by(
            window
                .iter()
                .filter(|r| r.node == node && r.class == BlockClass::Final),
            |r| r.miner.as_str(),
        ))
    }

    fn mined_blocks(&self) -> Vec<MinedBlock> {
        self.state.read().mined.clone()
    }

    fn shutdown(&self) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        for peer in self.state.write().peers.iter_mut() {
            peer.connected = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(height: i64, node: &str, miner: &str, class: BlockClass, orphan: bool) -> ActivityRecord {
        ActivityRecord {
            height,
            node: node.into(),
            miner: miner.into(),
            class,
            orphan,
        }
    }

    #[test]
    fn ban_disconnects_and_lists() {
        let net = MemoryNetwork::new(1);
        net.add_peer(MemoryNetwork::peer("10.0.0.5:18089", 10));
        net.ban("10.0.0.5", Duration::from_secs(60)).unwrap();

        assert_eq!(net.peer_count(), 0);
        let bans = net.bans();
        assert_eq!(bans.len(), 1);
        assert_eq!(bans[0].address, "10.0.0.5");
    }

    #[test]
    fn unban_unknown_address_fails() {
        let net = MemoryNetwork::new(1);
        assert!(matches!(net.unban("10.0.0.9"), Err(Error::Network(_))));
        assert!(matches!(net.unban("nonsense"), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn banned_peer_cannot_connect() {
        let net = MemoryNetwork::new(1);
        net.perm_ban("10.0.0.7").unwrap();
        assert!(net.connect("10.0.0.7:18089").is_err());
        assert!(net.connect("10.0.0.8:18089").is_ok());
        assert_eq!(net.peer_count(), 1);
    }

    #[test]
    fn ban_above_height_targets_tall_peers() {
        let net = MemoryNetwork::new(1);
        net.add_peer(MemoryNetwork::peer("10.0.0.1:1", 100));
        net.add_peer(MemoryNetwork::peer("10.0.0.2:1", 500));
        assert_eq!(net.ban_above_height(200), 1);
        assert_eq!(net.bans()[0].address, "10.0.0.2");
    }

    #[test]
    fn drop_untrusted_keeps_trusted_peers() {
        let net = MemoryNetwork::new(1);
        net.add_trusted("10.0.0.1").unwrap();
        net.add_peer(MemoryNetwork::peer("10.0.0.1:1", 1));
        net.add_peer(MemoryNetwork::peer("10.0.0.2:1", 1));
        assert_eq!(net.drop_untrusted(), 1);
        assert_eq!(net.peer_count(), 1);
    }

    #[test]
    fn clearing_stats_resets_block_counters() {
        let net = MemoryNetwork::new(1);
        for address in ["10.0.0.1:1", "10.0.0.2:1"] {
            let mut peer = MemoryNetwork::peer(address, 1);
            peer.relayed_blocks = 40;
            peer.rejected_blocks = 4;
            net.add_peer(peer);
        }

        net.clear_peer_stats("10.0.0.1").unwrap();
        assert_eq!(net.peer("10.0.0.1").unwrap().relayed_blocks, 0);
        assert_eq!(net.peer("10.0.0.2").unwrap().rejected_blocks, 4);
        assert!(matches!(net.clear_peer_stats("10.0.0.9"), Err(Error::Network(_))));

        assert_eq!(net.clear_all_peer_stats(), 2);
        assert!(net.peers().iter().all(|p| p.relayed_blocks == 0 && p.rejected_blocks == 0));
    }

    #[test]
    fn activity_is_windowed_and_grouped_in_order() {
        let net = MemoryNetwork::new(1);
        net.record(record(5, "old", "m0", BlockClass::Final, false));
        net.record(record(10, "n1", "m1", BlockClass::Final, false));
        net.record(record(11, "n2", "m1", BlockClass::Mini, false));
        net.record(record(12, "n1", "m2", BlockClass::Mini, true));

        let nodes = net.active_nodes(10);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].node, "n1");
        assert_eq!(nodes[0].counts, NodeCounts { finals: 1, minis: 0, orphans: 1 });

        let miners = net.active_miners(10);
        assert_eq!(miners[1].counts.mbo, 1);
        assert_eq!(net.network_orphans_since(10), 1);
    }

    #[test]
    fn best_guess_picks_most_frequent_node() {
        let net = MemoryNetwork::new(1);
        net.record(record(1, "a", "m", BlockClass::Mini, false));
        net.record(record(2, "b", "m", BlockClass::Mini, false));
        net.record(record(3, "b", "m", BlockClass::Final, false));

        let guess = net.best_guess_miner_node(0, "m").unwrap();
        assert_eq!(guess.name, "b");
        assert!((guess.likelihood - 200.0 / 3.0).abs() < 1e-9);
    }
}
