//! Peer, connection, ban and trust commands.

use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use owo_colors::OwoColorize;
use tabled::Tabled;
use tracing::{info, warn};

use super::super::command::{parse_arg, Arity, CommandHandler, CommandOutcome};
use super::super::output;
use super::window;
use crate::application::context::NodeContext;
use crate::application::statistics::order_likelihoods;
use crate::domain::format;
use crate::domain::Likelihood;
use crate::error::CommandError;

/// Ban length when `ban` is given no duration.
pub const DEFAULT_BAN: Duration = Duration::from_secs(600);

/// Rows `peer_list` prints when no count is given.
pub const DEFAULT_PEER_LIST: usize = 25;

/// Accept a bare IP or an `ip:port` pair.
fn parse_host(value: &str, usage: &'static str) -> Result<IpAddr, CommandError> {
    value
        .parse::<IpAddr>()
        .or_else(|_| value.parse::<SocketAddr>().map(|s| s.ip()))
        .map_err(|_| CommandError::Usage(usage))
}

// ----------------------------------------------------------------------------
// peer_list / syncinfo / peer_info
// ----------------------------------------------------------------------------

#[derive(Tabled)]
struct PeerRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Height")]
    height: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Dir")]
    direction: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Success")]
    success: String,
}

pub struct PeerList;

impl CommandHandler for PeerList {
    fn name(&self) -> &'static str {
        "peer_list"
    }

    fn usage(&self) -> &'static str {
        "peer_list [count]"
    }

    fn summary(&self) -> &'static str {
        "Print known peers, connected first"
    }

    fn arity(&self) -> Arity {
        Arity::Between(0, 1)
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        match args.first() {
            Some(count) => parse_arg::<usize>(count, self.usage()).map(|_| ()),
            None => Ok(()),
        }
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let peers = ctx.network.peers();
        let limit = match args.first() {
            Some(count) => parse_arg(count, self.usage())?,
            None => DEFAULT_PEER_LIST,
        };
        let total = peers.len();

        let rows: Vec<PeerRow> = peers
            .into_iter()
            .take(limit)
            .map(|p| {
                let mut state = if p.connected { "connected" } else { "known" }.to_string();
                if p.whitelisted {
                    state.push_str(" wl");
                }
                if p.trusted {
                    state.push_str(" trusted");
                }
                PeerRow {
                    success: output::pct(p.transmission_success()),
                    address: p.address,
                    id: p.peer_id,
                    height: format!("{}/{}", p.height, p.topo_height),
                    latency: format!("{}ms", p.latency.as_millis()),
                    direction: p.direction.to_string(),
                    state,
                    tag: p.tag,
                    version: p.version,
                }
            })
            .collect();

        output::section(out, format!("Peer List - showing {}/{total}", rows.len()))?;
        output::table(out, rows)?;
        Ok(CommandOutcome::Continue)
    }
}

#[derive(Tabled)]
struct ConnectionRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Dir")]
    direction: String,
    #[tabled(rename = "Height")]
    height: i64,
    #[tabled(rename = "Topo")]
    topo_height: i64,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Tag")]
    tag: String,
}

pub struct SyncInfo;

impl CommandHandler for SyncInfo {
    fn name(&self) -> &'static str {
        "syncinfo"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["sync_info"]
    }

    fn usage(&self) -> &'static str {
        "syncinfo"
    }

    fn summary(&self) -> &'static str {
        "Print live connections and their sync state"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn execute(
        &self,
        _args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let rows: Vec<ConnectionRow> = ctx
            .network
            .connections()
            .into_iter()
            .map(|c| ConnectionRow {
                address: c.address,
                id: c.peer_id,
                direction: c.direction.to_string(),
                height: c.height,
                topo_height: c.topo_height,
                latency: format!("{}ms", c.latency.as_millis()),
                state: c.state,
                tag: c.tag,
            })
            .collect();
        let (incoming, outgoing) = ctx.network.direction_counts();

        output::section(out, "Connection info")?;
        output::table(out, rows)?;
        writeln!(
            out,
            "Our height {}/{}, incoming {incoming}, outgoing {outgoing}",
            ctx.chain.height(),
            ctx.chain.topo_height()
        )?;
        Ok(CommandOutcome::Continue)
    }
}

#[derive(Tabled)]
struct IntegratorRow {
    #[tabled(rename = "Miner Address")]
    miner: String,
    #[tabled(rename = "IB")]
    finals: u64,
    #[tabled(rename = "% of Total")]
    share: String,
}

#[derive(Tabled)]
struct NodeMinerRow {
    #[tabled(rename = "Miner Address")]
    miner: String,
    #[tabled(rename = "IB")]
    finals: u64,
    #[tabled(rename = "MB")]
    minis: u64,
    #[tabled(rename = "MBO")]
    orphans: String,
    #[tabled(rename = "% of Total")]
    share: String,
}

pub struct PeerInfoCommand;

impl CommandHandler for PeerInfoCommand {
    fn name(&self) -> &'static str {
        "peer_info"
    }

    fn usage(&self) -> &'static str {
        "peer_info <ip>"
    }

    fn summary(&self) -> &'static str {
        "Show one peer and the miners likely behind it"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_host(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let ip = parse_host(&args[0], self.usage())?.to_string();
        let window = window(ctx);
        let since = ctx.stats_window_start();

        match ctx.network.peer(&ip) {
            Some(peer) => {
                output::section(out, format!("Peer {}", peer.address))?;
                output::field(out, "Peer ID", peer.peer_id)?;
                output::field(out, "Height", format!("{}/{}", peer.height, peer.topo_height))?;
                output::field(out, "Latency", format!("{}ms", peer.latency.as_millis()))?;
                output::field(out, "Direction", peer.direction)?;
                output::field(out, "Tag", &peer.tag)?;
                output::field(out, "Version", &peer.version)?;
                output::field(out, "Connected", peer.connected)?;
                output::field(out, "Trusted", peer.trusted)?;
                output::field(
                    out,
                    "Blocks relayed/rejected",
                    format!("{}/{}", peer.relayed_blocks, peer.rejected_blocks),
                )?;
                output::field(out, "Transmission success", output::pct(peer.transmission_success()))?;
                writeln!(out)?;
            }
            None => writeln!(out, "{ip} is not a known peer, showing network activity only\n")?,
        }

        let integrators: Vec<IntegratorRow> =
            order_likelihoods(ctx.network.potential_integrators(since, &ip))
                .into_iter()
                .map(|l: Likelihood| IntegratorRow {
                    miner: l.name,
                    finals: l.counts.finals,
                    share: output::pct(l.likelihood),
                })
                .collect();
        output::section(out, format!("Potential Integrators - {window}"))?;
        output::table(out, integrators)?;
        writeln!(out)?;

        let miners: Vec<NodeMinerRow> =
            order_likelihoods(ctx.network.potential_miners_on_node(since, &ip))
                .into_iter()
                .map(|l| NodeMinerRow {
                    miner: l.name,
                    finals: l.counts.finals,
                    minis: l.counts.minis,
                    orphans: output::alert_count(l.counts.orphans),
                    share: output::pct(l.likelihood),
                })
                .collect();
        output::section(out, format!("Potential Miners - {window}"))?;
        output::table(out, miners)?;
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// Bans
// ----------------------------------------------------------------------------

pub struct Ban;

impl Ban {
    fn parse(&self, args: &[String]) -> Result<(IpAddr, Duration), CommandError> {
        let ip = parse_host(&args[0], self.usage())?;
        let duration = match args.get(1) {
            Some(secs) => Duration::from_secs(parse_arg(secs, self.usage())?),
            None => DEFAULT_BAN,
        };
        Ok((ip, duration))
    }
}

impl CommandHandler for Ban {
    fn name(&self) -> &'static str {
        "ban"
    }

    fn usage(&self) -> &'static str {
        "ban <ip> [seconds]"
    }

    fn summary(&self) -> &'static str {
        "Ban an IP from connecting (default 600 seconds)"
    }

    fn arity(&self) -> Arity {
        Arity::Between(1, 2)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        self.parse(args).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let (ip, duration) = self.parse(args)?;
        ctx.network.ban(&ip.to_string(), duration)?;
        output::success(out, format!("{ip} banned for {}", format::duration(duration)))?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct PermBan;

impl CommandHandler for PermBan {
    fn name(&self) -> &'static str {
        "permban"
    }

    fn usage(&self) -> &'static str {
        "permban <ip>"
    }

    fn summary(&self) -> &'static str {
        "Ban an IP permanently"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_host(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let ip = parse_host(&args[0], self.usage())?;
        ctx.network.perm_ban(&ip.to_string())?;
        output::success(out, format!("{ip} banned permanently"))?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct Unban;

impl CommandHandler for Unban {
    fn name(&self) -> &'static str {
        "unban"
    }

    fn usage(&self) -> &'static str {
        "unban <ip>"
    }

    fn summary(&self) -> &'static str {
        "Lift a ban"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_host(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let ip = parse_host(&args[0], self.usage())?;
        ctx.network.unban(&ip.to_string())?;
        output::success(out, format!("unban {ip} successful"))?;
        Ok(CommandOutcome::Continue)
    }
}

#[derive(Tabled)]
struct BanRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
}

pub struct Bans;

impl CommandHandler for Bans {
    fn name(&self) -> &'static str {
        "bans"
    }

    fn usage(&self) -> &'static str {
        "bans"
    }

    fn summary(&self) -> &'static str {
        "Print the active ban list"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn execute(
        &self,
        _args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let now = Utc::now();
        let rows: Vec<BanRow> = ctx
            .network
            .bans()
            .into_iter()
            .filter(|b| !b.is_expired(now))
            .map(|b| BanRow {
                remaining: b
                    .remaining(now)
                    .map_or_else(|| "permanent".to_string(), format::duration),
                address: b.address,
            })
            .collect();

        if rows.is_empty() {
            writeln!(out, "ban list is empty")?;
        } else {
            output::section(out, format!("Ban List ({})", rows.len()))?;
            output::table(out, rows)?;
        }
        Ok(CommandOutcome::Continue)
    }
}

pub struct BanAboveHeight;

impl CommandHandler for BanAboveHeight {
    fn name(&self) -> &'static str {
        "ban_above_height"
    }

    fn usage(&self) -> &'static str {
        "ban_above_height <height>"
    }

    fn summary(&self) -> &'static str {
        "Ban every peer claiming a height above the given one"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_arg::<i64>(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let height: i64 = parse_arg(&args[0], self.usage())?;
        let banned = ctx.network.ban_above_height(height);
        info!(height, banned, "Banned peers above height");
        output::success(out, format!("{banned} peer(s) above height {height} banned"))?;
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// Connections
// ----------------------------------------------------------------------------

pub struct ConnectToPeer;

impl CommandHandler for ConnectToPeer {
    fn name(&self) -> &'static str {
        "connect_to_peer"
    }

    fn usage(&self) -> &'static str {
        "connect_to_peer <ip:port>"
    }

    fn summary(&self) -> &'static str {
        "Open a connection to a peer"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_arg::<SocketAddr>(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let address: SocketAddr = parse_arg(&args[0], self.usage())?;
        ctx.network.connect(&address.to_string())?;
        output::success(out, format!("connecting to {address}"))?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct DisconnectPeer;

impl CommandHandler for DisconnectPeer {
    fn name(&self) -> &'static str {
        "disconnect_peer"
    }

    fn usage(&self) -> &'static str {
        "disconnect_peer <ip>"
    }

    fn summary(&self) -> &'static str {
        "Drop every connection to an IP"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_host(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        parse_host(&args[0], self.usage())?;
        ctx.network.disconnect(&args[0])?;
        output::success(out, format!("disconnected {}", args[0]))?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct ConnectToSeeds;

impl CommandHandler for ConnectToSeeds {
    fn name(&self) -> &'static str {
        "connect_to_seeds"
    }

    fn usage(&self) -> &'static str {
        "connect_to_seeds"
    }

    fn summary(&self) -> &'static str {
        "Dial every configured seed and priority node"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn execute(
        &self,
        _args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let seeds = &ctx.env.seed_nodes;
        if seeds.is_empty() {
            writeln!(out, "no seed nodes configured")?;
            return Ok(CommandOutcome::Continue);
        }

        for seed in seeds {
            let network = Arc::clone(&ctx.network);
            let seed = seed.clone();
            ctx.subsystems.spawn("seed_connect", async move {
                match network.connect(&seed) {
                    Ok(()) => info!(seed = %seed, "Connected to seed node"),
                    Err(e) => warn!(seed = %seed, error = %e, "Seed connection failed"),
                }
            });
        }
        output::success(out, format!("connecting to {} seed node(s)", seeds.len()))?;
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// Trust
// ----------------------------------------------------------------------------

pub struct AddTrusted;

impl CommandHandler for AddTrusted {
    fn name(&self) -> &'static str {
        "add_trusted"
    }

    fn usage(&self) -> &'static str {
        "add_trusted <ip>"
    }

    fn summary(&self) -> &'static str {
        "Mark a peer as trusted"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_host(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let ip = parse_host(&args[0], self.usage())?;
        ctx.network.add_trusted(&ip.to_string())?;
        output::success(out, format!("{ip} added to trusted peers"))?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct RemoveTrusted;

impl CommandHandler for RemoveTrusted {
    fn name(&self) -> &'static str {
        "remove_trusted"
    }

    fn usage(&self) -> &'static str {
        "remove_trusted <ip>"
    }

    fn summary(&self) -> &'static str {
        "Remove a peer from the trusted list"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_host(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let ip = parse_host(&args[0], self.usage())?;
        ctx.network.remove_trusted(&ip.to_string())?;
        output::success(out, format!("{ip} removed from trusted peers"))?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct ListTrusted;

impl CommandHandler for ListTrusted {
    fn name(&self) -> &'static str {
        "list_trusted"
    }

    fn usage(&self) -> &'static str {
        "list_trusted"
    }

    fn summary(&self) -> &'static str {
        "Print trusted peers"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn execute(
        &self,
        _args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let trusted = ctx.network.trusted();
        if trusted.is_empty() {
            writeln!(out, "no trusted peers")?;
            return Ok(CommandOutcome::Continue);
        }
        output::section(out, format!("Trusted Peers ({})", trusted.len()))?;
        for address in trusted {
            let state = if ctx.network.peer(&address).is_some_and(|p| p.connected) {
                "connected".green().to_string()
            } else {
                "not connected".dimmed().to_string()
            };
            writeln!(out, "  {address:<40} {state}")?;
        }
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// peer_errors / clear_peer_stats / clear_all_peer_stats / show_selfish
// ----------------------------------------------------------------------------

#[derive(Tabled)]
struct PeerErrorRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Relayed")]
    relayed: u64,
    #[tabled(rename = "Rejected")]
    rejected: u64,
    #[tabled(rename = "Success")]
    success: String,
}

pub struct PeerErrors;

impl CommandHandler for PeerErrors {
    fn name(&self) -> &'static str {
        "peer_errors"
    }

    fn usage(&self) -> &'static str {
        "peer_errors [ip]"
    }

    fn summary(&self) -> &'static str {
        "Print peers whose relayed blocks were rejected, or one peer's record"
    }

    fn arity(&self) -> Arity {
        Arity::Between(0, 1)
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        match args.first() {
            Some(host) => parse_host(host, self.usage()).map(|_| ()),
            None => Ok(()),
        }
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        if let Some(host) = args.first() {
            let ip = parse_host(host, self.usage())?;
            let peer = ctx
                .network
                .peer(&ip.to_string())
                .ok_or_else(|| CommandError::Rejected(format!("{ip} is not a known peer")))?;
            output::section(out, format!("Block Errors - {}", peer.address))?;
            output::field(out, "Relayed", peer.relayed_blocks)?;
            output::field(out, "Rejected", output::alert_count(peer.rejected_blocks))?;
            output::field(out, "Transmission success", output::pct(peer.transmission_success()))?;
            return Ok(CommandOutcome::Continue);
        }

        let mut failing: Vec<_> = ctx
            .network
            .peers()
            .into_iter()
            .filter(|p| p.rejected_blocks > 0)
            .collect();
        if failing.is_empty() {
            writeln!(out, "no peer errors recorded")?;
            return Ok(CommandOutcome::Continue);
        }
        failing.sort_by(|a, b| a.transmission_success().total_cmp(&b.transmission_success()));

        output::section(out, format!("Peer Errors ({})", failing.len()))?;
        let rows: Vec<PeerErrorRow> = failing
            .into_iter()
            .map(|p| PeerErrorRow {
                success: output::pct(p.transmission_success()),
                address: p.address,
                relayed: p.relayed_blocks,
                rejected: p.rejected_blocks,
            })
            .collect();
        output::table(out, rows)?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct ClearPeerStats;

impl CommandHandler for ClearPeerStats {
    fn name(&self) -> &'static str {
        "clear_peer_stats"
    }

    fn usage(&self) -> &'static str {
        "clear_peer_stats <ip>"
    }

    fn summary(&self) -> &'static str {
        "Reset one peer's relayed and rejected block counters"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_host(&args[0], self.usage()).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let ip = parse_host(&args[0], self.usage())?;
        ctx.network.clear_peer_stats(&ip.to_string())?;
        info!(%ip, "Peer block stats cleared");
        output::success(out, format!("block stats cleared for {ip}"))?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct ClearAllPeerStats;

impl CommandHandler for ClearAllPeerStats {
    fn name(&self) -> &'static str {
        "clear_all_peer_stats"
    }

    fn usage(&self) -> &'static str {
        "clear_all_peer_stats"
    }

    fn summary(&self) -> &'static str {
        "Reset block counters for every known peer"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn execute(
        &self,
        _args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let cleared = ctx.network.clear_all_peer_stats();
        info!(cleared, "All peer block stats cleared");
        output::success(out, format!("block stats cleared for {cleared} peer(s)"))?;
        Ok(CommandOutcome::Continue)
    }
}

#[derive(Tabled)]
struct SelfishRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Height")]
    height: String,
    #[tabled(rename = "Dir")]
    direction: String,
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Version")]
    version: String,
}

/// Connected peers that have never relayed a block to us.
pub struct ShowSelfish;

impl CommandHandler for ShowSelfish {
    fn name(&self) -> &'static str {
        "show_selfish"
    }

    fn usage(&self) -> &'static str {
        "show_selfish"
    }

    fn summary(&self) -> &'static str {
        "Print connected peers that never relayed a block"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn execute(
        &self,
        _args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let rows: Vec<SelfishRow> = ctx
            .network
            .peers()
            .into_iter()
            .filter(|p| p.connected && p.relayed_blocks == 0)
            .map(|p| SelfishRow {
                address: p.address,
                height: format!("{}/{}", p.height, p.topo_height),
                direction: p.direction.to_string(),
                tag: p.tag,
                version: p.version,
            })
            .collect();
        if rows.is_empty() {
            writeln!(out, "no selfish peers")?;
            return Ok(CommandOutcome::Continue);
        }
        output::section(out, format!("Selfish Peers ({})", rows.len()))?;
        output::table(out, rows)?;
        Ok(CommandOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ban_defaults_to_ten_minutes() {
        let (ip, duration) = Ban.parse(&["10.0.0.5".into()]).unwrap();
        assert_eq!(ip.to_string(), "10.0.0.5");
        assert_eq!(duration, DEFAULT_BAN);
    }

    #[test]
    fn ban_rejects_negative_or_text_duration() {
        assert!(matches!(
            Ban.parse(&["10.0.0.5".into(), "-5".into()]),
            Err(CommandError::Usage("ban <ip> [seconds]"))
        ));
        assert!(Ban.parse(&["10.0.0.5".into(), "soon".into()]).is_err());
        assert!(Ban.parse(&["not-an-ip".into()]).is_err());
    }

    #[test]
    fn host_accepts_socket_addresses() {
        assert_eq!(
            parse_host("10.0.0.5:18089", "u").unwrap().to_string(),
            "10.0.0.5"
        );
    }
}
