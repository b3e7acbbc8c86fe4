//! Node status, running configuration and log verbosity.

use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use owo_colors::OwoColorize;
use tabled::Tabled;
use tracing::info;

use super::super::command::{parse_arg, Arity, CommandHandler, CommandOutcome};
use super::super::output;
use crate::application::config::RunningConfig;
use crate::application::context::NodeContext;
use crate::application::diagnostics::spawn_diagnostics;
use crate::domain::format;
use crate::error::CommandError;
use crate::port::outbound::MAX_LOG_LEVEL;

fn uptime(ctx: &NodeContext) -> Duration {
    (Utc::now() - ctx.counters.started_at())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Blocks minted per hour and per day since start, never above the total.
#[must_use]
pub fn mining_velocity(minted: u64, uptime: Duration) -> (f64, f64) {
    let secs = uptime.as_secs_f64();
    if secs <= 0.0 {
        return (0.0, 0.0);
    }
    let cap = minted as f64;
    let rate = cap / secs;
    ((rate * 3600.0).min(cap), (rate * 86400.0).min(cap))
}

/// Colour for the network orphan rate: green below 1.5%, yellow below 3%.
#[must_use]
pub fn network_orphan_rate(loss: f64) -> String {
    let text = output::pct(loss);
    if loss < 1.5 {
        text.green().to_string()
    } else if loss < 3.0 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

/// Colour for this node's own orphan rate relative to the network.
#[must_use]
pub fn own_orphan_rate(rate: f64, network_loss: f64) -> String {
    let text = output::pct(rate);
    if rate <= 1.0 {
        text.green().to_string()
    } else if rate < network_loss {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

// ----------------------------------------------------------------------------
// status / uptime / version
// ----------------------------------------------------------------------------

pub struct Status;

impl CommandHandler for Status {
    fn name(&self) -> &'static str {
        "status"
    }

    fn usage(&self) -> &'static str {
        "status"
    }

    fn summary(&self) -> &'static str {
        "Show general node, network and mining information"
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
        let snapshot = ctx.snapshot.load();
        let height = ctx.chain.height();
        let topo = ctx.chain.topo_height();
        let (best_height, best_topo) = ctx.network.best_peer_height();
        let (incoming, outgoing) = ctx.network.direction_counts();
        let (min_peers, max_peers) = ctx.network.peer_bounds();
        let uptime = uptime(ctx);
        let since_start = height - ctx.counters.chain_start_height();

        output::section(out, format!("DAGD {} node status", ctx.env.network))?;
        output::field(out, "Hostname", &ctx.env.hostname)?;
        output::field(out, "Uptime", format::duration(uptime))?;
        output::field(out, "Blocks since start", since_start.max(0))?;
        output::field(out, "Height / Topo height", format!("{height} / {topo}"))?;
        output::field(out, "Best peer height", format!("{best_height} / {best_topo}"))?;
        output::field(out, "Network hashrate", format::hashrate(ctx.chain.network_hashrate()))?;
        output::field(
            out,
            "Peers",
            format!(
                "{} (incoming {incoming}, outgoing {outgoing}, whitelisted {}, bounds {min_peers}-{max_peers})",
                ctx.network.peer_count(),
                ctx.network.whitelisted_peer_count()
            ),
        )?;
        output::field(
            out,
            "Pools",
            format!("mempool {} regpool {}", ctx.mempool.len(), ctx.regpool.len()),
        )?;
        for tip in ctx.chain.tips() {
            output::field(out, "Tip", tip)?;
        }
        output::field(
            out,
            "Pruned",
            ctx.chain
                .pruned_topo()
                .map_or_else(|| "no".to_string(), |t| format!("at topo height {t}")),
        )?;
        let integrator = ctx.chain.integrator_address();
        output::field(
            out,
            "Integrator address",
            if integrator.is_empty() { "-".to_string() } else { integrator },
        )?;
        output::field(out, "Pop count", ctx.counters.pop_count())?;
        output::field(out, "Network orphan rate", network_orphan_rate(snapshot.network_loss_percent))?;
        writeln!(out)?;

        let counters = &ctx.counters;
        let minted = counters.minted();
        let own_orphans = counters.own_orphans();
        let (per_hour, per_day) = mining_velocity(minted, uptime);
        let own_rate = format::percent(own_orphans as f64, (minted + own_orphans) as f64);

        output::section(out, "Mining")?;
        output::field(out, "Connected miners", ctx.mining.miner_count())?;
        output::field(out, "Blocks minted", minted)?;
        output::field(out, "Velocity", format!("{per_hour:.2}/hour {per_day:.2}/day"))?;
        output::field(
            out,
            "Own orphan rate",
            own_orphan_rate(own_rate, snapshot.network_loss_percent),
        )?;
        writeln!(
            out,
            "IB:{} MB:{} IBO:{} MBO:{} MBR:{}",
            counters.blocks_accepted(),
            counters.minis_accepted(),
            output::alert_count(counters.orphan_blocks()),
            output::alert_count(counters.orphan_minis()),
            output::alert_count(counters.minis_rejected()),
        )?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct Uptime;

impl CommandHandler for Uptime {
    fn name(&self) -> &'static str {
        "uptime"
    }

    fn usage(&self) -> &'static str {
        "uptime"
    }

    fn summary(&self) -> &'static str {
        "Show how long the node has been running"
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
        let start_height = ctx.counters.chain_start_height();
        output::field(out, "Hostname", &ctx.env.hostname)?;
        output::field(out, "Uptime", format::duration(uptime(ctx)))?;
        output::field(
            out,
            "Blocks since start",
            (ctx.chain.height() - start_height).max(0),
        )?;
        output::field(out, "Started", ctx.counters.started_at().to_rfc3339())?;
        output::field(out, "Start block", start_height)?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct Version;

impl CommandHandler for Version {
    fn name(&self) -> &'static str {
        "version"
    }

    fn usage(&self) -> &'static str {
        "version"
    }

    fn summary(&self) -> &'static str {
        "Show the daemon version"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn execute(
        &self,
        _args: &[String],
        _ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        writeln!(
            out,
            "dagd {} {}/{}",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        )?;
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// config
// ----------------------------------------------------------------------------

/// Boolean options flipped by `config <key>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    WhitelistIncoming,
    P2pTurbo,
    VariableDispatch,
    OnlyTrusted,
    BlockTracking,
    TxTracking,
    TrackTagged,
    AntiCheat,
}

impl Toggle {
    fn slot(self, config: &mut RunningConfig) -> &mut bool {
        match self {
            Self::WhitelistIncoming => &mut config.whitelist_incoming,
            Self::P2pTurbo => &mut config.p2p_turbo,
            Self::VariableDispatch => &mut config.variable_dispatch,
            Self::OnlyTrusted => &mut config.only_trusted,
            Self::BlockTracking => &mut config.trace_blocks,
            Self::TxTracking => &mut config.trace_tx,
            Self::TrackTagged => &mut config.trace_tagged,
            Self::AntiCheat => &mut config.anti_cheat,
        }
    }
}

/// One parsed `config` change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    Operator(String),
    NodeTag(String),
    MinPeers(u32),
    MaxPeers(u32),
    Maintenance(String),
    NetworkStatsKeep(i64),
    BandwidthFactor(i64),
    JobDispatchMs(u64),
    PeerLogExpirySecs(u64),
    DiagnosticDelaySecs(u64),
    BlockRejectThreshold(u64),
    PeerLatencyThresholdMs(u64),
    Toggle(Toggle),
}

const CONFIG_USAGE: &str = "config [key] [value]";

fn positive<T: std::str::FromStr + PartialOrd + Default>(args: &[String]) -> Result<T, CommandError> {
    match args {
        [value] => {
            let parsed: T = parse_arg(value, CONFIG_USAGE)?;
            if parsed > T::default() {
                Ok(parsed)
            } else {
                Err(CommandError::Usage(CONFIG_USAGE))
            }
        }
        _ => Err(CommandError::Usage(CONFIG_USAGE)),
    }
}

fn number<T: std::str::FromStr>(args: &[String]) -> Result<T, CommandError> {
    match args {
        [value] => parse_arg(value, CONFIG_USAGE),
        _ => Err(CommandError::Usage(CONFIG_USAGE)),
    }
}

fn text(args: &[String]) -> Result<String, CommandError> {
    if args.is_empty() {
        Err(CommandError::Usage(CONFIG_USAGE))
    } else {
        Ok(args.join(" "))
    }
}

fn toggle(args: &[String], which: Toggle) -> Result<ConfigChange, CommandError> {
    if args.is_empty() {
        Ok(ConfigChange::Toggle(which))
    } else {
        Err(CommandError::Usage(CONFIG_USAGE))
    }
}

/// Parse `config` arguments. `None` asks for the menu.
///
/// # Errors
/// [`CommandError::Usage`] for unknown keys or malformed values.
pub fn parse_config_change(args: &[String]) -> Result<Option<ConfigChange>, CommandError> {
    let Some((key, rest)) = args.split_first() else {
        return Ok(None);
    };
    let change = match key.as_str() {
        "operator" => ConfigChange::Operator(text(rest)?),
        "node_tag" => ConfigChange::NodeTag(text(rest)?),
        "min_peers" => ConfigChange::MinPeers(number(rest)?),
        "max_peers" => ConfigChange::MaxPeers(number(rest)?),
        "maintenance" => ConfigChange::Maintenance(rest.join(" ")),
        "network_stats_keep" => ConfigChange::NetworkStatsKeep(positive(rest)?),
        "p2p_bwfactor" => ConfigChange::BandwidthFactor(positive(rest)?),
        "job_dispatch_time" => ConfigChange::JobDispatchMs(positive(rest)?),
        "peer_log_expiry" => ConfigChange::PeerLogExpirySecs(number(rest)?),
        "diagnostic_delay" => ConfigChange::DiagnosticDelaySecs(number(rest)?),
        "block_reject_threshold" => ConfigChange::BlockRejectThreshold(number(rest)?),
        "peer_latency_threshold" => ConfigChange::PeerLatencyThresholdMs(positive(rest)?),
        "whitelist_incoming" => toggle(rest, Toggle::WhitelistIncoming)?,
        "p2p_turbo" => toggle(rest, Toggle::P2pTurbo)?,
        "variable_dispatch" => toggle(rest, Toggle::VariableDispatch)?,
        "trusted" => toggle(rest, Toggle::OnlyTrusted)?,
        "block_tracking" => toggle(rest, Toggle::BlockTracking)?,
        "tx_tracking" => toggle(rest, Toggle::TxTracking)?,
        "track_tagged" => toggle(rest, Toggle::TrackTagged)?,
        "anti_cheat" => toggle(rest, Toggle::AntiCheat)?,
        _ => return Err(CommandError::Usage(CONFIG_USAGE)),
    };
    Ok(Some(change))
}

/// Apply a change to the running configuration and the collaborators that
/// mirror it. Returns a line describing the result.
pub fn apply_config_change(ctx: &NodeContext, change: ConfigChange) -> String {
    match change {
        ConfigChange::Operator(name) => {
            ctx.config.update(|c| c.operator_name = name.clone());
            format!("operator name set to {name}")
        }
        ConfigChange::NodeTag(tag) => {
            ctx.config.update(|c| c.node_tag = tag.clone());
            ctx.network.set_node_tag(&tag);
            format!("node tag set to {tag}")
        }
        ConfigChange::MinPeers(min) => {
            let (min, max) = ctx.config.update(|c| {
                c.set_min_peers(min);
                (c.min_peers, c.max_peers)
            });
            ctx.network.set_peer_bounds(min, max);
            format!("peer bounds now {min}-{max}")
        }
        ConfigChange::MaxPeers(max) => {
            let (min, max) = ctx.config.update(|c| {
                c.set_max_peers(max);
                (c.min_peers, c.max_peers)
            });
            ctx.network.set_peer_bounds(min, max);
            format!("peer bounds now {min}-{max}")
        }
        ConfigChange::Maintenance(message) => {
            ctx.config.update(|c| c.maintenance_message = message.clone());
            ctx.config.start_maintenance(Utc::now());
            format!(
                "maintenance announced for {}",
                format::duration(crate::application::config::MAINTENANCE_WINDOW)
            )
        }
        ConfigChange::NetworkStatsKeep(keep) => {
            ctx.config.update(|c| c.network_stats_keep = keep);
            format!("network stats window set to {keep} blocks")
        }
        ConfigChange::BandwidthFactor(factor) => {
            ctx.config.update(|c| c.p2p_bw_factor = factor);
            format!("p2p bandwidth factor set to {factor}")
        }
        ConfigChange::JobDispatchMs(ms) => {
            ctx.config.update(|c| c.job_dispatch_ms = ms);
            ctx.mining.set_job_dispatch_delay(Duration::from_millis(ms));
            format!("job dispatch time set to {ms}ms")
        }
        ConfigChange::PeerLogExpirySecs(secs) => {
            ctx.config.update(|c| c.peer_log_expiry_secs = secs);
            format!("peer log expiry set to {secs}s")
        }
        ConfigChange::DiagnosticDelaySecs(secs) => {
            ctx.config.update(|c| c.diagnostic_delay_secs = secs);
            if secs == 0 {
                "scheduled diagnostics disabled".to_string()
            } else {
                format!("diagnostics every {secs}s")
            }
        }
        ConfigChange::BlockRejectThreshold(pct) => {
            ctx.config.update(|c| c.block_reject_threshold = pct);
            format!("block reject threshold set to {pct}%")
        }
        ConfigChange::PeerLatencyThresholdMs(ms) => {
            ctx.config.update(|c| c.peer_latency_threshold_ms = ms);
            format!("peer latency threshold set to {ms}ms")
        }
        ConfigChange::Toggle(which) => {
            let enabled = ctx.config.update(|c| {
                let slot = which.slot(c);
                *slot = !*slot;
                *slot
            });
            let mut line = format!("{which:?} {}", if enabled { "enabled" } else { "disabled" });
            if which == Toggle::OnlyTrusted && enabled {
                let dropped = ctx.network.drop_untrusted();
                line.push_str(&format!(", {dropped} untrusted peer(s) disconnected"));
            }
            line
        }
    }
}

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Option")]
    option: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "How to change")]
    how: &'static str,
}

fn on_off(value: bool) -> String {
    if value { "on" } else { "off" }.to_string()
}

fn config_menu(config: &RunningConfig) -> Vec<ConfigRow> {
    let row = |option, value, how| ConfigRow { option, value, how };
    vec![
        row("Operator Name", config.operator_name.clone(), "config operator <name>"),
        row("Node Tag", config.node_tag.clone(), "config node_tag <tag>"),
        row("Min Peers", config.min_peers.to_string(), "config min_peers <n>"),
        row("Max Peers", config.max_peers.to_string(), "config max_peers <n>"),
        row("Whitelist Incoming", on_off(config.whitelist_incoming), "config whitelist_incoming"),
        row("Trusted Only Mode", on_off(config.only_trusted), "config trusted"),
        row("P2P Turbo", on_off(config.p2p_turbo), "config p2p_turbo"),
        row("P2P Bandwidth Factor", config.p2p_bw_factor.to_string(), "config p2p_bwfactor <n>"),
        row("Network Stats Window", config.network_stats_keep.to_string(), "config network_stats_keep <n>"),
        row("Peer Log Expiry (s)", config.peer_log_expiry_secs.to_string(), "config peer_log_expiry <s>"),
        row("Job Dispatch Time (ms)", config.job_dispatch_ms.to_string(), "config job_dispatch_time <ms>"),
        row("Variable Dispatch", on_off(config.variable_dispatch), "config variable_dispatch"),
        row("Block Tracking", on_off(config.trace_blocks), "config block_tracking"),
        row("TX Tracking", on_off(config.trace_tx), "config tx_tracking"),
        row("Track Tagged Peers", on_off(config.trace_tagged), "config track_tagged"),
        row("Anti Cheat", on_off(config.anti_cheat), "config anti_cheat"),
        row("Diagnostic Delay (s)", config.diagnostic_delay_secs.to_string(), "config diagnostic_delay <s>"),
        row("Block Reject Threshold (%)", config.block_reject_threshold.to_string(), "config block_reject_threshold <n>"),
        row("Peer Latency Threshold (ms)", config.peer_latency_threshold_ms.to_string(), "config peer_latency_threshold <ms>"),
        row("Maintenance Message", config.maintenance_message.clone(), "config maintenance [message]"),
    ]
}

pub struct Config;

impl CommandHandler for Config {
    fn name(&self) -> &'static str {
        "config"
    }

    fn usage(&self) -> &'static str {
        CONFIG_USAGE
    }

    fn summary(&self) -> &'static str {
        "Show or change the running configuration"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(0)
    }

    /// Only a change is refused during shutdown; the menu stays readable.
    fn mutating(&self, args: &[String]) -> bool {
        !args.is_empty()
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        parse_config_change(args).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        match parse_config_change(args)? {
            None => {
                output::section(out, "Running Configuration")?;
                output::table(out, config_menu(&ctx.config.snapshot()))?;
            }
            Some(change) => {
                info!(change = ?change, "Running config changed");
                let line = apply_config_change(ctx, change);
                output::success(out, line)?;
            }
        }
        Ok(CommandOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// debug / run_diagnostics
// ----------------------------------------------------------------------------

pub struct DebugLevel;

impl DebugLevel {
    fn target(&self, args: &[String], current: u8) -> Result<u8, CommandError> {
        match args.first() {
            Some(level) => match parse_arg::<u8>(level, self.usage())? {
                level @ 0..=MAX_LOG_LEVEL => Ok(level),
                _ => Err(CommandError::Usage(self.usage())),
            },
            None if current > 0 => Ok(0),
            None => Ok(1),
        }
    }
}

impl CommandHandler for DebugLevel {
    fn name(&self) -> &'static str {
        "debug"
    }

    fn usage(&self) -> &'static str {
        "debug [level]"
    }

    fn summary(&self) -> &'static str {
        "Toggle debug logging or set the log level"
    }

    fn arity(&self) -> Arity {
        Arity::Between(0, 1)
    }

    fn mutating(&self, _args: &[String]) -> bool {
        true
    }

    fn validate(&self, args: &[String]) -> Result<(), CommandError> {
        self.target(args, 0).map(|_| ())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let level = self.target(args, ctx.log.level())?;
        ctx.log.set_level(level)?;
        ctx.config.update(|c| c.log_level = level);
        info!(level, "Log level changed");
        output::success(out, format!("log level set to {level}"))?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct RunDiagnostics;

impl CommandHandler for RunDiagnostics {
    fn name(&self) -> &'static str {
        "run_diagnostics"
    }

    fn usage(&self) -> &'static str {
        "run_diagnostics"
    }

    fn summary(&self) -> &'static str {
        "Check peer latency and block transmission in the background"
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
        if !spawn_diagnostics(ctx) {
            return Err(CommandError::Rejected("diagnostics already running".into()));
        }
        output::success(out, "diagnostics started, results go to the log")?;
        Ok(CommandOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn velocity_is_capped_at_total() {
        let (hour, day) = mining_velocity(3, Duration::from_secs(60));
        assert!((hour - 3.0).abs() < f64::EPSILON);
        assert!((day - 3.0).abs() < f64::EPSILON);

        let (hour, _) = mining_velocity(10, Duration::from_secs(36_000));
        assert!((hour - 1.0).abs() < 1e-9);
        assert_eq!(mining_velocity(5, Duration::ZERO), (0.0, 0.0));
    }

    #[test]
    fn config_without_args_is_menu() {
        assert_eq!(parse_config_change(&[]).unwrap(), None);
    }

    #[test]
    fn config_parses_known_keys() {
        assert_eq!(
            parse_config_change(&args(&["node_tag", "east", "rack"])).unwrap(),
            Some(ConfigChange::NodeTag("east rack".into()))
        );
        assert_eq!(
            parse_config_change(&args(&["min_peers", "20"])).unwrap(),
            Some(ConfigChange::MinPeers(20))
        );
        assert_eq!(
            parse_config_change(&args(&["trusted"])).unwrap(),
            Some(ConfigChange::Toggle(Toggle::OnlyTrusted))
        );
        assert_eq!(
            parse_config_change(&args(&["maintenance"])).unwrap(),
            Some(ConfigChange::Maintenance(String::new()))
        );
    }

    #[test]
    fn config_rejects_bad_values() {
        for bad in [
            &["nonsense"][..],
            &["min_peers"],
            &["min_peers", "x"],
            &["network_stats_keep", "0"],
            &["job_dispatch_time", "-5"],
            &["p2p_turbo", "yes"],
            &["operator"],
        ] {
            assert!(
                matches!(parse_config_change(&args(bad)), Err(CommandError::Usage(CONFIG_USAGE))),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn debug_toggles_without_argument() {
        assert_eq!(DebugLevel.target(&[], 0).unwrap(), 1);
        assert_eq!(DebugLevel.target(&[], 2).unwrap(), 0);
        assert_eq!(DebugLevel.target(&args(&["3"]), 0).unwrap(), 3);
        assert!(matches!(
            DebugLevel.target(&args(&["loud"]), 0),
            Err(CommandError::Usage("debug [level]"))
        ));
    }

    #[test]
    fn debug_level_shares_the_startup_bound() {
        assert_eq!(DebugLevel.target(&args(&["127"]), 0).unwrap(), MAX_LOG_LEVEL);
        for bad in ["128", "255"] {
            assert!(
                matches!(DebugLevel.target(&args(&[bad]), 0), Err(CommandError::Usage(_))),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn config_menu_is_not_a_change() {
        assert!(!Config.mutating(&[]));
        assert!(Config.mutating(&args(&["min_peers", "20"])));
    }

    #[test]
    fn orphan_rate_colours() {
        const GREEN: &str = "\x1b[32m";
        const YELLOW: &str = "\x1b[33m";
        const RED: &str = "\x1b[31m";

        assert!(network_orphan_rate(1.0).contains("1.00%"));
        assert!(network_orphan_rate(1.0).contains(GREEN));
        assert!(network_orphan_rate(2.0).contains(YELLOW));
        assert!(network_orphan_rate(5.0).contains(RED));

        assert!(own_orphan_rate(0.5, 3.0).contains(GREEN));
        assert!(own_orphan_rate(2.0, 3.0).contains(YELLOW));
        assert!(own_orphan_rate(4.0, 3.0).contains(RED));
    }
}
