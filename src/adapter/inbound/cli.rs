//! Command-line interface definitions.
//!
//! Startup flags for the daemon. Validation and defaulting happen in
//! [`crate::infrastructure::config::Settings`].

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::port::outbound::MAX_LOG_LEVEL;

/// Console and monitoring daemon for a DAG block node
#[derive(Parser, Debug, Clone)]
#[command(name = "dagd")]
#[command(version)]
pub struct Cli {
    /// Join the test network instead of mainnet
    #[arg(long)]
    pub testnet: bool,

    /// Start with debug logging
    #[arg(long)]
    pub debug: bool,

    /// Console log verbosity, 0 info, 1 debug, 2 and above trace
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_LOG_LEVEL)))]
    pub clog_level: Option<u8>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Directory holding chain data and the running configuration
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Peer-to-peer listen address
    #[arg(long)]
    pub p2p_bind: Option<String>,

    /// JSON-RPC listen address
    #[arg(long)]
    pub rpc_bind: Option<String>,

    /// Work submission listen address
    #[arg(long)]
    pub getwork_bind: Option<String>,

    /// Connect only to these peers
    #[arg(long = "add-exclusive-node", value_name = "IP:PORT")]
    pub exclusive_nodes: Vec<String>,

    /// Always keep a connection to these peers
    #[arg(long = "add-priority-node", value_name = "IP:PORT")]
    pub priority_nodes: Vec<String>,

    /// Seed nodes used for peer discovery
    #[arg(long = "seed-node", value_name = "IP:PORT")]
    pub seed_nodes: Vec<String>,

    #[arg(long)]
    pub min_peers: Option<u32>,

    #[arg(long)]
    pub max_peers: Option<u32>,

    /// Tag announced to peers
    #[arg(long)]
    pub node_tag: Option<String>,

    /// Address credited with integrator rewards
    #[arg(long)]
    pub integrator_address: Option<String>,

    /// Prune history below this height at startup (must be above 1)
    #[arg(long)]
    pub prune_history: Option<i64>,

    /// Route peer traffic through a SOCKS proxy; disables the peer listener
    #[arg(long)]
    pub socks_proxy: Option<String>,

    /// Trust the local clock without NTP checks
    #[arg(long)]
    pub timeisinsync: bool,

    /// Bootstrap from a recent state instead of replaying history
    #[arg(long)]
    pub fastsync: bool,

    /// Run as a sync node that serves full history
    #[arg(long)]
    pub sync_node: bool,

    /// Blocks below the tip verified by the startup index check
    #[arg(long, default_value_t = 100)]
    pub startup_check_depth: i64,

    /// Seconds to wait for background tasks at exit before forcing it
    #[arg(long, default_value_t = 30)]
    pub drain_timeout_secs: u64,

    /// Seconds between blocks produced by the built-in devnet
    #[arg(long, default_value_t = 18)]
    pub block_time_secs: u64,
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_nodes_and_defaults() {
        let cli = Cli::try_parse_from([
            "dagd",
            "--testnet",
            "--seed-node",
            "10.0.0.1:40401",
            "--seed-node",
            "10.0.0.2:40401",
        ])
        .unwrap();
        assert!(cli.testnet);
        assert_eq!(cli.seed_nodes.len(), 2);
        assert_eq!(cli.startup_check_depth, 100);
        assert_eq!(cli.drain_timeout_secs, 30);
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn clog_level_is_bounded() {
        assert!(Cli::try_parse_from(["dagd", "--clog-level", "128"]).is_err());
        assert_eq!(
            Cli::try_parse_from(["dagd", "--clog-level", "2"]).unwrap().clog_level,
            Some(2)
        );
    }
}
