//! Validated startup settings.
//!
//! Built once from the command line and the environment; the mutable
//! running configuration lives in [`crate::application::config`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::adapter::inbound::cli::{Cli, LogFormat};
use crate::application::config::{RunningConfigStore, RUNNING_CONFIG_FILE};
use crate::application::context::{NetworkMode, NodeEnvironment};
use crate::error::{ConfigError, Result};

/// Overrides the running configuration's job dispatch delay, in milliseconds.
pub const JOB_DISPATCH_ENV: &str = "DAGD_JOB_DISPATCH_DELAY_MS";

const MAINNET_BINDS: Binds = Binds {
    p2p: "0.0.0.0:10101",
    rpc: "127.0.0.1:10102",
    getwork: "0.0.0.0:10100",
};

const TESTNET_BINDS: Binds = Binds {
    p2p: "0.0.0.0:40401",
    rpc: "127.0.0.1:40402",
    getwork: "0.0.0.0:10100",
};

/// Peer listener address used when traffic goes through a SOCKS proxy.
const NO_P2P_LISTENER: &str = "0.0.0.0:0";

struct Binds {
    p2p: &'static str,
    rpc: &'static str,
    getwork: &'static str,
}

const fn default_binds(network: NetworkMode) -> Binds {
    match network {
        NetworkMode::Mainnet => MAINNET_BINDS,
        NetworkMode::Testnet => TESTNET_BINDS,
    }
}

/// Everything startup needs, with defaults applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub network: NetworkMode,
    pub data_dir: PathBuf,
    pub p2p_bind: String,
    pub rpc_bind: String,
    pub getwork_bind: String,
    pub exclusive_nodes: Vec<String>,
    pub priority_nodes: Vec<String>,
    pub seed_nodes: Vec<String>,
    pub min_peers: Option<u32>,
    pub max_peers: Option<u32>,
    pub node_tag: Option<String>,
    pub integrator_address: Option<String>,
    pub prune_history: Option<i64>,
    pub socks_proxy: Option<String>,
    pub time_in_sync: bool,
    pub fastsync: bool,
    pub sync_node: bool,
    pub log_level: u8,
    pub log_format: LogFormat,
    pub startup_check_depth: i64,
    pub drain_timeout: Duration,
    pub block_time: Duration,
    pub job_dispatch_override: Option<Duration>,
    /// Raw `DAGD_JOB_DISPATCH_DELAY_MS` value that was not a positive integer.
    pub rejected_job_dispatch: Option<String>,
}

impl Settings {
    /// Apply defaults to the parsed flags, read the environment override
    /// and validate the result.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for any out-of-range flag.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let settings = Self::with_env_override(cli, std::env::var(JOB_DISPATCH_ENV).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Defaulting without validation or environment access.
    #[must_use]
    pub fn with_env_override(cli: Cli, job_dispatch: Option<String>) -> Self {
        let network = if cli.testnet {
            NetworkMode::Testnet
        } else {
            NetworkMode::Mainnet
        };
        let binds = default_binds(network);

        let p2p_bind = if cli.socks_proxy.is_some() {
            NO_P2P_LISTENER.to_string()
        } else {
            cli.p2p_bind.unwrap_or_else(|| binds.p2p.to_string())
        };

        let log_level = cli.clog_level.unwrap_or(u8::from(cli.debug));

        let job_dispatch_override = job_dispatch.as_deref().and_then(parse_job_dispatch);
        let rejected_job_dispatch = job_dispatch.filter(|_| job_dispatch_override.is_none());

        Self {
            network,
            data_dir: cli.data_dir.unwrap_or_else(|| default_data_dir(network)),
            p2p_bind,
            rpc_bind: cli.rpc_bind.unwrap_or_else(|| binds.rpc.to_string()),
            getwork_bind: cli.getwork_bind.unwrap_or_else(|| binds.getwork.to_string()),
            exclusive_nodes: cli.exclusive_nodes,
            priority_nodes: cli.priority_nodes,
            seed_nodes: cli.seed_nodes,
            min_peers: cli.min_peers,
            max_peers: cli.max_peers,
            node_tag: cli.node_tag,
            integrator_address: cli.integrator_address,
            prune_history: cli.prune_history,
            socks_proxy: cli.socks_proxy,
            time_in_sync: cli.timeisinsync,
            fastsync: cli.fastsync,
            sync_node: cli.sync_node,
            log_level,
            log_format: cli.log_format,
            startup_check_depth: cli.startup_check_depth,
            drain_timeout: Duration::from_secs(cli.drain_timeout_secs),
            block_time: Duration::from_secs(cli.block_time_secs),
            job_dispatch_override,
            rejected_job_dispatch,
        }
    }

    /// Validate the settings.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the offending flag.
    pub fn validate(&self) -> Result<()> {
        if let Some(height) = self.prune_history {
            if height <= 1 {
                return Err(ConfigError::InvalidValue {
                    field: "prune_history",
                    reason: format!("must be above 1, got {height}"),
                }
                .into());
            }
        }

        if let (Some(min), Some(max)) = (self.min_peers, self.max_peers) {
            if min > max {
                return Err(ConfigError::InvalidValue {
                    field: "min_peers",
                    reason: format!("must not exceed max_peers ({min} > {max})"),
                }
                .into());
            }
        }

        if self.drain_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "drain_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.block_time.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "block_time_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.startup_check_depth < 1 {
            return Err(ConfigError::InvalidValue {
                field: "startup_check_depth",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        if self
            .node_tag
            .as_deref()
            .is_some_and(|tag| tag.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "node_tag",
                reason: "cannot be empty".to_string(),
            }
            .into());
        }

        for (field, bind) in [
            ("p2p_bind", &self.p2p_bind),
            ("rpc_bind", &self.rpc_bind),
            ("getwork_bind", &self.getwork_bind),
        ] {
            if bind.parse::<SocketAddr>().is_err() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("`{bind}` is not an ip:port address"),
                }
                .into());
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn running_config_path(&self) -> PathBuf {
        self.data_dir.join(RUNNING_CONFIG_FILE)
    }

    /// Static facts handed to the console and renderer.
    #[must_use]
    pub fn environment(&self) -> NodeEnvironment {
        let mut env = NodeEnvironment::new(self.network, self.data_dir.clone());
        env.seed_nodes = self
            .seed_nodes
            .iter()
            .chain(&self.priority_nodes)
            .cloned()
            .collect();
        env
    }

    /// Push flag values that win over the persisted running configuration.
    pub fn apply_overrides(&self, store: &RunningConfigStore) {
        if self.min_peers.is_none()
            && self.max_peers.is_none()
            && self.node_tag.is_none()
            && self.job_dispatch_override.is_none()
        {
            return;
        }
        store.update(|config| {
            if let Some(max) = self.max_peers {
                config.set_max_peers(max);
            }
            if let Some(min) = self.min_peers {
                config.set_min_peers(min);
            }
            if let Some(tag) = &self.node_tag {
                config.node_tag = tag.trim().to_string();
            }
            if let Some(delay) = self.job_dispatch_override {
                config.job_dispatch_ms = delay.as_millis() as u64;
            }
        });
        debug!("Startup flags applied to running config");
    }

    /// Log the effective settings.
    pub fn log_summary(&self) {
        info!(
            network = %self.network,
            data_dir = %self.data_dir.display(),
            p2p = %self.p2p_bind,
            rpc = %self.rpc_bind,
            getwork = %self.getwork_bind,
            seeds = self.seed_nodes.len(),
            exclusive = self.exclusive_nodes.len(),
            priority = self.priority_nodes.len(),
            fastsync = self.fastsync,
            sync_node = self.sync_node,
            "Settings loaded"
        );
        if self.socks_proxy.is_some() {
            info!("SOCKS proxy configured, peer listener disabled");
        }
        if let Some(height) = self.prune_history {
            info!(height, "History pruning requested");
        }
        if let Some(raw) = &self.rejected_job_dispatch {
            warn!(
                variable = JOB_DISPATCH_ENV,
                value = %raw,
                "Ignoring job dispatch override, expected a positive number of milliseconds"
            );
        }
    }
}

/// `~/.dagd/mainnet` or `~/.dagd/testnet`.
#[must_use]
pub fn default_data_dir(network: NetworkMode) -> PathBuf {
    let leaf = if network.is_mainnet() {
        "mainnet"
    } else {
        "testnet"
    };
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dagd")
        .join(leaf)
}

/// Positive millisecond counts only.
fn parse_job_dispatch(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::application::config::RunningConfig;
    use crate::error::Error;

    fn settings(args: &[&str]) -> Settings {
        let mut argv = vec!["dagd"];
        argv.extend_from_slice(args);
        Settings::with_env_override(Cli::try_parse_from(argv).unwrap(), None)
    }

    fn invalid_field(settings: &Settings) -> &'static str {
        match settings.validate() {
            Err(Error::Config(ConfigError::InvalidValue { field, .. })) => field,
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn defaults_follow_network_mode() {
        let main = settings(&[]);
        assert_eq!(main.network, NetworkMode::Mainnet);
        assert_eq!(main.p2p_bind, "0.0.0.0:10101");
        assert_eq!(main.rpc_bind, "127.0.0.1:10102");
        assert!(main.data_dir.ends_with(".dagd/mainnet"));
        assert!(main.validate().is_ok());

        let test = settings(&["--testnet"]);
        assert_eq!(test.p2p_bind, "0.0.0.0:40401");
        assert_eq!(test.rpc_bind, "127.0.0.1:40402");
        assert_eq!(test.getwork_bind, "0.0.0.0:10100");
        assert!(test.data_dir.ends_with(".dagd/testnet"));
    }

    #[test]
    fn socks_proxy_disables_peer_listener() {
        let s = settings(&["--socks-proxy", "127.0.0.1:9050", "--p2p-bind", "0.0.0.0:7000"]);
        assert_eq!(s.p2p_bind, "0.0.0.0:0");
    }

    #[test]
    fn log_level_from_flags() {
        assert_eq!(settings(&[]).log_level, 0);
        assert_eq!(settings(&["--debug"]).log_level, 1);
        assert_eq!(settings(&["--debug", "--clog-level", "3"]).log_level, 3);
    }

    #[test]
    fn prune_height_must_be_above_one() {
        assert_eq!(invalid_field(&settings(&["--prune-history", "1"])), "prune_history");
        assert!(settings(&["--prune-history", "2"]).validate().is_ok());
    }

    #[test]
    fn peer_bounds_must_be_ordered() {
        let s = settings(&["--min-peers", "20", "--max-peers", "10"]);
        assert_eq!(invalid_field(&s), "min_peers");
    }

    #[test]
    fn zero_drain_timeout_rejected() {
        let s = settings(&["--drain-timeout-secs", "0"]);
        assert_eq!(invalid_field(&s), "drain_timeout_secs");
    }

    #[test]
    fn blank_node_tag_rejected() {
        let s = settings(&["--node-tag", "  "]);
        assert_eq!(invalid_field(&s), "node_tag");
    }

    #[test]
    fn malformed_bind_rejected() {
        let s = settings(&["--rpc-bind", "localhost"]);
        assert_eq!(invalid_field(&s), "rpc_bind");
    }

    #[test]
    fn job_dispatch_env_must_be_positive() {
        assert_eq!(parse_job_dispatch(" 250 "), Some(Duration::from_millis(250)));
        assert_eq!(parse_job_dispatch("0"), None);
        assert_eq!(parse_job_dispatch("fast"), None);
    }

    #[test]
    fn malformed_job_dispatch_env_is_kept_for_the_warning() {
        let cli = || Cli::try_parse_from(["dagd"]).unwrap();

        let s = Settings::with_env_override(cli(), Some("fast".into()));
        assert_eq!(s.job_dispatch_override, None);
        assert_eq!(s.rejected_job_dispatch.as_deref(), Some("fast"));

        let s = Settings::with_env_override(cli(), Some("300".into()));
        assert_eq!(s.job_dispatch_override, Some(Duration::from_millis(300)));
        assert_eq!(s.rejected_job_dispatch, None);

        assert_eq!(Settings::with_env_override(cli(), None).rejected_job_dispatch, None);
    }

    #[test]
    fn overrides_reach_running_config() {
        let cli = Cli::try_parse_from(["dagd", "--max-peers", "8", "--node-tag", "edge"]).unwrap();
        let s = Settings::with_env_override(cli, Some("120".into()));
        let store = RunningConfigStore::in_memory(RunningConfig::default());
        s.apply_overrides(&store);

        let config = store.snapshot();
        assert_eq!(config.max_peers, 8);
        assert_eq!(config.min_peers, 8);
        assert_eq!(config.node_tag, "edge");
        assert_eq!(config.job_dispatch_ms, 120);
    }

    #[test]
    fn environment_merges_seed_and_priority_nodes() {
        let s = settings(&[
            "--seed-node",
            "10.0.0.1:10101",
            "--add-priority-node",
            "10.0.0.2:10101",
        ]);
        assert_eq!(s.environment().seed_nodes, vec!["10.0.0.1:10101", "10.0.0.2:10101"]);
    }
}
