//! Mutable running configuration persisted next to the chain data.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// File name of the running configuration inside the data directory.
pub const RUNNING_CONFIG_FILE: &str = "config.toml";

/// How long a `config maintenance` announcement stays active.
pub const MAINTENANCE_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Operator-tunable settings that survive restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunningConfig {
    pub operator_name: String,
    pub min_peers: u32,
    pub max_peers: u32,
    pub node_tag: String,
    /// Trailing window, in blocks, used by the network statistics.
    pub network_stats_keep: i64,
    pub p2p_bw_factor: i64,
    pub p2p_turbo: bool,
    pub whitelist_incoming: bool,
    pub only_trusted: bool,
    pub peer_log_expiry_secs: u64,
    /// Auto-run the diagnostic sequence every N seconds; 0 disables.
    pub diagnostic_delay_secs: u64,
    /// Maximum percentage of relayed blocks a peer may get rejected.
    pub block_reject_threshold: u64,
    pub peer_latency_threshold_ms: u64,
    pub job_dispatch_ms: u64,
    pub variable_dispatch: bool,
    pub trace_blocks: bool,
    pub trace_tx: bool,
    pub trace_tagged: bool,
    pub anti_cheat: bool,
    pub maintenance_message: String,
    pub log_level: u8,
}

impl Default for RunningConfig {
    fn default() -> Self {
        Self {
            operator_name: String::new(),
            min_peers: 16,
            max_peers: 64,
            node_tag: String::new(),
            network_stats_keep: 100,
            p2p_bw_factor: 1,
            p2p_turbo: false,
            whitelist_incoming: true,
            only_trusted: false,
            peer_log_expiry_secs: 300,
            diagnostic_delay_secs: 0,
            block_reject_threshold: 5,
            peer_latency_threshold_ms: 1000,
            job_dispatch_ms: 500,
            variable_dispatch: false,
            trace_blocks: false,
            trace_tx: false,
            trace_tagged: false,
            anti_cheat: false,
            maintenance_message: String::new(),
            log_level: 0,
        }
    }
}

impl RunningConfig {
    /// Parse a running configuration document.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] when the document is not valid TOML.
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Read and parse a running configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    #[must_use]
    pub const fn job_dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.job_dispatch_ms)
    }

    #[must_use]
    pub const fn peer_latency_threshold(&self) -> Duration {
        Duration::from_millis(self.peer_latency_threshold_ms)
    }

    /// Set the minimum peer count, raising the maximum if needed.
    pub fn set_min_peers(&mut self, min: u32) {
        self.min_peers = min;
        if self.max_peers < min {
            self.max_peers = min;
        }
    }

    /// Set the maximum peer count, lowering the minimum if needed.
    pub fn set_max_peers(&mut self, max: u32) {
        self.max_peers = max;
        if self.min_peers > max {
            self.min_peers = max;
        }
    }
}

/// Shared owner of the [`RunningConfig`].
///
/// Every [`update`](Self::update) is persisted immediately. Persistence
/// failures are logged and never propagate.
#[derive(Debug)]
pub struct RunningConfigStore {
    path: Option<PathBuf>,
    inner: RwLock<RunningConfig>,
    maintenance_since: RwLock<Option<DateTime<Utc>>>,
}

impl RunningConfigStore {
    /// Store that never touches disk.
    #[must_use]
    pub fn in_memory(config: RunningConfig) -> Self {
        Self {
            path: None,
            inner: RwLock::new(config),
            maintenance_since: RwLock::new(None),
        }
    }

    /// Load from `path`. A missing file yields defaults silently; an
    /// unreadable or malformed one is logged and also yields defaults.
    #[must_use]
    pub fn load(path: PathBuf) -> Self {
        let config = if path.exists() {
            match RunningConfig::from_file(&path) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded running config");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load running config, using defaults");
                    RunningConfig::default()
                }
            }
        } else {
            RunningConfig::default()
        };

        Self {
            path: Some(path),
            inner: RwLock::new(config),
            maintenance_since: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current configuration.
    #[must_use]
    pub fn snapshot(&self) -> RunningConfig {
        self.inner.read().clone()
    }

    /// Read one value without cloning the whole configuration.
    pub fn get<T>(&self, read: impl FnOnce(&RunningConfig) -> T) -> T {
        read(&self.inner.read())
    }

    /// Mutate the configuration and persist the result.
    ///
    /// The write lock is held across the save so the file always matches
    /// the last applied change.
    pub fn update<T>(&self, change: impl FnOnce(&mut RunningConfig) -> T) -> T {
        let mut guard = self.inner.write();
        let out = change(&mut guard);
        if let Err(e) = self.persist(&guard) {
            warn!(error = %e, "Failed to save running config");
        }
        out
    }

    /// Write the current configuration to disk.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.persist(&self.inner.read())
    }

    fn persist(&self, config: &RunningConfig) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteFile)?;
        }
        std::fs::write(path, content).map_err(ConfigError::WriteFile)?;
        debug!(path = %path.display(), "Saved running config");
        Ok(())
    }

    /// Start broadcasting the maintenance message to miners.
    pub fn start_maintenance(&self, now: DateTime<Utc>) {
        *self.maintenance_since.write() = Some(now);
    }

    #[must_use]
    pub fn maintenance_active(&self, now: DateTime<Utc>) -> bool {
        self.maintenance_since.read().is_some_and(|since| {
            (now - since)
                .to_std()
                .is_ok_and(|elapsed| elapsed < MAINTENANCE_WINDOW)
        })
    }
}
