//! Peer, connection and ban records reported by the networking collaborator.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection direction relative to this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incoming => write!(f, "Inc"),
            Self::Outgoing => write!(f, "Out"),
        }
    }
}

/// A known peer, connected or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub address: String,
    pub peer_id: u64,
    pub height: i64,
    pub topo_height: i64,
    pub latency: Duration,
    pub direction: Direction,
    pub tag: String,
    pub version: String,
    pub whitelisted: bool,
    pub trusted: bool,
    pub connected: bool,
    /// Blocks this peer relayed to us that were later rejected.
    pub rejected_blocks: u64,
    pub relayed_blocks: u64,
}

impl PeerInfo {
    /// Percentage of relayed blocks that were accepted; 100 when nothing was relayed.
    #[must_use]
    pub fn transmission_success(&self) -> f64 {
        if self.relayed_blocks == 0 {
            return 100.0;
        }
        let accepted = self.relayed_blocks.saturating_sub(self.rejected_blocks);
        accepted as f64 / self.relayed_blocks as f64 * 100.0
    }
}

/// A live connection as shown by `syncinfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub address: String,
    pub peer_id: u64,
    pub direction: Direction,
    pub height: i64,
    pub topo_height: i64,
    pub latency: Duration,
    pub tag: String,
    pub state: String,
}

/// One entry of the ban list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanEntry {
    pub address: String,
    /// `None` for a permanent ban.
    pub expires_at: Option<DateTime<Utc>>,
}

impl BanEntry {
    /// Remaining ban time, `None` for permanent bans. Saturates at zero.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|at| (at - now).to_std().unwrap_or(Duration::ZERO))
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_saturates_at_zero() {
        let now = Utc::now();
        let entry = BanEntry {
            address: "10.0.0.5".into(),
            expires_at: Some(now - chrono::Duration::seconds(5)),
        };
        assert_eq!(entry.remaining(now), Some(Duration::ZERO));
        assert!(entry.is_expired(now));
    }

    #[test]
    fn permanent_ban_never_expires() {
        let entry = BanEntry {
            address: "10.0.0.5".into(),
            expires_at: None,
        };
        assert_eq!(entry.remaining(Utc::now()), None);
        assert!(!entry.is_expired(Utc::now()));
    }
}
