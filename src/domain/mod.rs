//! Plain data shared by every layer. No I/O, no collaborators.

pub mod activity;
pub mod block;
pub mod counters;
pub mod format;
pub mod id;
pub mod peer;
pub mod telemetry;

pub use activity::{
    ConnectedMiner, Likelihood, MinedBlock, MinerActivity, MinerCounts, NodeActivity, NodeCounts,
};
pub use block::{BlockHeader, BlockKind, ChainLink, PoolEntry, TopoEntry, TxLocation, TxRecord};
pub use counters::NodeCounters;
pub use id::{BlockId, ParseIdError, StateRoot, TxId};
pub use peer::{BanEntry, ConnectionInfo, Direction, PeerInfo};
pub use telemetry::TelemetrySnapshot;
