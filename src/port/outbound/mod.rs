//! Outbound ports (driven side).

pub mod chain;
pub mod logging;
pub mod mining;
pub mod network;
pub mod pool;
pub mod server;

pub use chain::{ChainStore, StoreResult};
pub use logging::{LogLevelControl, MAX_LOG_LEVEL};
pub use mining::MiningService;
pub use network::PeerNetwork;
pub use pool::TxPool;
pub use server::RequestServer;
