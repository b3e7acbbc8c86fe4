//! In-memory collaborators.
//!
//! Used by the binary when no external engine is linked, and by tests.

pub mod chain;
pub mod devnet;
pub mod mining;
pub mod network;
pub mod pool;
pub mod service;

pub use chain::{MemoryChain, NewBlock};
pub use devnet::Devnet;
pub use mining::MemoryMining;
pub use network::{ActivityRecord, BlockClass, MemoryNetwork};
pub use pool::MemoryPool;
pub use service::{FixedLogLevel, MemoryServer};
