//! Work-submission server port.

use std::time::Duration;

use crate::domain::ConnectedMiner;
use crate::error::Result;

pub trait MiningService: Send + Sync {
    /// Miners currently connected.
    fn miner_count(&self) -> usize;

    fn connected_miners(&self) -> Vec<ConnectedMiner>;

    /// Registered names for a wallet address.
    fn address_to_name(&self, address: &str) -> Result<Vec<String>>;

    /// Delay between job dispatches to connected miners.
    fn set_job_dispatch_delay(&self, delay: Duration);

    fn job_dispatch_delay(&self) -> Duration;
}
