//! In-memory work-submission server state.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::ConnectedMiner;
use crate::error::{Error, Result};
use crate::port::outbound::MiningService;

/// In-memory [`MiningService`].
#[derive(Debug)]
pub struct MemoryMining {
    miners: RwLock<Vec<ConnectedMiner>>,
    names: RwLock<HashMap<String, Vec<String>>>,
    dispatch_delay: RwLock<Duration>,
}

impl MemoryMining {
    #[must_use]
    pub fn new(dispatch_delay: Duration) -> Self {
        Self {
            miners: RwLock::new(Vec::new()),
            names: RwLock::new(HashMap::new()),
            dispatch_delay: RwLock::new(dispatch_delay),
        }
    }

    pub fn connect_miner(&self, miner: ConnectedMiner) {
        let mut miners = self.miners.write();
        miners.retain(|m| m.address != miner.address);
        miners.push(miner);
    }

    pub fn register_name(&self, address: &str, name: &str) {
        self.names
            .write()
            .entry(address.to_string())
            .or_default()
            .push(name.to_string());
    }
}

impl Default for MemoryMining {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl MiningService for MemoryMining {
    fn miner_count(&self) -> usize {
        self.miners.read().len()
    }

    fn connected_miners(&self) -> Vec<ConnectedMiner> {
        self.miners.read().clone()
    }

    fn address_to_name(&self, address: &str) -> Result<Vec<String>> {
        if address.len() < 8 || !address.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidAddress(address.to_string()));
        }
        Ok(self.names.read().get(address).cloned().unwrap_or_default())
    }

    fn set_job_dispatch_delay(&self, delay: Duration) {
        debug!(delay_ms = delay.as_millis() as u64, "Job dispatch delay updated");
        *self.dispatch_delay.write() = delay;
    }

    fn job_dispatch_delay(&self) -> Duration {
        *self.dispatch_delay.read()
    }
}
