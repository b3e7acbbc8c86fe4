//! A node wired entirely from in-memory collaborators.

use std::path::PathBuf;
use std::sync::Arc;

use crate::adapter::outbound::memory::{
    FixedLogLevel, MemoryChain, MemoryMining, MemoryNetwork, MemoryPool, MemoryServer,
};
use crate::application::config::{RunningConfig, RunningConfigStore, RUNNING_CONFIG_FILE};
use crate::application::console::{CommandOutcome, CommandRegistry, Dispatcher};
use crate::application::context::{Collaborators, NetworkMode, NodeContext, NodeEnvironment};
use crate::application::telemetry::Sampler;
use crate::domain::NodeCounters;
use crate::port::outbound::RequestServer;

use super::console::{plain, SharedBuffer};

/// Builder for [`TestNode`].
#[derive(Debug, Default)]
pub struct TestNodeBuilder {
    blocks: i64,
    peers: usize,
    data_dir: Option<PathBuf>,
    config: RunningConfig,
    network: NetworkMode,
}

impl TestNodeBuilder {
    /// Blocks appended on top of genesis.
    #[must_use]
    pub fn blocks(mut self, blocks: i64) -> Self {
        self.blocks = blocks;
        self
    }

    /// Connected peers at the tip, addressed `10.0.0.1:18089` upwards.
    #[must_use]
    pub fn peers(mut self, peers: usize) -> Self {
        self.peers = peers;
        self
    }

    /// Persist the running configuration under `dir`.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn config(mut self, config: RunningConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn testnet(mut self) -> Self {
        self.network = NetworkMode::Testnet;
        self
    }

    #[must_use]
    pub fn build(self) -> TestNode {
        let chain = Arc::new(MemoryChain::new());
        chain.extend(self.blocks);

        let network = Arc::new(MemoryNetwork::new(1));
        for i in 0..self.peers {
            network.add_peer(MemoryNetwork::peer(
                &format!("10.0.0.{}:18089", i + 1),
                self.blocks,
            ));
        }

        let mempool = Arc::new(MemoryPool::mempool());
        let regpool = Arc::new(MemoryPool::regpool());
        let mining = Arc::new(MemoryMining::new(self.config.job_dispatch_delay()));
        let servers = vec![Arc::new(MemoryServer::new("rpc")), Arc::new(MemoryServer::new("getwork"))];
        let log = Arc::new(FixedLogLevel::new(self.config.log_level));

        let (config, data_dir) = match self.data_dir {
            Some(dir) => {
                let store = RunningConfigStore::load(dir.join(RUNNING_CONFIG_FILE));
                store.update(|c| *c = self.config);
                (store, dir)
            }
            None => (
                RunningConfigStore::in_memory(self.config),
                std::env::temp_dir().join(format!("dagd-testkit-{}", rand::random::<u64>())),
            ),
        };

        let ctx = NodeContext::new(
            Collaborators {
                chain: chain.clone(),
                network: network.clone(),
                mempool: mempool.clone(),
                regpool: regpool.clone(),
                mining: mining.clone(),
                servers: servers
                    .iter()
                    .map(|s| Arc::clone(s) as Arc<dyn RequestServer>)
                    .collect(),
                log: log.clone(),
            },
            Arc::new(config),
            Arc::new(NodeCounters::new()),
            NodeEnvironment::new(self.network, data_dir),
        );

        TestNode {
            ctx,
            chain,
            network,
            mempool,
            regpool,
            mining,
            servers,
            log,
            registry: Arc::new(CommandRegistry::standard()),
        }
    }
}

/// A fully wired node with typed handles on every collaborator.
pub struct TestNode {
    pub ctx: NodeContext,
    pub chain: Arc<MemoryChain>,
    pub network: Arc<MemoryNetwork>,
    pub mempool: Arc<MemoryPool>,
    pub regpool: Arc<MemoryPool>,
    pub mining: Arc<MemoryMining>,
    pub servers: Vec<Arc<MemoryServer>>,
    pub log: Arc<FixedLogLevel>,
    pub registry: Arc<CommandRegistry>,
}

impl TestNode {
    /// Genesis only, no peers, in-memory configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> TestNodeBuilder {
        TestNodeBuilder::default()
    }

    /// A dispatcher writing into the returned buffer.
    #[must_use]
    pub fn dispatcher(&self) -> (Dispatcher, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let dispatcher = Dispatcher::new(
            self.ctx.clone(),
            Arc::clone(&self.registry),
            Box::new(buffer.clone()),
        );
        (dispatcher, buffer)
    }

    /// Dispatch one line and return the outcome with its colourless output.
    pub fn run_outcome(&self, line: &str) -> (CommandOutcome, String) {
        let (mut dispatcher, buffer) = self.dispatcher();
        let outcome = dispatcher.dispatch(line);
        (outcome, plain(&buffer.contents()))
    }

    /// Dispatch one line and return its colourless output.
    pub fn run(&self, line: &str) -> String {
        self.run_outcome(line).1
    }

    /// Sample the collaborators once and publish the snapshot.
    pub fn sample(&self) {
        Sampler::new(self.ctx.clone()).tick();
    }
}

impl Default for TestNode {
    fn default() -> Self {
        Self::new()
    }
}
