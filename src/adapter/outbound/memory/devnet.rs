//! Synthetic block production driving the in-memory collaborators.
//!
//! Lets the daemon run standalone: blocks arrive on a timer, peers follow
//! the tip, and the activity log fills so the console has something to show.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tracing::{debug, info};

use super::chain::{MemoryChain, NewBlock};
use super::network::{ActivityRecord, BlockClass, MemoryNetwork};
use super::pool::MemoryPool;
use crate::domain::{BlockId, Direction, NodeCounters};
use crate::port::outbound::{ChainStore, TxPool};

/// Miniblocks folded into every generated block.
const MINIBLOCKS_PER_BLOCK: usize = 9;

const MINERS: [&str; 4] = [
    "deto1qyminer0alpha",
    "deto1qyminer1bravo",
    "deto1qyminer2charlie",
    "deto1qyminer3delta",
];

/// Address attributed to blocks mined through this node.
pub const LOCAL_MINER: &str = MINERS[0];

/// Periodic synthetic block producer.
pub struct Devnet {
    chain: Arc<MemoryChain>,
    network: Arc<MemoryNetwork>,
    mempool: Arc<MemoryPool>,
    counters: Arc<NodeCounters>,
    interval: Duration,
    rng: StdRng,
}

impl Devnet {
    #[must_use]
    pub fn new(
        chain: Arc<MemoryChain>,
        network: Arc<MemoryNetwork>,
        mempool: Arc<MemoryPool>,
        counters: Arc<NodeCounters>,
        interval: Duration,
    ) -> Self {
        Self {
            chain,
            network,
            mempool,
            counters,
            interval,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic producer for tests.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Connect `count` synthetic peers at the current tip.
    pub fn seed_peers(&self, count: usize) {
        let height = self.chain.height();
        for i in 0..count {
            let mut peer = MemoryNetwork::peer(&format!("10.1.0.{}:18089", i + 1), height);
            peer.peer_id = 1000 + i as u64;
            peer.direction = if i % 3 == 0 {
                Direction::Incoming
            } else {
                Direction::Outgoing
            };
            peer.whitelisted = i % 2 == 0;
            peer.tag = format!("node-{i}");
            self.network.add_peer(peer);
        }
    }

    fn node_name(&mut self) -> String {
        format!("10.1.0.{}", self.rng.gen_range(1..=6))
    }

    /// Produce one block with its miniblocks and the matching network activity.
    pub fn produce(&mut self) -> BlockId {
        let miner = MINERS[self.rng.gen_range(0..MINERS.len())].to_string();
        let mini_miners: Vec<String> = (0..MINIBLOCKS_PER_BLOCK)
            .map(|_| MINERS[self.rng.gen_range(0..MINERS.len())].to_string())
            .collect();

        let pooled: Vec<_> = self.mempool.entries().into_iter().map(|e| e.id).collect();
        for id in &pooled {
            self.mempool.delete(id);
        }

        let id = self.chain.append(NewBlock {
            miner: miner.clone(),
            miniblock_miners: mini_miners.clone(),
            tx_hashes: pooled,
        });
        let height = self.chain.height();

        let node = self.node_name();
        self.network.record(ActivityRecord {
            height,
            node,
            miner: miner.clone(),
            class: BlockClass::Final,
            orphan: false,
        });
        self.counters.record_network_block();
        if miner == LOCAL_MINER {
            self.counters.record_block_accepted();
            self.network.record_mined(&miner, height);
        }

        for mini in &mini_miners {
            let orphan = self.rng.gen_bool(0.02);
            let node = self.node_name();
            self.network.record(ActivityRecord {
                height,
                node,
                miner: mini.clone(),
                class: BlockClass::Mini,
                orphan,
            });
            if mini == LOCAL_MINER {
                if orphan {
                    self.counters.record_mini_orphaned();
                } else {
                    self.counters.record_mini_accepted();
                }
            }
        }

        let tx_count = self.rng.gen_range(0..4u32);
        for _ in 0..tx_count {
            let raw: [u8; 16] = self.rng.gen();
            self.mempool.add(raw.to_vec(), self.rng.gen_range(1..100));
        }

        self.chain
            .set_network_hashrate(self.rng.gen_range(900_000..1_100_000));
        self.chain
            .set_miniblock_count(self.rng.gen_range(0..MINIBLOCKS_PER_BLOCK));
        self.network.advance_peers(height, self.chain.topo_height());

        debug!(height, block = %id, miner = %miner, "Devnet block produced");
        id
    }

    /// Produce blocks until `shutdown` flips to `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Devnet producer started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    self.produce();
                }
                result = shutdown.changed() => {
                    if result.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Devnet producer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devnet() -> (Devnet, Arc<MemoryChain>, Arc<MemoryNetwork>, Arc<NodeCounters>) {
        let chain = Arc::new(MemoryChain::new());
        let network = Arc::new(MemoryNetwork::new(7));
        let counters = Arc::new(NodeCounters::new());
        let devnet = Devnet::new(
            Arc::clone(&chain),
            Arc::clone(&network),
            Arc::new(MemoryPool::mempool()),
            Arc::clone(&counters),
            Duration::from_secs(1),
        )
        .with_seed(42);
        (devnet, chain, network, counters)
    }

    #[test]
    fn produce_extends_chain_and_activity() {
        use crate::port::outbound::PeerNetwork;

        let (mut devnet, chain, network, counters) = devnet();
        devnet.seed_peers(4);
        for _ in 0..5 {
            devnet.produce();
        }
        assert_eq!(chain.height(), 5);
        assert_eq!(counters.total_blocks(), 5);
        assert_eq!(network.best_peer_height().0, 5);

        let recorded: u64 = network
            .active_nodes(0)
            .iter()
            .map(|n| n.counts.total())
            .sum();
        assert_eq!(recorded, 5 * (1 + MINIBLOCKS_PER_BLOCK as u64));
    }
}
