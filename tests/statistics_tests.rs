//! Network statistics drawn from the networking collaborator's activity log.

mod support;

use dagd::adapter::outbound::memory::{ActivityRecord, BlockClass};
use dagd::application::statistics::{rank_miners, rank_nodes, StatsWindow};
use dagd::port::outbound::PeerNetwork;
use dagd::testkit::TestNode;

use support::{assert_contains, node};

const NODES: [&str; 3] = ["10.1.0.1", "10.1.0.2", "10.1.0.3"];
const MINERS: [&str; 4] = ["dero1alpha", "dero1beta", "dero1gamma", "dero1delta"];

/// Activity on every height from 1 to the tip; every seventh block orphaned,
/// every fifth a final block.
fn busy_node(blocks: i64) -> TestNode {
    let node = node(blocks, 0);
    for height in 1..=blocks {
        let h = usize::try_from(height).unwrap();
        node.network.record(ActivityRecord {
            height,
            node: NODES[h % NODES.len()].into(),
            miner: MINERS[(h * 3) % MINERS.len()].into(),
            class: if height % 5 == 0 {
                BlockClass::Final
            } else {
                BlockClass::Mini
            },
            orphan: height % 7 == 0,
        });
    }
    node
}

fn close_to(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-6
}

#[test]
fn node_dominance_over_the_window_sums_to_hundred() {
    let node = busy_node(200);
    let since = node.ctx.stats_window_start();
    assert_eq!(since, 100);

    let ranked = rank_nodes(node.network.active_nodes(since));
    assert_eq!(ranked.len(), NODES.len());

    let counted: u64 = ranked.iter().map(|r| r.counts.total()).sum();
    assert_eq!(counted, 101);

    let dominance: f64 = ranked.iter().map(|r| r.dominance).sum();
    assert!(close_to(dominance, 100.0), "{dominance}");
    assert!(ranked.windows(2).all(|w| w[0].counts.total() >= w[1].counts.total()));
}

#[test]
fn miner_dominance_excludes_orphans_from_the_numerator() {
    let node = busy_node(140);
    let ranked = rank_miners(node.network.active_miners(node.ctx.stats_window_start()));

    let dominance: f64 = ranked.iter().map(|r| r.dominance).sum();
    assert!(close_to(dominance, 100.0), "{dominance}");
    for rank in &ranked {
        let produced = rank.counts.produced() as f64;
        let total = rank.counts.total() as f64;
        assert!(close_to(rank.orphan_loss, (total - produced) / total * 100.0));
    }
}

#[test]
fn likelihoods_for_a_miner_cover_every_candidate_node() {
    let node = busy_node(120);
    let since = node.ctx.stats_window_start();
    let candidates = node.network.potential_miner_nodes(since, MINERS[0]);

    assert!(!candidates.is_empty());
    let sum: f64 = candidates.iter().map(|c| c.likelihood).sum();
    assert!(close_to(sum, 100.0), "{sum}");

    let best = node.network.best_guess_miner_node(since, MINERS[0]).unwrap();
    assert!(candidates.iter().all(|c| c.likelihood <= best.likelihood));
}

#[test]
fn window_label_tracks_configured_size() {
    let node = busy_node(60);
    node.ctx.counters.mark_chain_start(50);

    let out = node.run("active_nodes");
    assert_contains(&out, &format!("{}", StatsWindow::new(100, 60, 50)));
    assert_contains(&out, "Last 10/100 Blocks");

    node.run("config network_stats_keep 5");
    assert_contains(&node.run("active_nodes"), "Last 5 Blocks");
}

#[test]
fn empty_activity_renders_without_rows() {
    let node = TestNode::new();
    let out = node.run("active_miners");
    assert_contains(&out, "Showing 0/0 miners");
    assert!(!out.contains("NaN"));
}

#[test]
fn peer_and_network_commands_share_the_window_label() {
    let node = busy_node(60);
    node.ctx.counters.mark_chain_start(50);
    let label = StatsWindow::new(100, 60, 50).to_string();

    assert_contains(&node.run("active_miners"), &label);
    assert_contains(&node.run("peer_info 10.1.0.1"), &format!("Potential Integrators - {label}"));

    node.run("config network_stats_keep 5");
    let label = StatsWindow::new(5, 60, 50).to_string();
    assert_contains(&node.run("peer_info 10.1.0.1"), &label);
    assert_contains(&node.run("active_nodes"), &label);
}
