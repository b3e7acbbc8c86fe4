//! Console behaviour against a fully wired in-memory node.

mod support;

use std::time::Duration;

use chrono::Utc;
use dagd::adapter::outbound::memory::MemoryNetwork;
use dagd::application::config::{RunningConfigStore, RUNNING_CONFIG_FILE};
use dagd::application::console::{Arity, CommandOutcome};
use dagd::port::outbound::{ChainStore, MiningService, PeerNetwork};
use dagd::testkit::TestNode;

use support::{assert_contains, node};

// ----------------------------------------------------------------------------
// Peers
// ----------------------------------------------------------------------------

#[test]
fn ban_then_unban_round_trip() {
    let node = node(10, 3);
    assert_eq!(node.network.peer_count(), 3);

    let out = node.run("ban 10.0.0.2 60");
    assert_contains(&out, "10.0.0.2 banned");
    assert_eq!(node.network.peer_count(), 2);
    let bans = node.network.bans();
    assert_eq!(bans.len(), 1);
    assert_eq!(bans[0].address, "10.0.0.2");
    let remaining = bans[0].remaining(Utc::now()).expect("timed ban");
    assert!(remaining <= Duration::from_secs(60), "{remaining:?}");
    assert!(remaining > Duration::from_secs(50), "{remaining:?}");

    assert_contains(&node.run("bans"), "10.0.0.2");

    let out = node.run("unban 10.0.0.2");
    assert_contains(&out, "unban 10.0.0.2 successful");
    assert!(node.network.bans().is_empty());
    assert_contains(&node.run("bans"), "ban list is empty");
}

#[test]
fn rejected_ban_leaves_state_unchanged() {
    let node = node(10, 3);
    for line in ["ban", "ban not-an-ip", "ban 10.0.0.2 soon", "ban 10.0.0.2 1 2"] {
        let out = node.run(line);
        assert!(out.starts_with("usage: ban"), "{line}: {out}");
    }
    assert!(node.network.bans().is_empty());
    assert_eq!(node.network.peer_count(), 3);
}

#[test]
fn peer_list_shows_connected_peers() {
    let node = node(10, 2);
    let out = node.run("peer_list");
    assert_contains(&out, "10.0.0.1:18089");
    assert_contains(&out, "10.0.0.2:18089");
}

#[test]
fn peer_list_defaults_to_twenty_five_rows() {
    let node = node(10, 30);
    assert_contains(&node.run("peer_list"), "showing 25/30");
    assert_contains(&node.run("peer_list 30"), "showing 30/30");
}

#[test]
fn peer_errors_lists_only_peers_with_rejections() {
    let node = node(10, 2);
    let mut lossy = MemoryNetwork::peer("10.0.0.9:18089", 10);
    lossy.relayed_blocks = 20;
    lossy.rejected_blocks = 5;
    node.network.add_peer(lossy);

    let out = node.run("peer_errors");
    assert_contains(&out, "Peer Errors (1)");
    assert_contains(&out, "10.0.0.9:18089");
    assert_contains(&out, "75.00%");
    assert!(!out.contains("10.0.0.1:18089"), "{out}");

    assert_contains(&node.run("peer_errors 10.0.0.9"), "Block Errors - 10.0.0.9:18089");
    assert_contains(&node.run("peer_errors 10.0.0.77"), "not a known peer");
    assert!(node.run("peer_errors nowhere").starts_with("usage: peer_errors"));
}

#[test]
fn clearing_peer_stats_empties_the_error_list() {
    let node = node(10, 0);
    for address in ["10.0.0.8:18089", "10.0.0.9:18089"] {
        let mut peer = MemoryNetwork::peer(address, 10);
        peer.relayed_blocks = 10;
        peer.rejected_blocks = 1;
        node.network.add_peer(peer);
    }

    assert_contains(&node.run("clear_peer_stats 10.0.0.8"), "block stats cleared for 10.0.0.8");
    assert_eq!(node.network.peer("10.0.0.8").unwrap().rejected_blocks, 0);
    assert_contains(&node.run("peer_errors"), "Peer Errors (1)");

    assert_contains(&node.run("clear_all_peer_stats"), "block stats cleared for 2 peer(s)");
    assert_contains(&node.run("peer_errors"), "no peer errors recorded");
}

#[test]
fn peer_stats_cannot_be_cleared_during_shutdown() {
    let node = node(10, 0);
    let mut peer = MemoryNetwork::peer("10.0.0.8:18089", 10);
    peer.relayed_blocks = 10;
    peer.rejected_blocks = 1;
    node.network.add_peer(peer);
    node.ctx.shutdown.fire();

    assert_contains(&node.run("clear_all_peer_stats"), "shutdown in progress");
    assert_contains(&node.run("clear_peer_stats 10.0.0.8"), "shutdown in progress");
    assert_eq!(node.network.peer("10.0.0.8").unwrap().rejected_blocks, 1);
}

#[test]
fn show_selfish_names_connected_peers_that_never_relayed() {
    let node = node(10, 0);
    assert_contains(&node.run("show_selfish"), "no selfish peers");

    let mut generous = MemoryNetwork::peer("10.0.0.8:18089", 10);
    generous.relayed_blocks = 3;
    node.network.add_peer(generous);
    node.network.add_peer(MemoryNetwork::peer("10.0.0.9:18089", 10));

    let out = node.run("show_selfish");
    assert_contains(&out, "Selfish Peers (1)");
    assert_contains(&out, "10.0.0.9:18089");
    assert!(!out.contains("10.0.0.8:18089"), "{out}");
}

#[test]
fn trusted_list_follows_add_and_remove() {
    let node = node(1, 1);
    node.run("add_trusted 10.0.0.1");
    assert_eq!(node.network.trusted(), vec!["10.0.0.1".to_string()]);
    node.run("remove_trusted 10.0.0.1");
    assert!(node.network.trusted().is_empty());
}

// ----------------------------------------------------------------------------
// Argument counts
// ----------------------------------------------------------------------------

/// Argument counts `arity` refuses, one above the limit and one below.
fn refused_counts(arity: Arity) -> Vec<usize> {
    match arity {
        Arity::Exactly(n) => std::iter::once(n + 1).chain(n.checked_sub(1)).collect(),
        Arity::Between(lo, hi) => std::iter::once(hi + 1).chain(lo.checked_sub(1)).collect(),
        Arity::AtLeast(n) => n.checked_sub(1).into_iter().collect(),
    }
}

#[test]
fn every_command_refuses_wrong_argument_counts_without_side_effects() {
    let node = node(10, 3);
    node.run("add_trusted 10.0.0.1");
    node.run("ban 10.0.0.3 600");

    let bans = node.network.bans();
    let trusted = node.network.trusted();
    let config = node.ctx.config.snapshot();
    let height = node.chain.height();
    let peers = node.network.peer_count();

    let mut checked = 0;
    for handler in node.registry.handlers() {
        for count in refused_counts(handler.arity()) {
            let line = std::iter::once(handler.name())
                .chain(std::iter::repeat("1").take(count))
                .collect::<Vec<_>>()
                .join(" ");
            let out = node.run(&line);
            assert!(
                out.starts_with(&format!("usage: {}", handler.name())),
                "`{line}` printed: {out}"
            );
            checked += 1;
        }
    }

    assert!(checked > node.registry.len());
    assert_eq!(node.network.bans(), bans);
    assert_eq!(node.network.trusted(), trusted);
    assert_eq!(node.ctx.config.snapshot(), config);
    assert_eq!(node.chain.height(), height);
    assert_eq!(node.network.peer_count(), peers);
    assert!(!node.ctx.shutdown.is_fired());
}

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

#[test]
fn config_changes_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let node = TestNode::builder().data_dir(dir.path()).build();

    assert_contains(&node.run("config min_peers 4"), "peer bounds now 4-");
    assert_contains(&node.run("config node_tag edge one"), "node tag set to edge one");
    assert_eq!(node.network.node_tag(), "edge one");
    assert_eq!(node.network.peer_bounds().0, 4);

    let reloaded = RunningConfigStore::load(dir.path().join(RUNNING_CONFIG_FILE));
    assert_eq!(reloaded.get(|c| c.min_peers), 4);
    assert_eq!(reloaded.get(|c| c.node_tag.clone()), "edge one");
}

#[test]
fn config_job_dispatch_reaches_mining_service() {
    let node = TestNode::new();
    assert_contains(&node.run("config job_dispatch_time 250"), "job dispatch time set to 250ms");
    assert_eq!(node.mining.job_dispatch_delay(), Duration::from_millis(250));
}

#[test]
fn config_without_arguments_prints_menu() {
    let node = TestNode::new();
    let out = node.run("config");
    assert_contains(&out, "How to change");
    assert_contains(&out, "min_peers");
}

#[test]
fn malformed_config_value_is_usage_error() {
    let node = TestNode::new();
    let before = node.ctx.config.snapshot();
    let out = node.run("config min_peers lots");
    assert!(out.starts_with("usage: config"), "{out}");
    assert_eq!(node.ctx.config.snapshot(), before);
}

#[test]
fn debug_toggles_log_level() {
    use dagd::port::outbound::LogLevelControl;

    let node = TestNode::new();
    node.run("debug");
    assert_eq!(node.log.level(), 1);
    node.run("debug");
    assert_eq!(node.log.level(), 0);
    node.run("debug 3");
    assert_eq!(node.log.level(), 3);
    assert_eq!(node.ctx.config.get(|c| c.log_level), 3);
}

// ----------------------------------------------------------------------------
// Chain
// ----------------------------------------------------------------------------

#[test]
fn print_bc_rejects_ranges_outside_the_chain() {
    let node = node(10, 0);
    assert_contains(&node.run("print_bc 5 11"), "error:");
    assert_contains(&node.run("print_bc 6 5"), "error:");
    assert!(node.run("print_bc 5 x").starts_with("usage: print_bc"));
}

#[test]
fn pop_rewinds_and_is_counted() {
    let node = node(10, 0);
    node.run("pop 3");
    assert_eq!(node.chain.height(), 7);
    assert_eq!(node.ctx.counters.pop_count(), 3);
}

#[test]
fn block_export_then_import_restores_popped_block() {
    let dir = tempfile::tempdir().unwrap();
    let node = TestNode::builder().blocks(5).data_dir(dir.path()).build();
    let id = node.chain.block_at_topo(5).unwrap();

    assert!(!node.run(&format!("block_export {id}")).contains("error"));
    assert!(dir.path().join("export").join(format!("{id}.block")).is_file());

    node.run("pop");
    assert!(!node.chain.block_exists(&id));

    node.run(&format!("block_import {id}"));
    assert!(node.chain.block_exists(&id));
    assert_eq!(node.chain.height(), 5);
}

#[test]
fn graph_writes_dot_file() {
    let dir = tempfile::tempdir().unwrap();
    let node = TestNode::builder().blocks(12).data_dir(dir.path()).build();
    node.run("graph 2 8");
    let dot = std::fs::read_to_string(dir.path().join("graph.dot")).unwrap();
    assert!(dot.starts_with("digraph"));
}

// ----------------------------------------------------------------------------
// Lifecycle
// ----------------------------------------------------------------------------

#[test]
fn exit_fires_shutdown_and_refuses_later_mutations() {
    let node = node(10, 3);
    let (outcome, _) = node.run_outcome("bye");
    assert_eq!(outcome, CommandOutcome::Exit);
    assert!(node.ctx.shutdown.is_fired());

    assert_contains(&node.run("ban 10.0.0.1"), "shutdown in progress");
    assert!(node.network.bans().is_empty());
}

#[test]
fn status_reports_heights_and_peers() {
    let node = node(10, 3);
    node.sample();
    let out = node.run("status");
    assert_contains(&out, "MAINNET");
    assert_contains(&out, "10");
}
