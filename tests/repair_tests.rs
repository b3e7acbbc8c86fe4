//! Topological index repair through the console and the walker directly.

mod support;

use dagd::application::repair::{repair_topo_index, RepairPlan};
use dagd::domain::BlockId;
use dagd::port::outbound::ChainStore;

use support::{assert_contains, node};

#[test]
fn fix_rewrites_divergent_entry_and_print_bc_agrees() {
    let node = node(105, 0);
    let expected = node.chain.block_at_topo(103).unwrap();
    let bogus = BlockId::digest(b"torn write");
    node.chain.corrupt_topo(103, bogus);

    let out = node.run("fix");
    assert_contains(&out, "repaired 1 of");
    assert_contains(&out, &bogus.to_string());
    assert_eq!(node.chain.block_at_topo(103).unwrap(), expected);

    let out = node.run("print_bc 100 105");
    assert_eq!(out.matches("topo height:").count(), 6);
    assert_contains(&out, &format!("block id: {expected}"));
    assert!(!out.contains(&bogus.to_string()));
}

#[test]
fn second_fix_writes_nothing() {
    let node = node(40, 0);
    node.chain.corrupt_topo(12, BlockId::digest(b"x"));
    node.chain.remove_topo(20);

    node.run("fix");
    let writes = node.chain.topo_writes();
    let out = node.run("fix");
    assert_contains(&out, "topo index consistent, 40 heights checked");
    assert_eq!(node.chain.topo_writes(), writes);
}

#[test]
fn corruption_aborts_and_leaves_lower_history_unexamined() {
    let node = node(60, 0);
    let lower = BlockId::digest(b"lower");
    node.chain.corrupt_topo(10, lower);
    let victim = node.chain.block_at_topo(30).unwrap();
    node.chain.forget_block(&victim);

    let out = node.run("fix");
    assert_contains(&out, "error:");
    assert_contains(&out, "corruption detected at height 31");
    // the parent lookup at 31 fails, nothing below it is touched
    assert_eq!(node.chain.block_at_topo(10).unwrap(), lower);
}

#[test]
fn transient_failure_advises_retry() {
    let node = node(20, 0);
    node.chain.fail_reads_at(15);

    let err = repair_topo_index(node.chain.as_ref(), RepairPlan::full()).unwrap_err();
    assert!(err.retry_advised());
    assert_eq!(err.height(), 15);
}

#[test]
fn bounded_check_ignores_deep_divergence() {
    let node = node(300, 0);
    node.chain.corrupt_topo(50, BlockId::digest(b"deep"));

    let report =
        repair_topo_index(node.chain.as_ref(), RepairPlan::bounded(node.chain.height(), 100)).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.visited, 101);
}
