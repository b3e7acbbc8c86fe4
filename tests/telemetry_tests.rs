//! Snapshot publication under concurrent readers and end-to-end sampling.

mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use dagd::application::telemetry::{render_status, SnapshotCell, StatusView};
use dagd::domain::TelemetrySnapshot;
use dagd::testkit::plain;

use support::node;

fn coherent(i: i64) -> TelemetrySnapshot {
    TelemetrySnapshot {
        our_height: i,
        best_peer_height: i,
        topo_height: i,
        peer_count: u64::try_from(i).unwrap(),
        mempool_tx_count: usize::try_from(i).unwrap(),
        ..TelemetrySnapshot::empty()
    }
}

#[test]
fn readers_never_see_fields_from_two_samples() {
    let cell = SnapshotCell::new();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cell = cell.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut last = 0;
                while !done.load(Ordering::Acquire) {
                    let s = cell.load();
                    assert_eq!(s.our_height, s.best_peer_height);
                    assert_eq!(s.our_height, s.topo_height);
                    assert_eq!(s.peer_count, u64::try_from(s.our_height).unwrap());
                    assert_eq!(s.mempool_tx_count, usize::try_from(s.our_height).unwrap());
                    assert!(s.our_height >= last, "published heights only grow");
                    last = s.our_height;
                }
            })
        })
        .collect();

    for i in 1..=20_000 {
        cell.publish(coherent(i));
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(cell.load().our_height, 20_000);
}

#[test]
fn sampled_node_renders_its_heights() {
    let node = node(30, 2);
    node.sample();

    let snapshot = node.ctx.snapshot.load();
    assert_eq!(snapshot.our_height, 30);
    assert_eq!(snapshot.best_peer_height, 30);
    assert_eq!(snapshot.peer_count, 2);

    let line = render_status(&StatusView {
        snapshot: &snapshot,
        operator: "",
        network: node.ctx.env.network,
        only_trusted: false,
        turtle: false,
    });
    let text = plain(&line.text);
    assert!(text.contains("30/30 [30/"), "{text}");
    assert!(text.contains("P 0/2"), "{text}");
    // two peers is a low count
    assert!(line.turtle);
}
