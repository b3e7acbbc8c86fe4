//! Status line rendering.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use owo_colors::OwoColorize;
use tracing::debug;

use crate::application::context::{NetworkMode, NodeContext};
use crate::domain::{format, TelemetrySnapshot};

/// Default redraw check period.
pub const RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// Peer count at or below which the node is considered poorly connected.
pub const LOW_PEER_COUNT: u64 = 8;

/// Where the rendered status line goes.
pub trait StatusSink: Send + Sync {
    fn show(&self, line: &str);
}

/// Inputs to [`render_status`].
#[derive(Debug, Clone, Copy)]
pub struct StatusView<'a> {
    pub snapshot: &'a TelemetrySnapshot,
    pub operator: &'a str,
    pub network: NetworkMode,
    pub only_trusted: bool,
    /// Turtle state carried over from the previous render.
    pub turtle: bool,
}

/// A rendered status line and the resulting turtle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub turtle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Urgency {
    Normal,
    Warning,
    Alert,
}

fn paint(text: &str, urgency: Urgency) -> String {
    match urgency {
        Urgency::Normal => text.green().to_string(),
        Urgency::Warning => text.yellow().to_string(),
        Urgency::Alert => text.red().to_string(),
    }
}

/// Derive the status line from a snapshot.
///
/// Being behind the best peer is a warning and enables turtle mode; being
/// ahead is an alert and clears it. No peers is an alert and clears turtle
/// mode; a low peer count is a warning and enables it.
#[must_use]
pub fn render_status(view: &StatusView<'_>) -> StatusLine {
    let s = view.snapshot;
    let mut turtle = view.turtle;

    let height_urgency = match s.our_height.cmp(&s.best_peer_height) {
        std::cmp::Ordering::Less => {
            turtle = true;
            Urgency::Warning
        }
        std::cmp::Ordering::Greater => {
            turtle = false;
            Urgency::Alert
        }
        std::cmp::Ordering::Equal => Urgency::Normal,
    };

    let peer_urgency = if s.peer_count < 1 {
        turtle = false;
        Urgency::Alert
    } else if s.peer_count <= LOW_PEER_COUNT {
        turtle = true;
        Urgency::Warning
    } else {
        Urgency::Normal
    };

    let mut marker = String::new();
    if view.only_trusted {
        marker = format!(" ({})", "Trusted Mode".red());
        if turtle {
            marker.push_str(" (!)");
        }
    } else if turtle {
        marker = format!(" ({})", "Turtle".red());
    }

    let name = if view.operator.is_empty() {
        "DAGD".bold().green().to_string()
    } else {
        format!("{} ({}-mod)", "DAGD".bold().green(), view.operator.red())
    };

    let heights = paint(
        &format!(
            "{}/{} [{}/{}]",
            s.our_height, s.topo_height, s.best_peer_height, s.best_peer_topo_height
        ),
        height_urgency,
    );
    let peers = paint(
        &format!("P {}/{}", s.whitelisted_peer_count, s.peer_count),
        peer_urgency,
    );
    let good = s.blocks_minted;
    let rest = format!(
        "TXp {}:{} NW {} >MN {} [{}/{}]",
        s.mempool_tx_count,
        s.regpool_tx_count,
        format::hashrate(s.network_hashrate),
        s.miner_count,
        good.saturating_sub(s.own_orphan_count),
        good,
    );
    let network = format!(
        "{} {} ({:.1}%)",
        view.network.label().red(),
        s.miniblock_count,
        s.network_loss_percent
    );

    StatusLine {
        text: format!(
            "{name}:{marker} {heights} {peers} {} {network} >> ",
            rest.green()
        ),
        turtle,
    }
}

/// Fields whose change triggers a redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderKey {
    pub our_height: i64,
    pub best_peer_height: i64,
    pub peer_count: u64,
    pub topo_height: i64,
    pub mempool_tx_count: usize,
    pub regpool_tx_count: usize,
    /// Wall-clock second, so the line refreshes at least once a second.
    pub second: i64,
}

impl RenderKey {
    #[must_use]
    pub const fn of(snapshot: &TelemetrySnapshot, second: i64) -> Self {
        Self {
            our_height: snapshot.our_height,
            best_peer_height: snapshot.best_peer_height,
            peer_count: snapshot.peer_count,
            topo_height: snapshot.topo_height,
            mempool_tx_count: snapshot.mempool_tx_count,
            regpool_tx_count: snapshot.regpool_tx_count,
            second,
        }
    }
}

/// Redraws the status line whenever the latest snapshot changes.
pub struct StatusRenderer {
    ctx: NodeContext,
    sink: Arc<dyn StatusSink>,
    interval: Duration,
    last: Option<RenderKey>,
}

impl StatusRenderer {
    #[must_use]
    pub fn new(ctx: NodeContext, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            ctx,
            sink,
            interval: RENDER_INTERVAL,
            last: None,
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Redraw if anything relevant changed since the last draw. Returns
    /// whether a redraw happened.
    pub fn poll(&mut self, second: i64) -> bool {
        let snapshot = self.ctx.snapshot.load();
        let key = RenderKey::of(&snapshot, second);
        if self.last == Some(key) {
            return false;
        }

        let config = self.ctx.config.snapshot();
        let line = render_status(&StatusView {
            snapshot: &snapshot,
            operator: &config.operator_name,
            network: self.ctx.env.network,
            only_trusted: config.only_trusted,
            turtle: self.ctx.counters.turtle(),
        });
        self.ctx.counters.set_turtle(line.turtle);
        self.sink.show(&line.text);
        self.last = Some(key);
        true
    }

    pub async fn run(mut self) {
        loop {
            if self.ctx.shutdown.is_fired() {
                break;
            }
            self.poll(Utc::now().timestamp());
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = self.ctx.shutdown.wait() => {}
            }
        }
        debug!("Status renderer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(our: i64, best: i64, peers: u64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            our_height: our,
            best_peer_height: best,
            peer_count: peers,
            ..TelemetrySnapshot::empty()
        }
    }

    fn render(s: &TelemetrySnapshot, only_trusted: bool, turtle: bool) -> StatusLine {
        render_status(&StatusView {
            snapshot: s,
            operator: "ops",
            network: NetworkMode::Mainnet,
            only_trusted,
            turtle,
        })
    }

    #[test]
    fn behind_best_peer_enables_turtle() {
        let line = render(&snapshot(10, 12, 20), false, false);
        assert!(line.turtle);
        assert!(line.text.contains("Turtle"));
        assert!(line.text.contains(&"10/0 [12/0]".yellow().to_string()));
    }

    #[test]
    fn ahead_of_best_peer_is_alert() {
        let line = render(&snapshot(13, 12, 20), false, true);
        assert!(!line.turtle);
        assert!(line.text.contains(&"13/0 [12/0]".red().to_string()));
    }

    #[test]
    fn in_sync_keeps_previous_turtle_state() {
        assert!(render(&snapshot(12, 12, 20), false, true).turtle);
        assert!(!render(&snapshot(12, 12, 20), false, false).turtle);
    }

    #[test]
    fn no_peers_is_alert_and_clears_turtle() {
        let line = render(&snapshot(12, 12, 0), false, true);
        assert!(!line.turtle);
        assert!(line.text.contains(&"P 0/0".red().to_string()));
    }

    #[test]
    fn few_peers_is_warning() {
        let line = render(&snapshot(12, 12, 8), false, false);
        assert!(line.turtle);
        assert!(line.text.contains(&"P 0/8".yellow().to_string()));
    }

    #[test]
    fn trusted_mode_marker_flags_turtle() {
        let line = render(&snapshot(10, 12, 20), true, false);
        assert!(line.text.contains("Trusted Mode"));
        assert!(line.text.contains("(!)"));
        assert!(!line.text.contains("Turtle"));
    }

    #[test]
    fn render_key_tracks_wall_clock_second() {
        let s = snapshot(1, 1, 1);
        assert_eq!(RenderKey::of(&s, 5), RenderKey::of(&s, 5));
        assert_ne!(RenderKey::of(&s, 5), RenderKey::of(&s, 6));
    }

    // ------------------------------------------------------------------------
    // StatusRenderer
    // ------------------------------------------------------------------------

    #[derive(Default)]
    struct RecordingSink {
        lines: parking_lot::Mutex<Vec<String>>,
    }

    impl StatusSink for RecordingSink {
        fn show(&self, line: &str) {
            self.lines.lock().push(line.to_string());
        }
    }

    #[test]
    fn redraws_only_when_key_changes() {
        let node = crate::testkit::TestNode::builder().blocks(3).peers(10).build();
        node.sample();
        let sink = Arc::new(RecordingSink::default());
        let mut renderer = StatusRenderer::new(node.ctx.clone(), sink.clone());

        assert!(renderer.poll(100));
        assert!(!renderer.poll(100));
        assert!(renderer.poll(101));

        node.chain.extend(1);
        node.sample();
        assert!(renderer.poll(101));
        assert_eq!(sink.lines.lock().len(), 3);
        assert!(crate::testkit::plain(&sink.lines.lock()[2]).contains("4/4 [3/3]"));
    }

    #[test]
    fn turtle_state_carries_between_renders() {
        let node = crate::testkit::TestNode::builder().blocks(3).peers(2).build();
        node.sample();
        let sink = Arc::new(RecordingSink::default());
        let mut renderer = StatusRenderer::new(node.ctx.clone(), sink);

        renderer.poll(1);
        assert!(node.ctx.counters.turtle());
    }
}
