//! Single-writer publication point for telemetry snapshots.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::domain::TelemetrySnapshot;

/// Holds the latest [`TelemetrySnapshot`].
///
/// The sampler replaces the whole value in one atomic pointer swap; readers
/// get an `Arc` to a complete snapshot and never observe a partial write.
#[derive(Debug, Clone)]
pub struct SnapshotCell {
    current: Arc<ArcSwap<TelemetrySnapshot>>,
}

impl SnapshotCell {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(TelemetrySnapshot::empty())),
        }
    }

    pub fn publish(&self, snapshot: TelemetrySnapshot) {
        self.current.store(Arc::new(snapshot));
    }

    #[must_use]
    pub fn load(&self) -> Arc<TelemetrySnapshot> {
        self.current.load_full()
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_keep_their_snapshot_after_publish() {
        let cell = SnapshotCell::new();
        let before = cell.load();

        cell.publish(TelemetrySnapshot {
            our_height: 42,
            ..TelemetrySnapshot::empty()
        });

        assert_eq!(before.our_height, 0);
        assert_eq!(cell.load().our_height, 42);
    }
}
