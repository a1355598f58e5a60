//! Shared fleet state: the current and previous snapshot maps.
//!
//! The poller is the only writer. Each completed round replaces the whole
//! [`FleetView`] under a short write lock, so readers either see the old
//! round or the new one, never a mix.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::engine::SnapshotMap;
use crate::rig::RigSnapshot;

/// An immutable view of the fleet after one completed round.
#[derive(Debug, Clone, Default)]
pub struct FleetView {
    /// Snapshots from the most recent completed round.
    pub current: Arc<SnapshotMap>,
    /// Snapshots from the round before that.
    pub previous: Arc<SnapshotMap>,
    /// Number of completed rounds since startup.
    pub round: u64,
    /// When the most recent round completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl FleetView {
    /// Current snapshot of a rig, if it has been polled.
    pub fn rig(&self, name: &str) -> Option<&RigSnapshot> {
        self.current.get(name)
    }
}

/// Single-writer, multi-reader holder of the latest [`FleetView`].
#[derive(Debug, Default)]
pub struct FleetState {
    view: RwLock<Arc<FleetView>>,
}

impl FleetState {
    /// Empty state: no rounds completed.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest published view.
    pub fn load(&self) -> Arc<FleetView> {
        let guard = self.view.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publish a completed round: the current map becomes previous and
    /// `next` becomes current, in one swap.
    pub fn commit(&self, next: SnapshotMap, completed_at: DateTime<Utc>) -> Arc<FleetView> {
        let mut guard = self.view.write().unwrap_or_else(PoisonError::into_inner);
        let view = Arc::new(FleetView {
            previous: Arc::clone(&guard.current),
            current: Arc::new(next),
            round: guard.round.saturating_add(1),
            completed_at: Some(completed_at),
        });
        *guard = Arc::clone(&view);
        view
    }
}
