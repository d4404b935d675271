//! Policies deciding whether a tick folds into the previous history entry

use std::collections::BTreeSet;

use chrono::Duration;
use tracing::trace;

use crate::change::Changeset;

/// Decides whether a freshly built changeset joins the latest one
///
/// Declining is always safe; merging only reduces the number of undo steps.
pub trait MergePolicy<S> {
    /// Return true to fold `incoming` into `latest`
    fn try_merge(&self, latest: &Changeset<S>, incoming: &Changeset<S>) -> bool;

    /// Get policy name for debugging
    fn name(&self) -> &str;
}

/// Policy that never merges: one history entry per non-empty tick
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverMerge;

impl<S> MergePolicy<S> for NeverMerge {
    fn try_merge(&self, _latest: &Changeset<S>, _incoming: &Changeset<S>) -> bool {
        false
    }

    fn name(&self) -> &str {
        "never"
    }
}

/// Coalesces rapid edits of the same objects, e.g. a dragged slider
///
/// Merges when both changesets touch exactly the same ids, neither creates nor
/// deletes anything, and the incoming one arrived within `window` of the
/// latest.
#[derive(Debug, Clone, Copy)]
pub struct TimeWindowMerge {
    window: Duration,
}

impl TimeWindowMerge {
    /// Create new time-window policy
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Create time-window policy with milliseconds
    ///
    /// Windows past what a `Duration` can hold are clamped to `Duration::MAX`.
    pub fn with_millis(millis: u64) -> Self {
        let window = i64::try_from(millis)
            .ok()
            .and_then(Duration::try_milliseconds)
            .unwrap_or(Duration::MAX);
        Self::new(window)
    }

    /// Configured window
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl<S> MergePolicy<S> for TimeWindowMerge {
    fn try_merge(&self, latest: &Changeset<S>, incoming: &Changeset<S>) -> bool {
        if latest.has_structural_changes() || incoming.has_structural_changes() {
            return false;
        }

        let elapsed = incoming.recorded_at() - latest.recorded_at();
        if elapsed < Duration::zero() || elapsed >= self.window {
            trace!(elapsed_ms = elapsed.num_milliseconds(), "outside merge window");
            return false;
        }

        let latest_ids: BTreeSet<_> = latest.ids().into_iter().collect();
        let incoming_ids: BTreeSet<_> = incoming.ids().into_iter().collect();
        latest_ids == incoming_ids
    }

    fn name(&self) -> &str {
        "time-window"
    }
}
