//! State synchronization via RFC 6902 JSON Patch.
//!
//! Large state objects updated in tight loops (progress trackers, task
//! lists) are shipped as incremental deltas; snapshots provide
//! resynchronization points at run boundaries and after errors.

use json_patch::Patch;
use serde_json::Value;

use crate::error::PatchError;
use crate::event::Event;

/// Compute the minimal JSON Patch transforming `previous` into `current`.
#[must_use]
pub fn diff(previous: &Value, current: &Value) -> Patch {
    json_patch::diff(previous, current)
}

/// Apply a JSON Patch to a state value, returning the patched state.
///
/// Pure: the input is cloned before patching, so a failing patch leaves the
/// caller's state untouched and is never partially applied.
///
/// # Errors
///
/// Returns [`PatchError::Apply`] when an operation references a nonexistent
/// path or a `test` operation fails.
pub fn apply(state: &Value, patch: &Patch) -> Result<Value, PatchError> {
    let mut next = state.clone();
    json_patch::patch(&mut next, &patch.0)?;
    Ok(next)
}

/// Tracks the last known state baseline and emits snapshot or delta events.
///
/// The synchronizer holds no mutable state beyond the baseline it was last
/// given; each run owns its own instance, so concurrent runs never share
/// state.
#[derive(Debug, Clone, Default)]
pub struct StateSynchronizer {
    baseline: Option<Value>,
}

impl StateSynchronizer {
    /// Create a synchronizer with no baseline.
    #[must_use]
    pub const fn new() -> Self {
        Self { baseline: None }
    }

    /// Create a synchronizer seeded with a known baseline.
    #[must_use]
    pub const fn with_baseline(baseline: Value) -> Self {
        Self {
            baseline: Some(baseline),
        }
    }

    /// The last known state, if any.
    #[must_use]
    pub const fn baseline(&self) -> Option<&Value> {
        self.baseline.as_ref()
    }

    /// Wrap the full state in a snapshot event and reset the baseline.
    pub fn snapshot(&mut self, state: &Value) -> Event {
        self.baseline = Some(state.clone());
        Event::state_snapshot(state.clone())
    }

    /// Diff `current` against the baseline and advance it.
    ///
    /// Returns `None` when nothing changed — callers skip emission rather
    /// than send a no-op delta. With no baseline yet, falls back to a full
    /// snapshot so the client always has a state to patch against.
    pub fn delta(&mut self, current: &Value) -> Option<Event> {
        let Some(previous) = &self.baseline else {
            return Some(self.snapshot(current));
        };
        let patch = diff(previous, current);
        self.baseline = Some(current.clone());
        if patch.0.is_empty() {
            None
        } else {
            Some(Event::state_delta(patch))
        }
    }
}
