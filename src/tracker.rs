use crate::collectors::meminfo::{FieldError, RawFields};
use crate::models::{ChangeResult, MemSnapshot, TrackerState};
use chrono::Local;
use log::{debug, warn};

fn field(raw: &RawFields, label: &str) -> Result<u64, FieldError> {
    raw.get(label)
        .copied()
        .ok_or_else(|| FieldError::NotFound(label.to_string()))
}

impl TryFrom<&RawFields> for MemSnapshot {
    type Error = FieldError;

    fn try_from(raw: &RawFields) -> Result<Self, Self::Error> {
        Ok(MemSnapshot::new(
            field(raw, "MemTotal")?,
            field(raw, "MemFree")?,
            field(raw, "Buffers")?,
            field(raw, "Cached")?,
            field(raw, "SwapTotal")?,
            field(raw, "SwapFree")?,
        ))
    }
}

/// Keeps the last accepted snapshot and decides whether a new sample is worth
/// a redraw.
#[derive(Debug, Default)]
pub struct SnapshotTracker {
    last: Option<MemSnapshot>,
    fresh: Option<MemSnapshot>,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TrackerState {
        match self.last {
            Some(_) => TrackerState::Tracking,
            None => TrackerState::Uninitialized,
        }
    }

    pub fn last(&self) -> Option<&MemSnapshot> {
        self.last.as_ref()
    }

    pub fn fresh(&self) -> Option<&MemSnapshot> {
        self.fresh.as_ref()
    }

    /// Folds a raw field set into a new snapshot. Nothing is mutated when a
    /// label is missing.
    pub fn update(&mut self, raw: &RawFields) -> Result<ChangeResult, FieldError> {
        let snapshot = MemSnapshot::try_from(raw)?;
        if !snapshot.is_consistent() {
            warn!(
                "Source reports free above total (mem {}/{} kB, swap {}/{} kB), clamping used to zero",
                snapshot.mem_free, snapshot.mem_total, snapshot.swap_free, snapshot.swap_total
            );
        }

        self.fresh = Some(snapshot);
        let changed = self.last != Some(snapshot);
        if changed {
            debug!("Snapshot changed: {:?}", snapshot);
            self.last = Some(snapshot);
        }

        Ok(ChangeResult {
            changed,
            snapshot,
            sampled_at: Local::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(values: [u64; 6]) -> RawFields {
        crate::collectors::meminfo::MEMINFO_LABELS
            .iter()
            .zip(values)
            .map(|(label, value)| (label.to_string(), value))
            .collect()
    }

    #[test]
    fn test_first_update_is_changed_then_idle() {
        let mut tracker = SnapshotTracker::new();
        assert_eq!(tracker.state(), TrackerState::Uninitialized);

        let fields = raw([1000, 400, 10, 20, 500, 500]);
        let first = tracker.update(&fields).unwrap();
        assert!(first.changed);
        assert_eq!(tracker.state(), TrackerState::Tracking);

        let second = tracker.update(&fields).unwrap();
        assert!(!second.changed);
        assert_eq!(second.snapshot, first.snapshot);
    }

    #[test]
    fn test_first_update_with_all_zero_is_changed() {
        let mut tracker = SnapshotTracker::new();
        assert!(tracker.update(&raw([0; 6])).unwrap().changed);
    }

    #[test]
    fn test_any_single_field_change_is_detected() {
        let base = [1000, 400, 10, 20, 500, 500];
        for index in 0..base.len() {
            let mut tracker = SnapshotTracker::new();
            tracker.update(&raw(base)).unwrap();

            let mut altered = base;
            altered[index] -= 1;
            let result = tracker.update(&raw(altered)).unwrap();
            assert!(result.changed, "change in field {} not detected", index);
            assert_eq!(tracker.last(), Some(&result.snapshot));
        }
    }

    #[test]
    fn test_last_kept_when_unchanged() {
        let mut tracker = SnapshotTracker::new();
        tracker.update(&raw([1000, 400, 10, 20, 500, 500])).unwrap();
        tracker.update(&raw([1000, 399, 10, 20, 500, 500])).unwrap();
        let result = tracker.update(&raw([1000, 399, 10, 20, 500, 500])).unwrap();
        assert!(!result.changed);
        assert_eq!(tracker.last().unwrap().mem_free, 399);
        assert_eq!(tracker.fresh().unwrap().mem_free, 399);
    }

    #[test]
    fn test_missing_label_leaves_state_untouched() {
        let mut tracker = SnapshotTracker::new();
        let fields = raw([1000, 400, 10, 20, 500, 500]);
        tracker.update(&fields).unwrap();

        let mut partial = raw([1, 1, 1, 1, 1, 1]);
        partial.shift_remove("SwapFree");
        match tracker.update(&partial) {
            Err(FieldError::NotFound(label)) => assert_eq!(label, "SwapFree"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(tracker.last().unwrap().mem_total, 1000);
        assert_eq!(tracker.fresh().unwrap().mem_total, 1000);
    }

    #[test]
    fn test_derived_values_through_update() {
        let mut tracker = SnapshotTracker::new();
        let result = tracker.update(&raw([1000, 400, 0, 0, 500, 500])).unwrap();
        assert_eq!(result.snapshot.mem_used, 600);
        assert_eq!(result.snapshot.swap_used, 0);
    }
}
