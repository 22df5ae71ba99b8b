//! Selection set and the best-effort bulk runner

use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::data::record::RecordId;

/// Identifiers ticked while selection mode is on.
///
/// Filtering does not prune the set; use [`Selection::prune_to`] to drop
/// identifiers that are no longer in view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<RecordId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: RecordId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.ids.iter().copied().collect()
    }

    /// True when `view` is non-empty and every id in it is selected
    pub fn covers(&self, view: &[RecordId]) -> bool {
        !view.is_empty() && view.iter().all(|id| self.ids.contains(id))
    }

    /// Header checkbox: select the whole view, or deselect it when it is
    /// already fully selected
    pub fn toggle_all(&mut self, view: &[RecordId]) {
        if self.covers(view) {
            for id in view {
                self.ids.remove(id);
            }
        } else {
            self.ids.extend(view.iter().copied());
        }
    }

    /// Keep only identifiers present in `view`
    pub fn prune_to(&mut self, view: &[RecordId]) {
        let keep: BTreeSet<RecordId> = view.iter().copied().collect();
        let before = self.ids.len();
        self.ids.retain(|id| keep.contains(id));
        debug!("Pruned selection from {} to {}", before, self.ids.len());
    }
}

/// Aggregate result of a bulk operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

impl BulkOutcome {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Apply `op` to each id in turn. A failure is counted and the loop moves
/// on; nothing aborts the batch.
pub fn run_bulk<F>(label: &str, ids: &[RecordId], mut op: F) -> BulkOutcome
where
    F: FnMut(RecordId) -> Result<()>,
{
    let mut outcome = BulkOutcome::default();
    for &id in ids {
        match op(id) {
            Ok(()) => outcome.succeeded += 1,
            Err(e) => {
                warn!("{} failed for record {}: {:#}", label, id, e);
                outcome.failed += 1;
            }
        }
    }
    info!(
        "{}: {} succeeded, {} failed",
        label, outcome.succeeded, outcome.failed
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_toggle_and_clear() {
        let mut s = Selection::new();
        s.toggle(1);
        s.toggle(2);
        s.toggle(1);
        assert_eq!(s.ids(), vec![2]);
        s.clear();
        assert!(s.is_empty());
    }

    #[test]
    fn test_toggle_all() {
        let mut s = Selection::new();
        s.toggle(9);
        s.toggle_all(&[1, 2, 3]);
        assert_eq!(s.ids(), vec![1, 2, 3, 9]);
        assert!(s.covers(&[1, 2, 3]));
        s.toggle_all(&[1, 2, 3]);
        assert_eq!(s.ids(), vec![9]);
        assert!(!s.covers(&[]));
    }

    #[test]
    fn test_prune_to() {
        let mut s = Selection::new();
        s.toggle_all(&[1, 2, 3]);
        s.prune_to(&[2, 3, 4]);
        assert_eq!(s.ids(), vec![2, 3]);
    }

    #[test]
    fn test_run_bulk_counts_independently() {
        let mut calls = Vec::new();
        let outcome = run_bulk("status", &[1, 2, 3, 4], |id| {
            calls.push(id);
            if id % 2 == 0 {
                Err(anyhow!("boom"))
            } else {
                Ok(())
            }
        });
        assert_eq!(calls, vec![1, 2, 3, 4]);
        assert_eq!(outcome, BulkOutcome { succeeded: 2, failed: 2 });
        assert_eq!(outcome.attempted(), 4);
    }
}
