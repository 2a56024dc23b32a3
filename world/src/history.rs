//! Append-mostly log of the steps taken during a run.

use std::time::Duration;

use grid_walkers_core::{CellCoord, StepHistoryView, StepRecord, WalkerId};

#[derive(Debug, Default)]
pub(crate) struct StepHistory {
    records: Vec<StepRecord>,
}

impl StepHistory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    /// Removes every record satisfying `predicate`, returning how many were dropped.
    pub(crate) fn remove_matching<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&StepRecord) -> bool,
    {
        let before = self.records.len();
        self.records.retain(|record| !predicate(record));
        before - self.records.len()
    }

    pub(crate) fn filter<F>(&self, predicate: F) -> impl Iterator<Item = &StepRecord>
    where
        F: Fn(&StepRecord) -> bool,
    {
        self.records.iter().filter(move |&record| predicate(record))
    }

    pub(crate) fn has_pending_for(&self, owner: WalkerId) -> bool {
        self.filter(|record| record.is_pending() && record.owner() == owner)
            .next()
            .is_some()
    }

    /// Marks the pending record identified by `(from, to, owner)` as completed.
    ///
    /// Any earlier completed record over the same unordered edge is dropped first
    /// so only the latest traversal is drawn. Returns `None` when no pending
    /// record matches.
    pub(crate) fn complete(
        &mut self,
        from: CellCoord,
        to: CellCoord,
        owner: WalkerId,
        at: Duration,
    ) -> Option<StepRecord> {
        let index = self
            .records
            .iter()
            .position(|record| record.is_pending() && record.matches(from, to, owner))?;
        let pending = self.records.remove(index);
        let edge = pending.edge();
        let _ = self.remove_matching(|record| !record.is_pending() && record.edge() == edge);

        let completed = pending.completed(at);
        self.record(completed);
        Some(completed)
    }

    pub(crate) fn view(&self) -> StepHistoryView<'_> {
        StepHistoryView::new(&self.records)
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}
