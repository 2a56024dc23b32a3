//! Authoritative walker state management utilities.

use grid_walkers_core::{CellCoord, WalkerColor, WalkerId, WalkerSnapshot};

/// Walker stored inside the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Walker {
    /// Identifier allocated by the registry.
    pub(crate) id: WalkerId,
    /// Cell the walker currently occupies.
    pub(crate) cell: CellCoord,
    /// Display color of the walker.
    pub(crate) color: WalkerColor,
    /// Set once the walker has no legal step left; never cleared afterwards.
    pub(crate) finished: bool,
}

impl Walker {
    pub(crate) fn snapshot(&self) -> WalkerSnapshot {
        WalkerSnapshot {
            id: self.id,
            cell: self.cell,
            color: self.color,
            finished: self.finished,
        }
    }
}

/// Ordered set of walkers plus identifier allocation.
///
/// Identifiers are never reused, not even across [`WalkerRegistry::clear`], so
/// callbacks that outlive a reset cannot address a newer walker.
#[derive(Debug)]
pub(crate) struct WalkerRegistry {
    walkers: Vec<Walker>,
    next_walker_id: u32,
}

impl WalkerRegistry {
    /// Creates an empty registry with a zeroed identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            walkers: Vec::new(),
            next_walker_id: 0,
        }
    }

    /// Inserts a walker and returns its freshly allocated identifier.
    ///
    /// Callers are responsible for keeping cells unique.
    pub(crate) fn add(&mut self, cell: CellCoord, color: WalkerColor) -> WalkerId {
        let id = WalkerId::new(self.next_walker_id);
        self.next_walker_id = self.next_walker_id.wrapping_add(1);
        self.walkers.push(Walker {
            id,
            cell,
            color,
            finished: false,
        });
        id
    }

    /// Removes and returns the first walker satisfying `predicate`.
    pub(crate) fn remove_matching<F>(&mut self, predicate: F) -> Option<Walker>
    where
        F: Fn(&Walker) -> bool,
    {
        let index = self.walkers.iter().position(predicate)?;
        Some(self.walkers.remove(index))
    }

    /// Returns the first walker satisfying `predicate`.
    pub(crate) fn find_matching<F>(&self, predicate: F) -> Option<&Walker>
    where
        F: Fn(&Walker) -> bool,
    {
        self.walkers.iter().find(|&walker| predicate(walker))
    }

    pub(crate) fn get_mut(&mut self, id: WalkerId) -> Option<&mut Walker> {
        self.walkers.iter_mut().find(|walker| walker.id == id)
    }

    pub(crate) fn at(&self, cell: CellCoord) -> Option<&Walker> {
        self.find_matching(|walker| walker.cell == cell)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Walker> {
        self.walkers.iter()
    }

    /// Number of walkers that have not finished.
    pub(crate) fn active_count(&self) -> usize {
        self.walkers.iter().filter(|walker| !walker.finished).count()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.walkers.is_empty()
    }

    /// Drops every walker while keeping the identifier counter.
    pub(crate) fn clear(&mut self) {
        self.walkers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: WalkerColor = WalkerColor::from_rgb(0xc8, 0x2a, 0x36);

    #[test]
    fn registry_starts_empty_with_zero_identifier() {
        let registry = WalkerRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.next_walker_id, 0);
    }

    #[test]
    fn remove_matching_takes_only_the_first_match() {
        let mut registry = WalkerRegistry::new();
        let first = registry.add(CellCoord::new(0, 0), RED);
        let second = registry.add(CellCoord::new(1, 0), RED);

        let removed = registry
            .remove_matching(|walker| walker.color == RED)
            .expect("a walker matches");

        assert_eq!(removed.id, first);
        assert_eq!(registry.iter().map(|walker| walker.id).collect::<Vec<_>>(), vec![second]);
    }

    #[test]
    fn remove_matching_without_match_is_a_no_op() {
        let mut registry = WalkerRegistry::new();
        let _ = registry.add(CellCoord::new(0, 0), RED);

        assert!(registry
            .remove_matching(|walker| walker.cell == CellCoord::new(5, 5))
            .is_none());
        assert_eq!(registry.iter().count(), 1);
    }

    #[test]
    fn identifiers_survive_clear() {
        let mut registry = WalkerRegistry::new();
        let first = registry.add(CellCoord::new(0, 0), RED);
        registry.clear();
        let second = registry.add(CellCoord::new(0, 0), RED);

        assert_ne!(first, second);
        assert_eq!(registry.at(CellCoord::new(0, 0)).map(|walker| walker.id), Some(second));
    }

    #[test]
    fn active_count_skips_finished_walkers() {
        let mut registry = WalkerRegistry::new();
        let first = registry.add(CellCoord::new(0, 0), RED);
        let _ = registry.add(CellCoord::new(2, 0), RED);
        registry.get_mut(first).expect("present").finished = true;

        assert_eq!(registry.active_count(), 1);
    }
}
