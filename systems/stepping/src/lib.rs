#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Random-walk stepping system that proposes the next move for queued walkers.
//!
//! A walker may move to any axis-adjacent cell inside the grid that it has not
//! previously departed from. When no such cell exists the walker is reported as
//! finished. The choice among legal candidates is uniform and drawn from an
//! injected random source so runs can be replayed.

use grid_walkers_core::{
    CellCoord, Command, Direction, Event, GridGeometry, StepHistoryView, WalkerId, WalkerView,
};
use rand::{seq::SliceRandom, Rng};

/// Legal move available to a walker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepChoice {
    /// Cell the walker would move onto.
    pub next: CellCoord,
    /// Direction of travel toward `next`.
    pub direction: Direction,
}

/// Enumerates every legal move for `owner` standing on `cell`.
///
/// Candidates leave in [`Direction::ALL`] order. A candidate is dropped when it
/// lies outside the grid or when `owner` has a history record departing from it.
#[must_use]
pub fn legal_steps(
    cell: CellCoord,
    owner: WalkerId,
    geometry: &GridGeometry,
    history: StepHistoryView<'_>,
) -> Vec<StepChoice> {
    Direction::ALL
        .into_iter()
        .filter_map(|direction| {
            geometry
                .neighbor(cell, direction)
                .map(|next| StepChoice { next, direction })
        })
        .filter(|choice| !history.departed_from(owner, choice.next))
        .collect()
}

/// Picks one legal move uniformly at random, or `None` when the walker is stuck.
#[must_use]
pub fn choose_next_step<R>(
    cell: CellCoord,
    owner: WalkerId,
    geometry: &GridGeometry,
    history: StepHistoryView<'_>,
    rng: &mut R,
) -> Option<StepChoice>
where
    R: Rng + ?Sized,
{
    legal_steps(cell, owner, geometry, history)
        .choose(rng)
        .copied()
}

/// Pure system that answers `WalkerQueued` events with step commands.
#[derive(Debug)]
pub struct Stepper<R> {
    rng: R,
}

impl<R> Stepper<R>
where
    R: Rng,
{
    /// Creates a stepper drawing its choices from `rng`.
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Consumes world events and immutable views to emit step commands.
    ///
    /// Each queued walker yields exactly one command: a `BeginStep` toward a
    /// randomly chosen legal cell, or `FinishWalker` when none remains. Queued
    /// walkers missing from the view or already finished are skipped.
    pub fn handle(
        &mut self,
        events: &[Event],
        walker_view: &WalkerView,
        history_view: StepHistoryView<'_>,
        geometry: &GridGeometry,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            let Event::WalkerQueued { walker } = event else {
                continue;
            };
            let Some(snapshot) = walker_view.get(*walker) else {
                continue;
            };
            if snapshot.finished {
                continue;
            }

            match choose_next_step(
                snapshot.cell,
                snapshot.id,
                geometry,
                history_view,
                &mut self.rng,
            ) {
                Some(choice) => out.push(Command::BeginStep {
                    walker: snapshot.id,
                    direction: choice.direction,
                }),
                None => out.push(Command::FinishWalker {
                    walker: snapshot.id,
                }),
            }
        }
    }
}
