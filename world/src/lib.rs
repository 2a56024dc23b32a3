#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grid Walkers.
//!
//! The world owns the walker registry, the step history, the FIFO queue of
//! walkers awaiting their next step, and the lifecycle state. Every mutation
//! goes through [`apply`], which gates the command on the current lifecycle
//! state and silently ignores anything that is not legal right now.

mod history;
mod registry;

use std::{collections::VecDeque, time::Duration};

use grid_walkers_core::{
    CellCoord, Command, Direction, Event, GridGeometry, LifecycleState, StepRecord, WalkerColor,
    WalkerId,
};
use tracing::{debug, trace};

use self::{history::StepHistory, registry::WalkerRegistry};

/// Represents the authoritative Grid Walkers world state.
#[derive(Debug)]
pub struct World {
    geometry: GridGeometry,
    state: LifecycleState,
    walkers: WalkerRegistry,
    history: StepHistory,
    step_queue: VecDeque<WalkerId>,
    clock: Duration,
}

impl World {
    /// Creates an empty world laid out on the provided geometry.
    #[must_use]
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            state: LifecycleState::NoWalker,
            walkers: WalkerRegistry::new(),
            history: StepHistory::new(),
            step_queue: VecDeque::new(),
            clock: Duration::ZERO,
        }
    }

    fn transition(&mut self, next: LifecycleState, out_events: &mut Vec<Event>) {
        if self.state == next {
            return;
        }
        debug!(from = ?self.state, to = ?next, "lifecycle transition");
        self.state = next;
        out_events.push(Event::LifecycleChanged { state: next });
    }

    fn editing_state(&self) -> LifecycleState {
        if self.walkers.is_empty() {
            LifecycleState::NoWalker
        } else {
            LifecycleState::AtLeastOneWalker
        }
    }

    fn is_queued(&self, walker: WalkerId) -> bool {
        self.step_queue.contains(&walker)
    }

    fn dequeue(&mut self, walker: WalkerId) {
        self.step_queue.retain(|queued| *queued != walker);
    }

    fn spawn_walker(&mut self, cell: CellCoord, color: WalkerColor, out_events: &mut Vec<Event>) {
        if !self.state.accepts_edits() {
            trace!(state = ?self.state, "spawn ignored outside editing");
            return;
        }
        if !self.geometry.contains(cell) || self.walkers.at(cell).is_some() {
            trace!(?cell, "spawn ignored for unavailable cell");
            return;
        }

        let walker = self.walkers.add(cell, color);
        out_events.push(Event::WalkerSpawned {
            walker,
            cell,
            color,
        });
        self.transition(LifecycleState::AtLeastOneWalker, out_events);
    }

    fn focus_removal(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.state != LifecycleState::AtLeastOneWalker || self.walkers.at(cell).is_none() {
            trace!(state = ?self.state, ?cell, "removal focus ignored");
            return;
        }
        self.transition(LifecycleState::RemovalPending { focus: cell }, out_events);
    }

    fn confirm_removal(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.state != (LifecycleState::RemovalPending { focus: cell }) {
            trace!(state = ?self.state, ?cell, "removal confirmation ignored");
            return;
        }

        if let Some(removed) = self.walkers.remove_matching(|walker| walker.cell == cell) {
            out_events.push(Event::WalkerRemoved {
                walker: removed.id,
                cell,
            });
        }
        let next = self.editing_state();
        self.transition(next, out_events);
    }

    fn cancel_removal(&mut self, out_events: &mut Vec<Event>) {
        if !matches!(self.state, LifecycleState::RemovalPending { .. }) {
            trace!(state = ?self.state, "removal cancel ignored");
            return;
        }
        let next = self.editing_state();
        self.transition(next, out_events);
    }

    fn start_run(&mut self, out_events: &mut Vec<Event>) {
        if self.state != LifecycleState::AtLeastOneWalker {
            trace!(state = ?self.state, "start ignored");
            return;
        }

        self.transition(LifecycleState::Running, out_events);
        let ready: Vec<WalkerId> = self
            .walkers
            .iter()
            .filter(|walker| !walker.finished)
            .map(|walker| walker.id)
            .collect();
        for walker in ready {
            self.step_queue.push_back(walker);
            out_events.push(Event::WalkerQueued { walker });
        }
    }

    fn pause_run(&mut self, out_events: &mut Vec<Event>) {
        if self.state != LifecycleState::Running {
            trace!(state = ?self.state, "pause ignored");
            return;
        }
        self.transition(LifecycleState::Paused, out_events);
    }

    fn resume_run(&mut self, out_events: &mut Vec<Event>) {
        if self.state != LifecycleState::Paused {
            trace!(state = ?self.state, "resume ignored");
            return;
        }
        self.transition(LifecycleState::Running, out_events);
        for walker in self.step_queue.iter().copied() {
            out_events.push(Event::WalkerQueued { walker });
        }
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        if !self.state.accepts_reset() {
            trace!(state = ?self.state, "reset ignored");
            return;
        }
        self.walkers.clear();
        self.history.clear();
        self.step_queue.clear();
        out_events.push(Event::RunReset);
        self.transition(LifecycleState::NoWalker, out_events);
    }

    fn begin_step(&mut self, walker: WalkerId, direction: Direction, out_events: &mut Vec<Event>) {
        if self.state != LifecycleState::Running || !self.is_queued(walker) {
            trace!(state = ?self.state, ?walker, "step request ignored");
            return;
        }
        if self.history.has_pending_for(walker) {
            trace!(?walker, "step request ignored while a step is in flight");
            return;
        }

        let Some(current) = self
            .walkers
            .find_matching(|candidate| candidate.id == walker && !candidate.finished)
        else {
            self.dequeue(walker);
            return;
        };
        let (from, color) = (current.cell, current.color);

        let Some(to) = self.geometry.neighbor(from, direction) else {
            trace!(?walker, ?direction, "step request leaves the grid");
            return;
        };
        if self.history.view().departed_from(walker, to) {
            trace!(?walker, ?to, "step request revisits a departed cell");
            return;
        }
        let Some(record) = StepRecord::pending(walker, color, from, to) else {
            return;
        };

        self.dequeue(walker);
        self.history.record(record);
        out_events.push(Event::StepStarted { record });
    }

    fn finish_walker(&mut self, walker: WalkerId, out_events: &mut Vec<Event>) {
        if self.state != LifecycleState::Running || !self.is_queued(walker) {
            trace!(state = ?self.state, ?walker, "finish request ignored");
            return;
        }
        self.dequeue(walker);

        let Some(finished) = self.walkers.get_mut(walker) else {
            return;
        };
        if finished.finished {
            return;
        }
        finished.finished = true;
        let cell = finished.cell;
        debug!(?walker, ?cell, "walker has no legal step left");
        out_events.push(Event::WalkerFinished { walker, cell });
    }

    fn complete_step(
        &mut self,
        from: CellCoord,
        to: CellCoord,
        owner: WalkerId,
        out_events: &mut Vec<Event>,
    ) {
        let Some(record) = self.history.complete(from, to, owner, self.clock) else {
            trace!(?owner, ?from, ?to, "stale completion ignored");
            return;
        };

        if let Some(walker) = self.walkers.get_mut(owner) {
            walker.cell = to;
        }
        debug!(?owner, ?from, ?to, "step completed");
        out_events.push(Event::StepCompleted { record });

        match self.state {
            LifecycleState::Running => {
                self.step_queue.push_back(owner);
                out_events.push(Event::WalkerQueued { walker: owner });
            }
            LifecycleState::Paused => self.step_queue.push_back(owner),
            _ => {}
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnWalker { cell, color } => world.spawn_walker(cell, color, out_events),
        Command::FocusRemoval { cell } => world.focus_removal(cell, out_events),
        Command::ConfirmRemoval { cell } => world.confirm_removal(cell, out_events),
        Command::CancelRemoval => world.cancel_removal(out_events),
        Command::StartRun => world.start_run(out_events),
        Command::PauseRun => world.pause_run(out_events),
        Command::ResumeRun => world.resume_run(out_events),
        Command::Reset => world.reset(out_events),
        Command::BeginStep { walker, direction } => world.begin_step(walker, direction, out_events),
        Command::FinishWalker { walker } => world.finish_walker(walker, out_events),
        Command::CompleteStep { from, to, owner } => {
            world.complete_step(from, to, owner, out_events)
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use grid_walkers_core::{
        CellCoord, GridGeometry, LifecycleState, StepHistoryView, WalkerId, WalkerView,
    };

    use super::World;

    /// Provides read-only access to the world's grid geometry.
    #[must_use]
    pub fn geometry(world: &World) -> &GridGeometry {
        &world.geometry
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle_state(world: &World) -> LifecycleState {
        world.state
    }

    /// Captures a read-only view of the walkers on the grid.
    #[must_use]
    pub fn walker_view(world: &World) -> WalkerView {
        WalkerView::from_snapshots(world.walkers.iter().map(|walker| walker.snapshot()).collect())
    }

    /// Returns the walker occupying the provided cell, if any.
    #[must_use]
    pub fn walker_at(world: &World, cell: CellCoord) -> Option<WalkerId> {
        world.walkers.at(cell).map(|walker| walker.id)
    }

    /// Number of walkers that have not finished.
    #[must_use]
    pub fn active_walker_count(world: &World) -> usize {
        world.walkers.active_count()
    }

    /// Exposes a read-only view of the step history.
    #[must_use]
    pub fn history_view(world: &World) -> StepHistoryView<'_> {
        world.history.view()
    }

    /// Walkers waiting for their next step, in queue order.
    #[must_use]
    pub fn queued_walkers(world: &World) -> Vec<WalkerId> {
        world.step_queue.iter().copied().collect()
    }

    /// Simulation time accumulated from tick commands.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_walkers_core::GridSettings;

    const BLUE: WalkerColor = WalkerColor::from_rgb(0x58, 0x47, 0xff);

    fn world(columns: u16, rows: u16) -> World {
        let geometry = GridGeometry::new(GridSettings {
            width: f32::from(columns) * 10.0,
            height: f32::from(rows) * 10.0,
            spacing: 10.0,
        })
        .expect("valid geometry");
        World::new(geometry)
    }

    fn spawn(world: &mut World, column: u16, row: u16) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnWalker {
                cell: CellCoord::new(column, row),
                color: BLUE,
            },
            &mut events,
        );
        events
    }

    #[test]
    fn first_spawn_enters_editing() {
        let mut world = world(3, 3);
        let events = spawn(&mut world, 1, 1);

        assert_eq!(
            events,
            vec![
                Event::WalkerSpawned {
                    walker: WalkerId::new(0),
                    cell: CellCoord::new(1, 1),
                    color: BLUE,
                },
                Event::LifecycleChanged {
                    state: LifecycleState::AtLeastOneWalker,
                },
            ]
        );
    }

    #[test]
    fn spawn_on_occupied_or_outside_cell_is_ignored() {
        let mut world = world(3, 3);
        let _ = spawn(&mut world, 1, 1);

        assert!(spawn(&mut world, 1, 1).is_empty());
        assert!(spawn(&mut world, 3, 0).is_empty());
        assert_eq!(query::walker_view(&world).len(), 1);
    }

    #[test]
    fn begin_step_requires_a_queued_walker() {
        let mut world = world(3, 3);
        let _ = spawn(&mut world, 0, 0);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::BeginStep {
                walker: WalkerId::new(0),
                direction: Direction::Right,
            },
            &mut events,
        );

        assert!(events.is_empty(), "walkers only step once the run starts");
    }

    #[test]
    fn begin_step_rejects_out_of_bounds_direction() {
        let mut world = world(3, 3);
        let _ = spawn(&mut world, 0, 0);
        let mut events = Vec::new();
        apply(&mut world, Command::StartRun, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::BeginStep {
                walker: WalkerId::new(0),
                direction: Direction::Up,
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert_eq!(query::queued_walkers(&world), vec![WalkerId::new(0)]);
    }

    #[test]
    fn completion_records_the_clock() {
        let mut world = world(3, 3);
        let _ = spawn(&mut world, 0, 0);
        let mut events = Vec::new();
        apply(&mut world, Command::StartRun, &mut events);
        apply(
            &mut world,
            Command::BeginStep {
                walker: WalkerId::new(0),
                direction: Direction::Down,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(300),
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::CompleteStep {
                from: CellCoord::new(0, 0),
                to: CellCoord::new(0, 1),
                owner: WalkerId::new(0),
            },
            &mut events,
        );

        let completed: Vec<_> = query::history_view(&world).completed().copied().collect();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].completed_at(), Some(Duration::from_millis(300)));
        assert_eq!(
            query::walker_view(&world).get(WalkerId::new(0)).map(|walker| walker.cell),
            Some(CellCoord::new(0, 1))
        );
        assert_eq!(
            events.last(),
            Some(&Event::WalkerQueued {
                walker: WalkerId::new(0)
            })
        );
    }
}
