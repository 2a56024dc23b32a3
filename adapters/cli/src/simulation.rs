//! Control-cycle driver wiring the world, the systems and the animator together.

use std::time::Duration;

use grid_walkers_core::{
    CellCoord, Command, Event, GridGeometry, LifecycleState, PixelPosition, WalkerId,
};
use grid_walkers_rendering::{
    Animator, Color, CompletedTransition, FrameInput, RenderingError, Scene, StatusPresentation,
    TracePresentation, WalkerPresentation,
};
use grid_walkers_system_lifecycle::{CellClick, ControlInput, Lifecycle};
use grid_walkers_system_stepping::Stepper;
use grid_walkers_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Final state of a walker reported by [`Simulation::summary`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WalkerOutcome {
    pub(crate) walker: WalkerId,
    pub(crate) cell: CellCoord,
    pub(crate) finished: bool,
}

/// Aggregate statistics about a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SimulationSummary {
    pub(crate) state: LifecycleState,
    pub(crate) clock: Duration,
    pub(crate) completed_steps: u64,
    pub(crate) walkers: Vec<WalkerOutcome>,
}

impl SimulationSummary {
    pub(crate) fn finished_count(&self) -> usize {
        self.walkers.iter().filter(|walker| walker.finished).count()
    }
}

/// Owns the authoritative world plus every system reacting to it.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    stepper: Stepper<ChaCha8Rng>,
    lifecycle: Lifecycle<ChaCha8Rng>,
    animator: Animator,
    completed_steps: u64,
}

impl Simulation {
    /// Creates an empty simulation; `seed` drives both walker colors and step choices.
    pub(crate) fn new(
        geometry: GridGeometry,
        step_duration: Duration,
        seed: u64,
    ) -> Result<Self, RenderingError> {
        Ok(Self {
            world: World::new(geometry),
            stepper: Stepper::new(ChaCha8Rng::seed_from_u64(seed)),
            lifecycle: Lifecycle::new(ChaCha8Rng::seed_from_u64(seed.rotate_left(32))),
            animator: Animator::new(step_duration)?,
            completed_steps: 0,
        })
    }

    /// Resolves a pointer position in scene pixels into lifecycle input.
    pub(crate) fn control_input(&self, input: FrameInput) -> ControlInput {
        let click = input.click.and_then(|position| {
            let cell = query::geometry(&self.world)
                .nearest_cell(PixelPosition::new(position.x, position.y))?;
            Some(CellClick {
                cell,
                occupied: query::walker_at(&self.world, cell).is_some(),
            })
        });
        ControlInput {
            click,
            key: input.key,
        }
    }

    /// Runs one control cycle: advances the clock, applies the input and
    /// reports finished transitions back to the world.
    pub(crate) fn advance(&mut self, dt: Duration, input: ControlInput) {
        self.run_commands(vec![Command::Tick { dt }]);

        let mut commands = Vec::new();
        self.lifecycle.handle(&[], input, &mut commands);
        self.run_commands(commands);

        let mut completed = Vec::new();
        self.animator.advance(dt, &mut completed);
        let commands = completed
            .into_iter()
            .map(|CompletedTransition { from, to, owner }| Command::CompleteStep {
                from,
                to,
                owner,
            })
            .collect();
        self.run_commands(commands);
    }

    /// Applies commands and feeds the resulting events to the systems until
    /// no system proposes anything further.
    fn run_commands(&mut self, commands: Vec<Command>) {
        let mut pending = commands;
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            pending = self.react(&events);
        }
    }

    fn react(&mut self, events: &[Event]) -> Vec<Command> {
        let mut commands = Vec::new();
        self.lifecycle.handle(events, ControlInput::default(), &mut commands);

        for event in events {
            match event {
                Event::StepStarted { record } => {
                    self.animator.start(record, query::geometry(&self.world));
                }
                Event::StepCompleted { .. } => {
                    self.completed_steps = self.completed_steps.saturating_add(1);
                }
                Event::RunReset => {
                    self.animator.clear();
                    self.completed_steps = 0;
                }
                _ => {}
            }
        }

        let walker_view = query::walker_view(&self.world);
        self.stepper.handle(
            events,
            &walker_view,
            query::history_view(&self.world),
            query::geometry(&self.world),
            &mut commands,
        );
        commands
    }

    /// Reports whether a run is under way and no walker can step any more.
    pub(crate) fn is_settled(&self) -> bool {
        matches!(
            query::lifecycle_state(&self.world),
            LifecycleState::Running | LifecycleState::Paused
        ) && query::active_walker_count(&self.world) == 0
            && self.animator.is_empty()
    }

    /// Captures the statistics of the current run.
    pub(crate) fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            state: query::lifecycle_state(&self.world),
            clock: query::clock(&self.world),
            completed_steps: self.completed_steps,
            walkers: query::walker_view(&self.world)
                .iter()
                .map(|walker| WalkerOutcome {
                    walker: walker.id,
                    cell: walker.cell,
                    finished: walker.finished,
                })
                .collect(),
        }
    }

    /// Rebuilds the dynamic part of the scene from the current state.
    pub(crate) fn populate_scene(&self, scene: &mut Scene) {
        scene.clear_dynamic();
        let geometry = query::geometry(&self.world);
        let to_vec = |cell: CellCoord| {
            let position = geometry.position(cell);
            glam::Vec2::new(position.x, position.y)
        };

        let history = query::history_view(&self.world);
        scene
            .traces
            .extend(history.completed().map(|record| TracePresentation {
                from: to_vec(record.from()),
                to: to_vec(record.to()),
                color: Color::from(record.color()).with_alpha(0.85),
            }));
        scene.in_flight.extend(history.pending().map(|record| {
            let from = to_vec(record.from());
            TracePresentation {
                from,
                to: self.animator.position_of(record.owner()).unwrap_or(from),
                color: Color::from(record.color()),
            }
        }));

        let state = query::lifecycle_state(&self.world);
        let walker_view = query::walker_view(&self.world);
        scene
            .walkers
            .extend(walker_view.iter().map(|walker| WalkerPresentation {
                walker: walker.id,
                position: self
                    .animator
                    .position_of(walker.id)
                    .unwrap_or_else(|| to_vec(walker.cell)),
                color: Color::from(walker.color),
                finished: walker.finished,
                focused: state == LifecycleState::RemovalPending { focus: walker.cell },
            }));

        scene.status = StatusPresentation {
            state,
            active_walkers: walker_view.active_count(),
            total_walkers: walker_view.len(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use grid_walkers_core::{ControlKey, GridSettings};
    use grid_walkers_rendering::GridPresentation;

    const FRAME: Duration = Duration::from_millis(50);

    fn fresh(seed: u64) -> (Simulation, GridGeometry) {
        let geometry = GridGeometry::new(GridSettings {
            width: 300.0,
            height: 300.0,
            spacing: 60.0,
        })
        .expect("valid geometry");
        let simulation =
            Simulation::new(geometry, Duration::from_millis(100), seed).expect("positive");
        (simulation, geometry)
    }

    fn click_at(simulation: &mut Simulation, geometry: &GridGeometry, column: u16, row: u16) {
        let position = geometry.position(CellCoord::new(column, row));
        let input = simulation.control_input(FrameInput {
            click: Some(Vec2::new(position.x, position.y)),
            key: None,
        });
        simulation.advance(Duration::ZERO, input);
    }

    fn press(simulation: &mut Simulation, key: ControlKey) {
        simulation.advance(
            Duration::ZERO,
            ControlInput {
                click: None,
                key: Some(key),
            },
        );
    }

    fn run_until_settled(simulation: &mut Simulation) -> u32 {
        let mut frames = 0;
        while !simulation.is_settled() {
            simulation.advance(FRAME, ControlInput::default());
            frames += 1;
            assert!(frames < 10_000, "simulation did not settle");
        }
        frames
    }

    #[test]
    fn clicks_resolve_to_cells_and_occupancy() {
        let (mut simulation, geometry) = fresh(1);
        click_at(&mut simulation, &geometry, 2, 3);

        let input = simulation.control_input(FrameInput {
            click: Some(Vec2::new(150.0, 210.0)),
            key: Some(ControlKey::Start),
        });

        assert_eq!(
            input.click,
            Some(CellClick {
                cell: CellCoord::new(2, 3),
                occupied: true,
            })
        );
        assert_eq!(input.key, Some(ControlKey::Start));
    }

    #[test]
    fn a_started_run_settles_with_every_walker_finished() {
        let (mut simulation, geometry) = fresh(5);
        click_at(&mut simulation, &geometry, 0, 0);
        click_at(&mut simulation, &geometry, 4, 4);
        press(&mut simulation, ControlKey::Start);

        let frames = run_until_settled(&mut simulation);
        let summary = simulation.summary();

        assert!(frames > 0);
        assert_eq!(summary.state, LifecycleState::Running);
        assert_eq!(summary.walkers.len(), 2);
        assert_eq!(summary.finished_count(), 2);
        assert!(summary.completed_steps >= 2);
    }

    #[test]
    fn same_seed_produces_the_same_run() {
        let run = |seed| {
            let (mut simulation, geometry) = fresh(seed);
            click_at(&mut simulation, &geometry, 1, 1);
            click_at(&mut simulation, &geometry, 3, 2);
            press(&mut simulation, ControlKey::Start);
            let _ = run_until_settled(&mut simulation);
            simulation.summary()
        };

        assert_eq!(run(77), run(77));
    }

    #[test]
    fn pause_freezes_walkers_after_in_flight_steps_land() {
        let (mut simulation, geometry) = fresh(3);
        click_at(&mut simulation, &geometry, 2, 2);
        press(&mut simulation, ControlKey::Start);
        simulation.advance(FRAME, ControlInput::default());
        press(&mut simulation, ControlKey::Pause);

        simulation.advance(Duration::from_millis(200), ControlInput::default());
        let landed = simulation.summary();
        assert_eq!(landed.completed_steps, 1);

        for _ in 0..20 {
            simulation.advance(FRAME, ControlInput::default());
        }
        assert_eq!(
            simulation.summary(),
            SimulationSummary {
                clock: landed.clock + FRAME * 20,
                ..landed.clone()
            }
        );
        assert_ne!(landed.walkers[0].cell, CellCoord::new(2, 2));

        press(&mut simulation, ControlKey::Resume);
        simulation.advance(Duration::from_millis(200), ControlInput::default());
        assert!(simulation.summary().completed_steps >= 2);
    }

    #[test]
    fn reset_discards_in_flight_transitions() {
        let (mut simulation, geometry) = fresh(9);
        click_at(&mut simulation, &geometry, 2, 2);
        press(&mut simulation, ControlKey::Start);
        simulation.advance(FRAME, ControlInput::default());
        press(&mut simulation, ControlKey::Reset);

        simulation.advance(Duration::from_secs(1), ControlInput::default());
        let summary = simulation.summary();

        assert_eq!(summary.state, LifecycleState::NoWalker);
        assert!(summary.walkers.is_empty());
        assert_eq!(summary.completed_steps, 0);
        assert!(simulation.animator.is_empty());
    }

    #[test]
    fn scene_reflects_focus_and_in_flight_steps() {
        let (mut simulation, geometry) = fresh(4);
        let mut scene = Scene::new(GridPresentation::from_geometry(
            &geometry,
            Color::from_rgb_u8(90, 90, 90),
        ));
        click_at(&mut simulation, &geometry, 1, 1);
        click_at(&mut simulation, &geometry, 1, 1);

        simulation.populate_scene(&mut scene);
        assert_eq!(scene.walkers.len(), 1);
        assert!(scene.walkers[0].focused);
        assert_eq!(scene.status.state.label(), "Removing");

        press(&mut simulation, ControlKey::Cancel);
        press(&mut simulation, ControlKey::Start);
        simulation.advance(FRAME, ControlInput::default());
        simulation.populate_scene(&mut scene);

        assert!(!scene.walkers[0].focused);
        assert_eq!(scene.in_flight.len(), 1);
        assert_eq!(scene.in_flight[0].to, scene.walkers[0].position);
        assert_eq!(scene.status.active_walkers, 1);
    }
}
