use grid_walkers_core::{
    CellCoord, Command, Event, GridGeometry, GridSettings, LifecycleState, StepRecord,
    WalkerColor, WalkerSnapshot,
};
use grid_walkers_system_stepping::Stepper;
use grid_walkers_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const TRIO: [(u16, u16); 3] = [(0, 0), (5, 5), (2, 3)];

const PALETTE: [WalkerColor; 3] = [
    WalkerColor::from_rgb(0xe6, 0x39, 0x46),
    WalkerColor::from_rgb(0x45, 0x7b, 0x9d),
    WalkerColor::from_rgb(0x2a, 0x9d, 0x8f),
];

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    walkers: Vec<WalkerSnapshot>,
    history: Vec<StepRecord>,
    events: Vec<Event>,
}

#[test]
fn same_seed_replays_identically() {
    let first = replay(0xdead_beef, &TRIO);
    let second = replay(0xdead_beef, &TRIO);

    assert_eq!(first, second, "replay diverged between runs");
}

#[test]
fn every_walker_eventually_finishes() {
    let outcome = replay(42, &TRIO);

    assert_eq!(outcome.walkers.len(), 3);
    assert!(outcome.walkers.iter().all(|walker| walker.finished));
    assert!(outcome.history.iter().all(|record| !record.is_pending()));

    let finished_events = outcome
        .events
        .iter()
        .filter(|event| matches!(event, Event::WalkerFinished { .. }))
        .count();
    assert_eq!(finished_events, 3, "each walker finishes exactly once");
}

#[test]
fn walkers_never_step_onto_a_departed_cell() {
    let outcome = replay(7, &[(2, 3)]);
    assert!(outcome.walkers.iter().all(|walker| walker.finished));

    for walker in &outcome.walkers {
        let mut departed: Vec<CellCoord> = Vec::new();
        for event in &outcome.events {
            let Event::StepStarted { record } = event else {
                continue;
            };
            if record.owner() != walker.id {
                continue;
            }
            assert!(
                !departed.contains(&record.to()),
                "walker {:?} re-entered {:?}",
                walker.id,
                record.to()
            );
            assert!(!departed.contains(&record.from()));
            departed.push(record.from());
        }
    }
}

#[test]
fn finished_walkers_stay_put() {
    let outcome = replay(99, &TRIO);

    for event in &outcome.events {
        let Event::WalkerFinished { walker, cell } = event else {
            continue;
        };
        let snapshot = outcome
            .walkers
            .iter()
            .find(|snapshot| snapshot.id == *walker)
            .expect("finished walker stays registered");
        assert_eq!(snapshot.cell, *cell);
    }
}

fn replay(seed: u64, cells: &[(u16, u16)]) -> ReplayOutcome {
    let geometry = GridGeometry::new(GridSettings {
        width: 120.0,
        height: 120.0,
        spacing: 20.0,
    })
    .expect("valid geometry");
    let mut world = World::new(geometry);
    let mut stepper = Stepper::new(ChaCha8Rng::seed_from_u64(seed));
    let mut log = Vec::new();

    let mut script: Vec<Command> = cells
        .iter()
        .copied()
        .zip(PALETTE)
        .map(|((column, row), color)| Command::SpawnWalker {
            cell: CellCoord::new(column, row),
            color,
        })
        .collect();
    script.push(Command::StartRun);

    for command in script {
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);
        log.extend(events.iter().cloned());
        process_stepping(&mut world, &mut stepper, events, &mut log);
    }

    assert_eq!(query::lifecycle_state(&world), LifecycleState::Running);

    ReplayOutcome {
        walkers: query::walker_view(&world).into_vec(),
        history: query::history_view(&world).iter().copied().collect(),
        events: log,
    }
}

/// Runs the stepper against world events until no more commands are produced.
///
/// Every started step is completed immediately, standing in for a renderer
/// whose transitions take no time.
fn process_stepping(
    world: &mut World,
    stepper: &mut Stepper<ChaCha8Rng>,
    pending_events: Vec<Event>,
    log: &mut Vec<Event>,
) {
    let mut events = pending_events;

    loop {
        if events.is_empty() {
            break;
        }

        let walker_view = query::walker_view(world);
        let mut commands = Vec::new();
        stepper.handle(
            &events,
            &walker_view,
            query::history_view(world),
            query::geometry(world),
            &mut commands,
        );
        for event in &events {
            if let Event::StepStarted { record } = event {
                commands.push(Command::CompleteStep {
                    from: record.from(),
                    to: record.to(),
                    owner: record.owner(),
                });
            }
        }

        if commands.is_empty() {
            break;
        }

        events.clear();
        for command in commands {
            let mut generated_events = Vec::new();
            world::apply(world, command, &mut generated_events);
            log.extend(generated_events.iter().cloned());
            events.extend(generated_events);
        }
    }
}
