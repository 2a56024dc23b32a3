#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Grid Walkers demo.
//!
//! Without `--headless` the demo opens a macroquad window where walkers are
//! placed by clicking grid points. With `--headless` the configured walkers
//! are placed automatically, run to completion against a simulated clock and
//! summarised on stdout.

mod config;
mod simulation;

use anyhow::{Context, Result};
use clap::Parser;
use grid_walkers_core::{ControlKey, GridGeometry, WINDOW_TITLE};
use grid_walkers_rendering::{Color, GridPresentation, Presentation, RenderingBackend, Scene};
use grid_walkers_rendering_macroquad::MacroquadBackend;
use grid_walkers_system_lifecycle::{CellClick, ControlInput};
use tracing::{info, warn};

use crate::{
    config::{AppConfig, Cli},
    simulation::{Simulation, SimulationSummary},
};

const BACKGROUND: Color = Color::from_rgb_u8(24, 26, 32);
const GRID_POINT_COLOR: Color = Color::from_rgb_u8(96, 102, 118);

/// Entry point for the Grid Walkers command-line interface.
fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::resolve(&cli)?;
    let geometry = config.geometry().context("invalid grid configuration")?;
    let seed = config.rng_seed.unwrap_or_else(rand::random);
    info!(
        columns = geometry.columns(),
        rows = geometry.rows(),
        spacing = geometry.spacing(),
        seed,
        headless = cli.headless,
        "starting grid walkers"
    );

    if cli.headless {
        run_headless(&config, geometry, seed)
    } else {
        run_windowed(&config, geometry, seed)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_windowed(config: &AppConfig, geometry: GridGeometry, seed: u64) -> Result<()> {
    let mut simulation = Simulation::new(geometry, config.step_duration()?, seed)?;
    let scene = Scene::new(GridPresentation::from_geometry(&geometry, GRID_POINT_COLOR));
    let presentation = Presentation::new(WINDOW_TITLE, BACKGROUND, scene);

    MacroquadBackend::new()
        .with_vsync(config.window.vsync)
        .with_show_fps(config.window.show_fps)
        .run(presentation, move |dt, input, scene| {
            let input = simulation.control_input(input);
            simulation.advance(dt, input);
            simulation.populate_scene(scene);
        })
}

fn run_headless(config: &AppConfig, geometry: GridGeometry, seed: u64) -> Result<()> {
    let frame = config.frame_duration()?;
    let walkers = config.headless_walkers(&geometry)?;
    let mut simulation = Simulation::new(geometry, config.step_duration()?, seed)?;

    for cell in walkers {
        simulation.advance(
            frame,
            ControlInput {
                click: Some(CellClick {
                    cell,
                    occupied: false,
                }),
                key: None,
            },
        );
    }
    simulation.advance(
        frame,
        ControlInput {
            click: None,
            key: Some(ControlKey::Start),
        },
    );

    let mut frames = 0_u32;
    while !simulation.is_settled() && frames < config.headless.max_frames {
        simulation.advance(frame, ControlInput::default());
        frames += 1;
    }
    if !simulation.is_settled() {
        warn!(frames, "headless run stopped before every walker finished");
    }

    let summary = simulation.summary();
    info!(
        frames,
        completed_steps = summary.completed_steps,
        finished = summary.finished_count(),
        walkers = summary.walkers.len(),
        "headless run complete"
    );
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &SimulationSummary) {
    println!("state: {}", summary.state.label());
    println!("simulated time: {:.3}s", summary.clock.as_secs_f64());
    println!("completed steps: {}", summary.completed_steps);
    println!(
        "walkers finished: {} of {}",
        summary.finished_count(),
        summary.walkers.len()
    );
    for walker in &summary.walkers {
        println!(
            "walker {} at ({}, {}){}",
            walker.walker.get(),
            walker.cell.column(),
            walker.cell.row(),
            if walker.finished { " finished" } else { "" }
        );
    }
}
