//! Command-line flags and the TOML configuration file they refine.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use grid_walkers_core::{CellCoord, GeometryError, GridGeometry, GridSettings};
use serde::Deserialize;
use thiserror::Error;

/// Command-line interface of the demo.
#[derive(Parser, Debug)]
#[command(
    name = "grid-walkers",
    version,
    about = "Random walkers exploring a grid without retracing their steps"
)]
pub(crate) struct Cli {
    /// TOML file providing defaults for every other option.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Width of the drawable area in pixels.
    #[arg(long)]
    pub(crate) width: Option<f32>,
    /// Height of the drawable area in pixels.
    #[arg(long)]
    pub(crate) height: Option<f32>,
    /// Distance between neighbouring grid points in pixels.
    #[arg(long)]
    pub(crate) spacing: Option<f32>,
    /// Duration of a single animated step in milliseconds.
    #[arg(long)]
    pub(crate) step_millis: Option<u64>,
    /// Seed for walker colors and step choices; random when omitted.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long)]
    pub(crate) vsync: Option<bool>,
    /// Log frame timings once per second.
    #[arg(long)]
    pub(crate) show_fps: bool,
    /// Run the configured walkers to completion without opening a window.
    #[arg(long)]
    pub(crate) headless: bool,
}

/// Reasons a configuration cannot be used.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum ConfigError {
    /// The grid settings do not describe a usable lattice.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// Animated steps need a positive duration.
    #[error("animation.step_millis must be greater than zero")]
    ZeroStepDuration,
    /// Headless frames need a positive duration.
    #[error("headless.frame_millis must be greater than zero")]
    ZeroFrameDuration,
    /// A headless walker starts outside the grid.
    #[error("headless walker at ({column}, {row}) lies outside the {columns}x{rows} grid")]
    WalkerOutOfBounds {
        /// Requested column.
        column: u16,
        /// Requested row.
        row: u16,
        /// Columns available.
        columns: u16,
        /// Rows available.
        rows: u16,
    },
    /// Two headless walkers share a starting cell.
    #[error("headless walker at ({column}, {row}) is listed more than once")]
    DuplicateWalker {
        /// Repeated column.
        column: u16,
        /// Repeated row.
        row: u16,
    },
}

/// Animation timing.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AnimationConfig {
    /// Duration of a single step transition in milliseconds.
    pub(crate) step_millis: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { step_millis: 400 }
    }
}

/// Window presentation options.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowConfig {
    /// Whether to synchronise with the display refresh rate.
    pub(crate) vsync: bool,
    /// Whether to log frame timings.
    pub(crate) show_fps: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            vsync: true,
            show_fps: false,
        }
    }
}

/// Headless run options.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct HeadlessConfig {
    /// Starting cells as `[column, row]` pairs; the grid centre when empty.
    pub(crate) walkers: Vec<[u16; 2]>,
    /// Upper bound on simulated frames.
    pub(crate) max_frames: u32,
    /// Simulated duration of each frame in milliseconds.
    pub(crate) frame_millis: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            walkers: Vec::new(),
            max_frames: 100_000,
            frame_millis: 16,
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AppConfig {
    /// Physical grid layout.
    pub(crate) grid: GridSettings,
    /// Animation timing.
    pub(crate) animation: AnimationConfig,
    /// Window presentation options.
    pub(crate) window: WindowConfig,
    /// Seed for every random choice.
    pub(crate) rng_seed: Option<u64>,
    /// Headless run options.
    pub(crate) headless: HeadlessConfig,
}

impl AppConfig {
    /// Loads the configuration file named by `cli`, if any, and applies the flag overrides.
    pub(crate) fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => {
                let contents = fs::read_to_string(path).with_context(|| {
                    format!("failed to read configuration at {}", path.display())
                })?;
                Self::parse(&contents).with_context(|| {
                    format!("failed to load configuration at {}", path.display())
                })?
            }
            None => Self::default(),
        };
        config.apply_overrides(cli);
        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse configuration toml contents")
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(width) = cli.width {
            self.grid.width = width;
        }
        if let Some(height) = cli.height {
            self.grid.height = height;
        }
        if let Some(spacing) = cli.spacing {
            self.grid.spacing = spacing;
        }
        if let Some(step_millis) = cli.step_millis {
            self.animation.step_millis = step_millis;
        }
        if let Some(seed) = cli.seed {
            self.rng_seed = Some(seed);
        }
        if let Some(vsync) = cli.vsync {
            self.window.vsync = vsync;
        }
        self.window.show_fps |= cli.show_fps;
    }

    /// Validates the grid settings into a lattice.
    pub(crate) fn geometry(&self) -> Result<GridGeometry, ConfigError> {
        Ok(GridGeometry::new(self.grid)?)
    }

    /// Duration of a single animated step.
    pub(crate) fn step_duration(&self) -> Result<Duration, ConfigError> {
        if self.animation.step_millis == 0 {
            return Err(ConfigError::ZeroStepDuration);
        }
        Ok(Duration::from_millis(self.animation.step_millis))
    }

    /// Duration of a single headless frame.
    pub(crate) fn frame_duration(&self) -> Result<Duration, ConfigError> {
        if self.headless.frame_millis == 0 {
            return Err(ConfigError::ZeroFrameDuration);
        }
        Ok(Duration::from_millis(self.headless.frame_millis))
    }

    /// Starting cells for a headless run.
    pub(crate) fn headless_walkers(
        &self,
        geometry: &GridGeometry,
    ) -> Result<Vec<CellCoord>, ConfigError> {
        if self.headless.walkers.is_empty() {
            return Ok(vec![CellCoord::new(
                geometry.columns() / 2,
                geometry.rows() / 2,
            )]);
        }

        let mut cells: Vec<CellCoord> = Vec::with_capacity(self.headless.walkers.len());
        for &[column, row] in &self.headless.walkers {
            let cell = CellCoord::new(column, row);
            if !geometry.contains(cell) {
                return Err(ConfigError::WalkerOutOfBounds {
                    column,
                    row,
                    columns: geometry.columns(),
                    rows: geometry.rows(),
                });
            }
            if cells.contains(&cell) {
                return Err(ConfigError::DuplicateWalker { column, row });
            }
            cells.push(cell);
        }
        Ok(cells)
    }
}
