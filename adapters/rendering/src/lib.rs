#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Grid Walkers adapters.

pub mod animation;

use anyhow::Result as AnyResult;
use glam::Vec2;
use grid_walkers_core::{
    CellCoord, ControlKey, GridGeometry, LifecycleState, WalkerColor, WalkerId,
};
use std::{error::Error, fmt, time::Duration};

pub use animation::{Animator, CompletedTransition, Transition};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with the provided alpha.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl From<WalkerColor> for Color {
    fn from(color: WalkerColor) -> Self {
        Self::from_rgb_u8(color.red(), color.green(), color.blue())
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Pixel position of a primary click in scene space, if one happened.
    pub click: Option<Vec2>,
    /// Control key pressed or control panel button activated this frame.
    pub key: Option<ControlKey>,
}

/// Grid point drawn by the backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPointPresentation {
    /// Cell the point stands for.
    pub cell: CellCoord,
    /// Pixel position of the point.
    pub position: Vec2,
}

/// Static description of the lattice.
#[derive(Clone, Debug, PartialEq)]
pub struct GridPresentation {
    /// Width of the drawable area in pixels.
    pub width: f32,
    /// Height of the drawable area in pixels.
    pub height: f32,
    /// Distance between neighbouring points in pixels.
    pub spacing: f32,
    /// Every point of the lattice in row-major order.
    pub points: Vec<GridPointPresentation>,
    /// Color used for the points.
    pub point_color: Color,
}

impl GridPresentation {
    /// Describes the lattice of the provided geometry.
    #[must_use]
    pub fn from_geometry(geometry: &GridGeometry, point_color: Color) -> Self {
        Self {
            width: geometry.width(),
            height: geometry.height(),
            spacing: geometry.spacing(),
            points: geometry
                .positions()
                .map(|(cell, position)| GridPointPresentation {
                    cell,
                    position: Vec2::new(position.x, position.y),
                })
                .collect(),
            point_color,
        }
    }

    /// Radius used for the grid points.
    #[must_use]
    pub fn point_radius(&self) -> f32 {
        (self.spacing * 0.06).max(1.5)
    }

    /// Radius used for walkers.
    #[must_use]
    pub fn walker_radius(&self) -> f32 {
        (self.spacing * 0.22).max(3.0)
    }
}

/// Walker drawn by the backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkerPresentation {
    /// Walker being drawn.
    pub walker: WalkerId,
    /// Current pixel position, interpolated while the walker is stepping.
    pub position: Vec2,
    /// Fill color.
    pub color: Color,
    /// Whether the walker ran out of legal steps.
    pub finished: bool,
    /// Whether the walker is the pending removal candidate.
    pub focused: bool,
}

/// Line segment drawn between two grid points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TracePresentation {
    /// Start of the segment in pixels.
    pub from: Vec2,
    /// End of the segment in pixels.
    pub to: Vec2,
    /// Stroke color.
    pub color: Color,
}

/// Human-readable status shown next to the grid.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StatusPresentation {
    /// Lifecycle state currently active.
    pub state: LifecycleState,
    /// Number of walkers still stepping.
    pub active_walkers: usize,
    /// Number of walkers on the grid.
    pub total_walkers: usize,
}

impl StatusPresentation {
    /// Short headline combining the state label and walker counts.
    #[must_use]
    pub fn headline(&self) -> String {
        format!(
            "{}: {} of {} walkers active",
            self.state.label(),
            self.active_walkers,
            self.total_walkers
        )
    }

    /// Instructions for the current state.
    #[must_use]
    pub fn instructions(&self) -> &'static str {
        self.state.instructions()
    }
}

/// Scene description combining the lattice with everything drawn on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Lattice of grid points.
    pub grid: GridPresentation,
    /// Walkers currently on the grid.
    pub walkers: Vec<WalkerPresentation>,
    /// Completed steps drawn as static lines.
    pub traces: Vec<TracePresentation>,
    /// Partial lines following walkers that are mid-step.
    pub in_flight: Vec<TracePresentation>,
    /// Status text.
    pub status: StatusPresentation,
}

impl Scene {
    /// Creates an empty scene over the provided lattice.
    #[must_use]
    pub fn new(grid: GridPresentation) -> Self {
        Self {
            grid,
            walkers: Vec::new(),
            traces: Vec::new(),
            in_flight: Vec::new(),
            status: StatusPresentation::default(),
        }
    }

    /// Drops every walker and line while keeping the lattice.
    pub fn clear_dynamic(&mut self) {
        self.walkers.clear();
        self.traces.clear();
        self.in_flight.clear();
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Grid Walkers scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta, per-frame
    /// input captured by the adapter, and may mutate the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// Transitions must take some time to reach their destination.
    ZeroTransitionDuration,
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTransitionDuration => {
                write!(f, "step transitions must last longer than zero")
            }
        }
    }
}

impl Error for RenderingError {}
