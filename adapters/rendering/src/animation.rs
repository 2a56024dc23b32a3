//! Timed transitions that move walkers between grid points.
//!
//! Each started step becomes one [`Transition`]. Advancing the [`Animator`]
//! interpolates every transition along an ease-in-out curve and reports exactly
//! one [`CompletedTransition`] per transition once its duration has elapsed.

use std::time::Duration;

use glam::Vec2;
use grid_walkers_core::{CellCoord, GridGeometry, StepRecord, WalkerId};

use crate::RenderingError;

/// Identity of a finished transition, used to correlate it with its step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletedTransition {
    /// Cell the transition departed from.
    pub from: CellCoord,
    /// Cell the transition arrived at.
    pub to: CellCoord,
    /// Walker that was moved.
    pub owner: WalkerId,
}

/// Single in-flight interpolation between two grid points.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    from: CellCoord,
    to: CellCoord,
    owner: WalkerId,
    start: Vec2,
    end: Vec2,
    elapsed: Duration,
}

impl Transition {
    /// Walker being moved.
    #[must_use]
    pub const fn owner(&self) -> WalkerId {
        self.owner
    }

    /// Pixel position of the departure point.
    #[must_use]
    pub const fn start(&self) -> Vec2 {
        self.start
    }

    /// Pixel position of the arrival point.
    #[must_use]
    pub const fn end(&self) -> Vec2 {
        self.end
    }

    fn progress(&self, duration: Duration) -> f32 {
        (self.elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    fn identity(&self) -> CompletedTransition {
        CompletedTransition {
            from: self.from,
            to: self.to,
            owner: self.owner,
        }
    }
}

/// Collection of in-flight transitions sharing one duration.
#[derive(Clone, Debug)]
pub struct Animator {
    duration: Duration,
    transitions: Vec<Transition>,
}

impl Animator {
    /// Creates an animator whose transitions last `duration`.
    pub fn new(duration: Duration) -> Result<Self, RenderingError> {
        if duration.is_zero() {
            return Err(RenderingError::ZeroTransitionDuration);
        }
        Ok(Self {
            duration,
            transitions: Vec::new(),
        })
    }

    /// Starts animating the provided step.
    ///
    /// A second request for a step that is already animating is ignored.
    pub fn start(&mut self, record: &StepRecord, geometry: &GridGeometry) {
        let (from, to, owner) = (record.from(), record.to(), record.owner());
        if self
            .transitions
            .iter()
            .any(|transition| transition.identity() == CompletedTransition { from, to, owner })
        {
            return;
        }

        let start = geometry.position(from);
        let end = geometry.position(to);
        self.transitions.push(Transition {
            from,
            to,
            owner,
            start: Vec2::new(start.x, start.y),
            end: Vec2::new(end.x, end.y),
            elapsed: Duration::ZERO,
        });
    }

    /// Advances every transition by `dt` and reports the ones that finished.
    ///
    /// Finished transitions are removed and reported in the order they started.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<CompletedTransition>) {
        let duration = self.duration;
        self.transitions.retain_mut(|transition| {
            transition.elapsed = transition.elapsed.saturating_add(dt);
            if transition.elapsed >= duration {
                out.push(transition.identity());
                false
            } else {
                true
            }
        });
    }

    /// Interpolated pixel position of the walker's transition, if one is running.
    #[must_use]
    pub fn position_of(&self, owner: WalkerId) -> Option<Vec2> {
        self.transitions
            .iter()
            .find(|transition| transition.owner == owner)
            .map(|transition| {
                let eased = ease_in_out(transition.progress(self.duration));
                transition.start.lerp(transition.end, eased)
            })
    }

    /// Iterates over the in-flight transitions.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    /// Number of in-flight transitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Reports whether nothing is animating.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Drops every in-flight transition without reporting completion.
    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}

/// Quadratic ease-in-out over `0.0..=1.0`.
#[must_use]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}
