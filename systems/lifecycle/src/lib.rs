#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Lifecycle controller translating pointer clicks and control keys into commands.
//!
//! The authoritative lifecycle state lives in the world. This system mirrors it
//! from `LifecycleChanged` events and only proposes commands that are legal for
//! the mirrored state; the world gates them again on application.

use grid_walkers_core::{CellCoord, Command, ControlKey, Event, LifecycleState, WalkerColor};
use rand::Rng;

/// Pointer click resolved to a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellClick {
    /// Cell under the pointer.
    pub cell: CellCoord,
    /// Whether a walker occupied the cell when the click happened.
    pub occupied: bool,
}

/// User input gathered during a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlInput {
    /// Click on a grid point, if any.
    pub click: Option<CellClick>,
    /// Control key pressed this frame, if any.
    pub key: Option<ControlKey>,
}

/// Pure system that interprets user input according to the lifecycle state.
#[derive(Debug)]
pub struct Lifecycle<R> {
    state: LifecycleState,
    rng: R,
}

impl<R> Lifecycle<R>
where
    R: Rng,
{
    /// Creates a controller starting in [`LifecycleState::NoWalker`].
    ///
    /// `rng` supplies the hues of freshly placed walkers.
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self {
            state: LifecycleState::NoWalker,
            rng,
        }
    }

    /// Lifecycle state as last reported by the world.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Consumes world events and the frame's input to emit lifecycle commands.
    pub fn handle(&mut self, events: &[Event], input: ControlInput, out: &mut Vec<Command>) {
        for event in events {
            if let Event::LifecycleChanged { state } = event {
                self.state = *state;
            }
        }

        if let Some(click) = input.click {
            self.handle_click(click, out);
        }
        if let Some(key) = input.key {
            self.handle_key(key, out);
        }
    }

    fn handle_click(&mut self, click: CellClick, out: &mut Vec<Command>) {
        let CellClick { cell, occupied } = click;
        let state = self.state;
        match state {
            LifecycleState::NoWalker | LifecycleState::AtLeastOneWalker if !occupied => {
                let color = self.fresh_color();
                out.push(Command::SpawnWalker { cell, color });
            }
            LifecycleState::AtLeastOneWalker => out.push(Command::FocusRemoval { cell }),
            LifecycleState::RemovalPending { focus } if focus == cell => {
                out.push(Command::ConfirmRemoval { cell });
            }
            _ => {}
        }
    }

    fn handle_key(&self, key: ControlKey, out: &mut Vec<Command>) {
        let command = match (key, self.state) {
            (ControlKey::Start, LifecycleState::AtLeastOneWalker) => Command::StartRun,
            (ControlKey::Pause, LifecycleState::Running) => Command::PauseRun,
            (ControlKey::Resume, LifecycleState::Paused) => Command::ResumeRun,
            (ControlKey::Reset, state) if state.accepts_reset() => Command::Reset,
            (ControlKey::Cancel, LifecycleState::RemovalPending { .. }) => Command::CancelRemoval,
            _ => return,
        };
        out.push(command);
    }

    fn fresh_color(&mut self) -> WalkerColor {
        let hue = self.rng.gen_range(0.0_f32..360.0);
        let saturation = self.rng.gen_range(0.6_f32..0.9);
        let value = self.rng.gen_range(0.8_f32..1.0);
        WalkerColor::from_hsv(hue, saturation, value)
    }
}
