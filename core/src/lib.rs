#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Walkers demo.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, query immutable views, and respond
//! exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod geometry;

pub use geometry::{
    Axis, GeometryError, GridGeometry, GridSettings, PixelPosition, MAX_GRID_DIMENSION,
};

/// Title shown by adapters that open a window.
pub const WINDOW_TITLE: &str = "Grid Walkers";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Places a new walker on an unoccupied cell.
    SpawnWalker {
        /// Cell the walker starts on.
        cell: CellCoord,
        /// Display color assigned to the walker.
        color: WalkerColor,
    },
    /// Marks the walker on the provided cell as the removal candidate.
    FocusRemoval {
        /// Cell holding the walker that may be removed.
        cell: CellCoord,
    },
    /// Removes the walker on the focused cell.
    ConfirmRemoval {
        /// Cell that must match the current removal focus.
        cell: CellCoord,
    },
    /// Abandons a pending removal without touching the registry.
    CancelRemoval,
    /// Queues every walker for stepping and starts the run.
    StartRun,
    /// Stops queuing new steps until the run is resumed.
    PauseRun,
    /// Resumes a paused run.
    ResumeRun,
    /// Discards all walkers, history and queues.
    Reset,
    /// Requests that a queued walker begin an animated step.
    BeginStep {
        /// Walker attempting to move.
        walker: WalkerId,
        /// Direction of travel for the step.
        direction: Direction,
    },
    /// Reports that a queued walker has no legal step left.
    FinishWalker {
        /// Walker that reached its end state.
        walker: WalkerId,
    },
    /// Reports that the animated transition for a pending step has finished.
    CompleteStep {
        /// Cell the step departed from.
        from: CellCoord,
        /// Cell the step arrives at.
        to: CellCoord,
        /// Walker that owns the step.
        owner: WalkerId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the demo entered a new lifecycle state.
    LifecycleChanged {
        /// State that became active after processing the command.
        state: LifecycleState,
    },
    /// Confirms that a walker was placed on the grid.
    WalkerSpawned {
        /// Identifier assigned to the walker.
        walker: WalkerId,
        /// Cell the walker occupies.
        cell: CellCoord,
        /// Display color of the walker.
        color: WalkerColor,
    },
    /// Confirms that a walker was removed from the grid.
    WalkerRemoved {
        /// Identifier of the removed walker.
        walker: WalkerId,
        /// Cell the walker occupied.
        cell: CellCoord,
    },
    /// Announces that a walker awaits its next step computation.
    WalkerQueued {
        /// Walker waiting in the step queue.
        walker: WalkerId,
    },
    /// Announces a new step whose transition should be animated.
    StepStarted {
        /// Pending record describing the step.
        record: StepRecord,
    },
    /// Confirms that a step finished animating and was applied.
    StepCompleted {
        /// Completed record describing the step.
        record: StepRecord,
    },
    /// Announces that a walker ran out of legal steps.
    WalkerFinished {
        /// Walker that reached its end state.
        walker: WalkerId,
        /// Cell the walker rests on.
        cell: CellCoord,
    },
    /// Confirms that walkers, history and queues were discarded.
    RunReset,
}

/// Keyboard commands understood by the lifecycle controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlKey {
    /// Starts the run.
    Start,
    /// Pauses the run.
    Pause,
    /// Resumes a paused run.
    Resume,
    /// Clears every walker.
    Reset,
    /// Abandons a pending removal.
    Cancel,
}

/// Discrete state of the demo lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// No walker has been placed.
    #[default]
    NoWalker,
    /// At least one walker is placed and the run has not started.
    AtLeastOneWalker,
    /// A walker was clicked and awaits confirmation of its removal.
    RemovalPending {
        /// Cell holding the walker that would be removed.
        focus: CellCoord,
    },
    /// Walkers are stepping.
    Running,
    /// Stepping is halted until resumed.
    Paused,
}

impl LifecycleState {
    /// Human-readable instructions for the state.
    #[must_use]
    pub const fn instructions(&self) -> &'static str {
        match self {
            Self::NoWalker => "Click a grid point to place a walker.",
            Self::AtLeastOneWalker => {
                "Click an empty point to add a walker or a walker to remove it. Press Enter to start."
            }
            Self::RemovalPending { .. } => {
                "Click the selected walker again to remove it, or press Escape to cancel."
            }
            Self::Running => "Walkers are exploring. Press P to pause or Backspace to reset.",
            Self::Paused => "Paused. Press R to resume or Backspace to reset.",
        }
    }

    /// Short label for status displays.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NoWalker => "Idle",
            Self::AtLeastOneWalker => "Editing",
            Self::RemovalPending { .. } => "Removing",
            Self::Running => "Running",
            Self::Paused => "Paused",
        }
    }

    /// Reports whether walkers may be placed or removed.
    #[must_use]
    pub const fn accepts_edits(&self) -> bool {
        matches!(self, Self::NoWalker | Self::AtLeastOneWalker)
    }

    /// Reports whether a reset would take effect.
    #[must_use]
    pub const fn accepts_reset(&self) -> bool {
        matches!(self, Self::AtLeastOneWalker | Self::Running | Self::Paused)
    }
}

/// Display color identifying a walker and its trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalkerColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl WalkerColor {
    /// Creates a new walker color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Creates a color from hue (degrees), saturation and value in `0.0..=1.0`.
    #[must_use]
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let hue = hue.rem_euclid(360.0);
        let saturation = saturation.clamp(0.0, 1.0);
        let value = value.clamp(0.0, 1.0);

        let chroma = value * saturation;
        let sector = hue / 60.0;
        let x = chroma * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
        let (red, green, blue) = match sector as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let base = value - chroma;
        let to_byte = |channel: f32| ((channel + base) * 255.0).round().clamp(0.0, 255.0) as u8;

        Self::from_rgb(to_byte(red), to_byte(green), to_byte(blue))
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Cardinal movement directions available to walkers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

impl Direction {
    /// Every direction in candidate enumeration order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Derives the direction that connects two axis-adjacent cells.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        let column_diff = from.column().abs_diff(to.column());
        let row_diff = from.row().abs_diff(to.row());

        if u32::from(column_diff) + u32::from(row_diff) != 1 {
            return None;
        }

        if column_diff == 1 {
            if to.column() > from.column() {
                Some(Self::Right)
            } else {
                Some(Self::Left)
            }
        } else if to.row() > from.row() {
            Some(Self::Down)
        } else {
            Some(Self::Up)
        }
    }
}

/// Unique identifier assigned to a walker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WalkerId(u32);

impl WalkerId {
    /// Creates a new walker identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u16,
    row: u16,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u16, row: u16) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u16 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u16 {
        self.row
    }

    /// Returns the adjacent coordinate in `direction` without checking the upper grid bounds.
    ///
    /// Yields `None` when the step would leave the non-negative quadrant.
    #[must_use]
    pub fn offset(self, direction: Direction) -> Option<CellCoord> {
        let Self { column, row } = self;
        match direction {
            Direction::Up => row.checked_sub(1).map(|row| Self::new(column, row)),
            Direction::Down => row.checked_add(1).map(|row| Self::new(column, row)),
            Direction::Left => column.checked_sub(1).map(|column| Self::new(column, row)),
            Direction::Right => column.checked_add(1).map(|column| Self::new(column, row)),
        }
    }
}

/// Unordered pair of cells identifying a traversed edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    low: CellCoord,
    high: CellCoord,
}

impl EdgeKey {
    /// Builds the canonical key for the edge joining `a` and `b`.
    #[must_use]
    pub fn between(a: CellCoord, b: CellCoord) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Endpoints of the edge in canonical order.
    #[must_use]
    pub const fn endpoints(&self) -> (CellCoord, CellCoord) {
        (self.low, self.high)
    }
}

/// Path segment taken, or being taken, by a walker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepRecord {
    from: CellCoord,
    to: CellCoord,
    direction: Direction,
    owner: WalkerId,
    color: WalkerColor,
    completed_at: Option<Duration>,
}

impl StepRecord {
    /// Creates a pending record for a step between two axis-adjacent cells.
    ///
    /// Returns `None` when the cells are not axis-adjacent.
    #[must_use]
    pub fn pending(
        owner: WalkerId,
        color: WalkerColor,
        from: CellCoord,
        to: CellCoord,
    ) -> Option<Self> {
        let direction = Direction::between(from, to)?;
        Some(Self {
            from,
            to,
            direction,
            owner,
            color,
            completed_at: None,
        })
    }

    /// Returns the record marked as completed at the provided simulation time.
    #[must_use]
    pub fn completed(self, at: Duration) -> Self {
        Self {
            completed_at: Some(at),
            ..self
        }
    }

    /// Cell the step departed from.
    #[must_use]
    pub const fn from(&self) -> CellCoord {
        self.from
    }

    /// Cell the step arrives at.
    #[must_use]
    pub const fn to(&self) -> CellCoord {
        self.to
    }

    /// Direction of travel.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Walker that owns the step.
    #[must_use]
    pub const fn owner(&self) -> WalkerId {
        self.owner
    }

    /// Display color of the owning walker.
    #[must_use]
    pub const fn color(&self) -> WalkerColor {
        self.color
    }

    /// Simulation time at which the transition finished, if it has.
    #[must_use]
    pub const fn completed_at(&self) -> Option<Duration> {
        self.completed_at
    }

    /// Reports whether the step is still animating.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.completed_at.is_none()
    }

    /// Unordered edge traversed by the step.
    #[must_use]
    pub fn edge(&self) -> EdgeKey {
        EdgeKey::between(self.from, self.to)
    }

    /// Reports whether the record refers to the provided step identity.
    #[must_use]
    pub fn matches(&self, from: CellCoord, to: CellCoord, owner: WalkerId) -> bool {
        self.from == from && self.to == to && self.owner == owner
    }
}

/// Immutable representation of a single walker's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkerSnapshot {
    /// Unique identifier assigned to the walker.
    pub id: WalkerId,
    /// Grid cell currently occupied by the walker.
    pub cell: CellCoord,
    /// Appearance assigned to the walker.
    pub color: WalkerColor,
    /// Indicates whether the walker ran out of legal steps.
    pub finished: bool,
}

/// Read-only snapshot describing all walkers on the grid.
#[derive(Clone, Debug, Default)]
pub struct WalkerView {
    snapshots: Vec<WalkerSnapshot>,
}

impl WalkerView {
    /// Creates a new walker view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<WalkerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured walker snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &WalkerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided walker.
    #[must_use]
    pub fn get(&self, walker: WalkerId) -> Option<&WalkerSnapshot> {
        self.snapshots
            .binary_search_by_key(&walker, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Returns the walker occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<&WalkerSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.cell == cell)
    }

    /// Number of walkers that can still step.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.snapshots
            .iter()
            .filter(|snapshot| !snapshot.finished)
            .count()
    }

    /// Number of captured walkers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no walkers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<WalkerSnapshot> {
        self.snapshots
    }
}

/// Read-only view over the step history.
#[derive(Clone, Copy, Debug)]
pub struct StepHistoryView<'a> {
    records: &'a [StepRecord],
}

impl<'a> StepHistoryView<'a> {
    /// Captures a new history view backed by the provided records.
    #[must_use]
    pub const fn new(records: &'a [StepRecord]) -> Self {
        Self { records }
    }

    /// Iterates over every record in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &'a StepRecord> + 'a {
        self.records.iter()
    }

    /// Records whose transition is still animating.
    pub fn pending(&self) -> impl Iterator<Item = &'a StepRecord> + 'a {
        self.records.iter().filter(|record| record.is_pending())
    }

    /// Records whose transition has finished.
    pub fn completed(&self) -> impl Iterator<Item = &'a StepRecord> + 'a {
        self.records.iter().filter(|record| !record.is_pending())
    }

    /// Reports whether `owner` has a record departing from `cell`.
    #[must_use]
    pub fn departed_from(&self, owner: WalkerId, cell: CellCoord) -> bool {
        self.records
            .iter()
            .any(|record| record.owner == owner && record.from == cell)
    }

    /// Number of records in the history.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Reports whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn direction_between_matches_offsets() {
        let origin = CellCoord::new(3, 3);
        for direction in Direction::ALL {
            let neighbour = origin.offset(direction).expect("interior cell");
            assert_eq!(Direction::between(origin, neighbour), Some(direction));
        }
    }

    #[test]
    fn direction_between_handles_distant_cells() {
        assert_eq!(
            Direction::between(CellCoord::new(0, 0), CellCoord::new(u16::MAX, u16::MAX)),
            None
        );
        assert_eq!(
            Direction::between(CellCoord::new(u16::MAX, 0), CellCoord::new(0, u16::MAX)),
            None
        );
    }

    #[test]
    fn direction_between_rejects_non_adjacent_cells() {
        assert_eq!(
            Direction::between(CellCoord::new(0, 0), CellCoord::new(1, 1)),
            None
        );
        assert_eq!(
            Direction::between(CellCoord::new(2, 2), CellCoord::new(2, 2)),
            None
        );
        assert_eq!(
            Direction::between(CellCoord::new(0, 0), CellCoord::new(0, 2)),
            None
        );
    }

    #[test]
    fn offset_refuses_to_underflow() {
        assert_eq!(CellCoord::new(0, 4).offset(Direction::Left), None);
        assert_eq!(CellCoord::new(4, 0).offset(Direction::Up), None);
    }

    #[test]
    fn edge_key_ignores_orientation() {
        let a = CellCoord::new(1, 2);
        let b = CellCoord::new(1, 3);
        assert_eq!(EdgeKey::between(a, b), EdgeKey::between(b, a));
        assert_eq!(EdgeKey::between(b, a).endpoints(), (a, b));
    }

    #[test]
    fn step_record_direction_is_consistent_with_destination() {
        let from = CellCoord::new(4, 4);
        let color = WalkerColor::from_rgb(1, 2, 3);
        for direction in Direction::ALL {
            let to = from.offset(direction).expect("interior cell");
            let record = StepRecord::pending(WalkerId::new(1), color, from, to).expect("adjacent");
            assert_eq!(record.direction(), direction);
            assert_eq!(from.offset(record.direction()), Some(record.to()));
            assert!(record.is_pending());
        }
    }

    #[test]
    fn step_record_rejects_diagonal_steps() {
        let record = StepRecord::pending(
            WalkerId::new(1),
            WalkerColor::from_rgb(0, 0, 0),
            CellCoord::new(0, 0),
            CellCoord::new(1, 1),
        );
        assert!(record.is_none());
    }

    #[test]
    fn completed_record_round_trips_through_bincode() {
        let record = StepRecord::pending(
            WalkerId::new(7),
            WalkerColor::from_rgb(10, 20, 30),
            CellCoord::new(5, 7),
            CellCoord::new(5, 6),
        )
        .expect("adjacent")
        .completed(Duration::from_millis(1_250));
        assert_round_trip(&record);
    }

    #[test]
    fn hsv_primaries_convert_to_rgb() {
        assert_eq!(
            WalkerColor::from_hsv(0.0, 1.0, 1.0),
            WalkerColor::from_rgb(255, 0, 0)
        );
        assert_eq!(
            WalkerColor::from_hsv(120.0, 1.0, 1.0),
            WalkerColor::from_rgb(0, 255, 0)
        );
        assert_eq!(
            WalkerColor::from_hsv(240.0, 1.0, 1.0),
            WalkerColor::from_rgb(0, 0, 255)
        );
        assert_eq!(
            WalkerColor::from_hsv(42.0, 0.0, 0.5),
            WalkerColor::from_rgb(128, 128, 128)
        );
    }

    #[test]
    fn history_view_partitions_pending_and_completed() {
        let color = WalkerColor::from_rgb(9, 9, 9);
        let first = StepRecord::pending(
            WalkerId::new(1),
            color,
            CellCoord::new(0, 0),
            CellCoord::new(1, 0),
        )
        .expect("adjacent")
        .completed(Duration::from_secs(1));
        let second = StepRecord::pending(
            WalkerId::new(1),
            color,
            CellCoord::new(1, 0),
            CellCoord::new(1, 1),
        )
        .expect("adjacent");
        let records = [first, second];
        let view = StepHistoryView::new(&records);

        assert_eq!(view.pending().copied().collect::<Vec<_>>(), vec![second]);
        assert_eq!(view.completed().copied().collect::<Vec<_>>(), vec![first]);
        assert!(view.departed_from(WalkerId::new(1), CellCoord::new(0, 0)));
        assert!(view.departed_from(WalkerId::new(1), CellCoord::new(1, 0)));
        assert!(!view.departed_from(WalkerId::new(1), CellCoord::new(1, 1)));
        assert!(!view.departed_from(WalkerId::new(2), CellCoord::new(0, 0)));
    }

    #[test]
    fn lifecycle_gates_edits_and_resets() {
        assert!(LifecycleState::NoWalker.accepts_edits());
        assert!(LifecycleState::AtLeastOneWalker.accepts_edits());
        assert!(!LifecycleState::Running.accepts_edits());
        assert!(!LifecycleState::NoWalker.accepts_reset());
        assert!(!LifecycleState::RemovalPending {
            focus: CellCoord::new(0, 0)
        }
        .accepts_reset());
        assert!(LifecycleState::Paused.accepts_reset());
    }
}
