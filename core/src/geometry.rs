//! Fixed lattice geometry shared by the world, systems and adapters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCoord, Direction};

/// Largest number of cells supported along either grid axis.
pub const MAX_GRID_DIMENSION: u16 = 256;

/// Physical layout requested by configuration before validation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridSettings {
    /// Width of the drawable area in pixels.
    pub width: f32,
    /// Height of the drawable area in pixels.
    pub height: f32,
    /// Distance between two neighbouring grid points in pixels.
    pub spacing: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 600.0,
            spacing: 60.0,
        }
    }
}

/// Grid axis referenced by validation errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal axis, indexed by columns.
    Columns,
    /// Vertical axis, indexed by rows.
    Rows,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Columns => f.write_str("columns"),
            Self::Rows => f.write_str("rows"),
        }
    }
}

/// Reasons a [`GridSettings`] value cannot be turned into a [`GridGeometry`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeometryError {
    /// A dimension was zero, negative or not finite.
    #[error("grid {field} must be a positive finite number (received {value})")]
    NonPositive {
        /// Name of the offending setting.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// The spacing leaves no room for a single cell along an axis.
    #[error("grid spacing {spacing} leaves no {axis} inside the drawable area")]
    Empty {
        /// Axis that ended up without cells.
        axis: Axis,
        /// Spacing that produced the empty axis.
        spacing: f32,
    },
    /// The spacing produces more cells than supported along an axis.
    #[error("grid would contain {count} {axis}, more than the supported maximum")]
    TooLarge {
        /// Axis that exceeded the limit.
        axis: Axis,
        /// Number of cells the settings would have produced.
        count: u64,
    },
}

/// Pixel-space location of a grid point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelPosition {
    /// Horizontal coordinate in pixels.
    pub x: f32,
    /// Vertical coordinate in pixels.
    pub y: f32,
}

impl PixelPosition {
    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Validated, immutable partition of the drawable area into addressable cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    columns: u16,
    rows: u16,
    spacing: f32,
    width: f32,
    height: f32,
    offset_x: f32,
    offset_y: f32,
}

impl GridGeometry {
    /// Derives the lattice from the provided settings.
    pub fn new(settings: GridSettings) -> Result<Self, GeometryError> {
        let GridSettings {
            width,
            height,
            spacing,
        } = settings;
        ensure_positive("width", width)?;
        ensure_positive("height", height)?;
        ensure_positive("spacing", spacing)?;

        let columns = axis_cells(Axis::Columns, width, spacing)?;
        let rows = axis_cells(Axis::Rows, height, spacing)?;

        Ok(Self {
            columns,
            rows,
            spacing,
            width,
            height,
            offset_x: (width - f32::from(columns - 1) * spacing) * 0.5,
            offset_y: (height - f32::from(rows - 1) * spacing) * 0.5,
        })
    }

    /// Number of cells along the horizontal axis.
    #[must_use]
    pub const fn columns(&self) -> u16 {
        self.columns
    }

    /// Number of cells along the vertical axis.
    #[must_use]
    pub const fn rows(&self) -> u16 {
        self.rows
    }

    /// Distance between neighbouring points in pixels.
    #[must_use]
    pub const fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Width of the drawable area in pixels.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Height of the drawable area in pixels.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Total number of cells in the lattice.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        usize::from(self.columns) * usize::from(self.rows)
    }

    /// Reports whether the cell lies inside the lattice.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Returns the axis-adjacent cell in `direction`, if it lies inside the lattice.
    #[must_use]
    pub fn neighbor(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let candidate = cell.offset(direction)?;
        self.contains(candidate).then_some(candidate)
    }

    /// Pixel position at which the cell is drawn.
    #[must_use]
    pub fn position(&self, cell: CellCoord) -> PixelPosition {
        PixelPosition::new(
            self.offset_x + f32::from(cell.column()) * self.spacing,
            self.offset_y + f32::from(cell.row()) * self.spacing,
        )
    }

    /// Snaps a pixel position to the closest cell, if it lies within half a spacing of one.
    #[must_use]
    pub fn nearest_cell(&self, position: PixelPosition) -> Option<CellCoord> {
        let column = snap_axis(position.x, self.offset_x, self.spacing, self.columns)?;
        let row = snap_axis(position.y, self.offset_y, self.spacing, self.rows)?;
        Some(CellCoord::new(column, row))
    }

    /// Iterates over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows)
            .flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }

    /// Iterates over every cell together with its pixel position.
    pub fn positions(&self) -> impl Iterator<Item = (CellCoord, PixelPosition)> + '_ {
        self.cells().map(|cell| (cell, self.position(cell)))
    }
}

fn ensure_positive(field: &'static str, value: f32) -> Result<(), GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::NonPositive { field, value })
    }
}

fn axis_cells(axis: Axis, extent: f32, spacing: f32) -> Result<u16, GeometryError> {
    let count = (extent / spacing).floor();
    if count < 1.0 {
        return Err(GeometryError::Empty { axis, spacing });
    }
    if count > f32::from(MAX_GRID_DIMENSION) {
        return Err(GeometryError::TooLarge {
            axis,
            count: count as u64,
        });
    }
    Ok(count as u16)
}

fn snap_axis(value: f32, offset: f32, spacing: f32, cells: u16) -> Option<u16> {
    let index = ((value - offset) / spacing).round();
    if !index.is_finite() || index < 0.0 || index >= f32::from(cells) {
        return None;
    }
    Some(index as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(width: f32, height: f32, spacing: f32) -> GridSettings {
        GridSettings {
            width,
            height,
            spacing,
        }
    }

    #[test]
    fn default_settings_produce_ten_by_ten_lattice() {
        let geometry = GridGeometry::new(GridSettings::default()).expect("defaults are valid");

        assert_eq!(geometry.columns(), 10);
        assert_eq!(geometry.rows(), 10);
        assert_eq!(geometry.cell_count(), 100);
        assert_eq!(geometry.cells().count(), 100);
    }

    #[test]
    fn positions_are_centred_inside_the_area() {
        let geometry = GridGeometry::new(settings(600.0, 300.0, 60.0)).expect("valid");

        assert_eq!(
            geometry.position(CellCoord::new(0, 0)),
            PixelPosition::new(30.0, 30.0)
        );
        assert_eq!(
            geometry.position(CellCoord::new(9, 4)),
            PixelPosition::new(570.0, 270.0)
        );
    }

    #[test]
    fn partial_cells_are_truncated() {
        let geometry = GridGeometry::new(settings(250.0, 130.0, 50.0)).expect("valid");

        assert_eq!(geometry.columns(), 5);
        assert_eq!(geometry.rows(), 2);
    }

    #[test]
    fn rejects_non_positive_spacing() {
        let error = GridGeometry::new(settings(100.0, 100.0, 0.0)).expect_err("zero spacing");

        assert!(matches!(
            error,
            GeometryError::NonPositive {
                field: "spacing",
                ..
            }
        ));
    }

    #[test]
    fn rejects_spacing_larger_than_area() {
        let error = GridGeometry::new(settings(100.0, 400.0, 200.0)).expect_err("no columns");

        assert_eq!(
            error,
            GeometryError::Empty {
                axis: Axis::Columns,
                spacing: 200.0
            }
        );
    }

    #[test]
    fn rejects_oversized_lattice() {
        let error = GridGeometry::new(settings(10_000.0, 100.0, 1.0)).expect_err("too wide");

        assert_eq!(
            error,
            GeometryError::TooLarge {
                axis: Axis::Columns,
                count: 10_000
            }
        );
    }

    #[test]
    fn neighbor_respects_bounds() {
        let geometry = GridGeometry::new(settings(100.0, 100.0, 50.0)).expect("2x2");
        let origin = CellCoord::new(0, 0);

        assert_eq!(geometry.neighbor(origin, Direction::Up), None);
        assert_eq!(geometry.neighbor(origin, Direction::Left), None);
        assert_eq!(
            geometry.neighbor(origin, Direction::Right),
            Some(CellCoord::new(1, 0))
        );
        assert_eq!(
            geometry.neighbor(origin, Direction::Down),
            Some(CellCoord::new(0, 1))
        );
        assert_eq!(geometry.neighbor(CellCoord::new(1, 1), Direction::Right), None);
        assert_eq!(geometry.neighbor(CellCoord::new(1, 1), Direction::Down), None);
    }

    #[test]
    fn nearest_cell_snaps_clicks_to_points() {
        let geometry = GridGeometry::new(settings(600.0, 600.0, 60.0)).expect("valid");

        assert_eq!(
            geometry.nearest_cell(PixelPosition::new(152.0, 88.0)),
            Some(CellCoord::new(2, 1))
        );
        assert_eq!(geometry.nearest_cell(PixelPosition::new(-40.0, 30.0)), None);
        assert_eq!(geometry.nearest_cell(PixelPosition::new(30.0, 620.0)), None);
    }
}
