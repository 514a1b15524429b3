#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Integer line-of-sight resolution over the battle grid.
//!
//! Lines are rasterised with Bresenham's algorithm. The two endpoints are
//! always traced in row-major order, so `a → b` and `b → a` visit the same
//! lattice points and visibility is symmetric.

use warpflow_core::{BoundsError, Position};
use warpflow_world::BattleGrid;

/// Reports whether `to` is visible from `from`.
///
/// Visibility fails when either endpoint is blocked or when any lattice point
/// strictly between them is blocked. Endpoints are otherwise ignored, so
/// adjacent cells always see each other unless one of them is blocked.
pub fn has_line_of_sight(
    grid: &BattleGrid,
    from: Position,
    to: Position,
) -> Result<bool, BoundsError> {
    if grid.is_blocked(from)? || grid.is_blocked(to)? {
        return Ok(false);
    }

    for point in LineTrace::new(from, to).intermediate() {
        if grid.is_blocked(point)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Iterator over the lattice points of the Bresenham line between two cells.
///
/// Points are yielded from the row-major smaller endpoint to the larger one,
/// both endpoints included.
#[derive(Clone, Debug)]
pub struct LineTrace {
    col: i64,
    row: i64,
    end_col: i64,
    end_row: i64,
    delta_col: i64,
    delta_row: i64,
    step_col: i64,
    step_row: i64,
    error: i64,
    finished: bool,
}

impl LineTrace {
    /// Creates a trace between two positions.
    #[must_use]
    pub fn new(a: Position, b: Position) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let (col, row) = (i64::from(start.col()), i64::from(start.row()));
        let (end_col, end_row) = (i64::from(end.col()), i64::from(end.row()));
        let delta_col = (end_col - col).abs();
        let delta_row = -(end_row - row).abs();
        Self {
            col,
            row,
            end_col,
            end_row,
            delta_col,
            delta_row,
            step_col: if col < end_col { 1 } else { -1 },
            step_row: if row < end_row { 1 } else { -1 },
            error: delta_col + delta_row,
            finished: false,
        }
    }

    /// Restricts the trace to the points strictly between the endpoints.
    pub fn intermediate(self) -> impl Iterator<Item = Position> {
        let first = Position::new(
            u32::try_from(self.row).unwrap_or(u32::MAX),
            u32::try_from(self.col).unwrap_or(u32::MAX),
        );
        let last = Position::new(
            u32::try_from(self.end_row).unwrap_or(u32::MAX),
            u32::try_from(self.end_col).unwrap_or(u32::MAX),
        );
        self.filter(move |point| *point != first && *point != last)
    }
}

impl Iterator for LineTrace {
    type Item = Position;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let point = Position::new(u32::try_from(self.row).ok()?, u32::try_from(self.col).ok()?);
        if self.col == self.end_col && self.row == self.end_row {
            self.finished = true;
            return Some(point);
        }

        let doubled = 2 * self.error;
        if doubled >= self.delta_row {
            self.error += self.delta_row;
            self.col += self.step_col;
        }
        if doubled <= self.delta_col {
            self.error += self.delta_col;
            self.row += self.step_row;
        }
        Some(point)
    }
}
