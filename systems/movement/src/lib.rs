#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement reachability for ships on the battle grid.

use std::collections::BTreeSet;

use log::trace;
use warpflow_core::{BoundsError, GridDimensions, Position};
use warpflow_world::BattleGrid;

/// Computes the cells a ship standing on `from` may move to.
///
/// A cell is reachable when its Manhattan distance to `from` lies in
/// `1..=movement` and no ship occupies it. Blocked cells only affect line of
/// sight and remain reachable. Once a different destination is staged
/// (`staged` is `Some` and differs from `from`) the ship has committed to a
/// move and the range is empty.
pub fn movement_range(
    grid: &BattleGrid,
    from: Position,
    movement: u32,
    staged: Option<Position>,
) -> Result<BTreeSet<Position>, BoundsError> {
    let dimensions = grid.dimensions();
    dimensions.check(from)?;

    let mut reachable = BTreeSet::new();
    if staged.is_some_and(|staged| staged != from) {
        return Ok(reachable);
    }

    let Some(window) = Window::around(from, movement, dimensions) else {
        return Ok(reachable);
    };
    for row in window.rows.0..=window.rows.1 {
        for col in window.cols.0..=window.cols.1 {
            let candidate = Position::new(row, col);
            let distance = from.manhattan_distance(candidate);
            if distance == 0 || distance > movement {
                continue;
            }
            if grid.occupant_at(candidate)?.is_none() {
                let _ = reachable.insert(candidate);
            }
        }
    }

    trace!("{} cells reachable from {from} with movement {movement}", reachable.len());
    Ok(reachable)
}

/// Bounding box of a Manhattan diamond clipped to the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Window {
    rows: (u32, u32),
    cols: (u32, u32),
}

impl Window {
    fn around(center: Position, radius: u32, dimensions: GridDimensions) -> Option<Self> {
        let last_row = dimensions.height().checked_sub(1)?;
        let last_col = dimensions.width().checked_sub(1)?;
        Some(Self {
            rows: (
                center.row().saturating_sub(radius),
                center.row().saturating_add(radius).min(last_row),
            ),
            cols: (
                center.col().saturating_sub(radius),
                center.col().saturating_add(radius).min(last_col),
            ),
        })
    }
}
