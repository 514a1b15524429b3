//! Conversions between the contract's map representations.
//!
//! The contract publishes terrain either as position lists or as dense
//! row-major arrays. Both forms are normalised into a [`MapLayout`] clipped to
//! the grid so the world only ever sees in-range terrain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use warpflow_core::{GridDimensions, MapLayout, Position, ScoringTile};

/// Dense per-cell terrain arrays indexed as `[row][col]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenseLayout {
    /// Cells that block line of sight.
    pub blocked: Vec<Vec<bool>>,
    /// Points yielded by each cell.
    pub scoring: Vec<Vec<u32>>,
    /// Cells exhausted after their first claim.
    pub only_once: Vec<Vec<bool>>,
}

/// Drops entries outside the grid, merges duplicates, and sorts the result.
///
/// A later scoring entry for the same cell replaces an earlier one, and
/// entries worth zero points are discarded.
#[must_use]
pub fn clip_layout(layout: &MapLayout, dimensions: GridDimensions) -> MapLayout {
    let mut blocked: Vec<Position> = layout
        .blocked
        .iter()
        .copied()
        .filter(|position| dimensions.contains(*position))
        .collect();
    blocked.sort();
    blocked.dedup();

    let mut scoring: BTreeMap<Position, ScoringTile> = BTreeMap::new();
    for tile in &layout.scoring {
        if dimensions.contains(tile.position) && tile.points > 0 {
            let _ = scoring.insert(tile.position, *tile);
        }
    }

    MapLayout {
        blocked,
        scoring: scoring.into_values().collect(),
    }
}

/// Builds a layout from dense arrays, ignoring rows and columns beyond the grid.
#[must_use]
pub fn layout_from_dense(dense: &DenseLayout, dimensions: GridDimensions) -> MapLayout {
    let mut layout = MapLayout::default();
    for position in dimensions.positions() {
        if dense_cell(&dense.blocked, position).unwrap_or(false) {
            layout.blocked.push(position);
        }
        let points = dense_cell(&dense.scoring, position).unwrap_or(0);
        if points > 0 {
            layout.scoring.push(ScoringTile {
                position,
                points,
                one_time: dense_cell(&dense.only_once, position).unwrap_or(false),
            });
        }
    }
    layout
}

/// Expands a layout into dense arrays sized to the grid.
#[must_use]
pub fn dense_from_layout(layout: &MapLayout, dimensions: GridDimensions) -> DenseLayout {
    let rows = usize::try_from(dimensions.height()).unwrap_or(0);
    let cols = usize::try_from(dimensions.width()).unwrap_or(0);
    let mut dense = DenseLayout {
        blocked: vec![vec![false; cols]; rows],
        scoring: vec![vec![0; cols]; rows],
        only_once: vec![vec![false; cols]; rows],
    };

    for position in &layout.blocked {
        if let Some(slot) = dense_slot(&mut dense.blocked, *position) {
            *slot = true;
        }
    }
    for tile in &layout.scoring {
        if let Some(slot) = dense_slot(&mut dense.scoring, tile.position) {
            *slot = tile.points;
        }
        if let Some(slot) = dense_slot(&mut dense.only_once, tile.position) {
            *slot = tile.one_time;
        }
    }
    dense
}

fn dense_cell<T: Copy>(rows: &[Vec<T>], position: Position) -> Option<T> {
    let row = usize::try_from(position.row()).ok()?;
    let col = usize::try_from(position.col()).ok()?;
    rows.get(row)?.get(col).copied()
}

fn dense_slot<T>(rows: &mut [Vec<T>], position: Position) -> Option<&mut T> {
    let row = usize::try_from(position.row()).ok()?;
    let col = usize::try_from(position.col()).ok()?;
    rows.get_mut(row)?.get_mut(col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_layout_drops_out_of_range_and_worthless_entries() {
        let layout = MapLayout {
            blocked: vec![
                Position::new(2, 2),
                Position::new(0, 9),
                Position::new(2, 2),
            ],
            scoring: vec![
                ScoringTile {
                    position: Position::new(1, 1),
                    points: 0,
                    one_time: false,
                },
                ScoringTile {
                    position: Position::new(1, 2),
                    points: 2,
                    one_time: true,
                },
                ScoringTile {
                    position: Position::new(5, 0),
                    points: 2,
                    one_time: false,
                },
            ],
        };

        let clipped = clip_layout(&layout, GridDimensions::new(3, 3));
        assert_eq!(clipped.blocked, vec![Position::new(2, 2)]);
        assert_eq!(clipped.scoring.len(), 1);
        assert_eq!(clipped.scoring[0].position, Position::new(1, 2));
    }

    #[test]
    fn dense_layout_ignores_cells_beyond_the_grid() {
        let dense = DenseLayout {
            blocked: vec![vec![false, true, true], vec![true]],
            scoring: vec![vec![0, 0], vec![0, 4]],
            only_once: vec![vec![false, false], vec![false, true]],
        };

        let layout = layout_from_dense(&dense, GridDimensions::new(2, 2));
        assert_eq!(
            layout.blocked,
            vec![Position::new(0, 1), Position::new(1, 0)]
        );
        assert_eq!(
            layout.scoring,
            vec![ScoringTile {
                position: Position::new(1, 1),
                points: 4,
                one_time: true,
            }]
        );
    }

    #[test]
    fn dense_expansion_matches_the_layout() {
        let layout = MapLayout {
            blocked: vec![Position::new(0, 0)],
            scoring: vec![ScoringTile {
                position: Position::new(1, 2),
                points: 5,
                one_time: false,
            }],
        };
        let dense = dense_from_layout(&layout, GridDimensions::new(3, 2));
        assert_eq!(dense.blocked.len(), 2);
        assert_eq!(dense.blocked[0].len(), 3);
        assert!(dense.blocked[0][0]);
        assert_eq!(dense.scoring[1][2], 5);
        assert_eq!(
            layout_from_dense(&dense, GridDimensions::new(3, 2)),
            layout
        );
    }

    #[test]
    fn dense_layout_reads_the_contract_field_names() {
        let dense: DenseLayout = serde_json::from_str(
            r#"{"blocked":[[false,true]],"scoring":[[3,0]],"only_once":[[true,false]]}"#,
        )
        .expect("dense layout parses");
        let layout = layout_from_dense(&dense, GridDimensions::new(2, 1));
        assert_eq!(layout.blocked, vec![Position::new(0, 1)]);
        assert_eq!(
            layout.scoring,
            vec![ScoringTile {
                position: Position::new(0, 0),
                points: 3,
                one_time: true,
            }]
        );
    }
}
