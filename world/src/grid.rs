//! Dense spatial model of the battle grid.

use warpflow_core::{
    BoundsError, GridDimensions, MapLayout, OccupancyError, Position, ScoringTile, ShipId, Side,
};

/// Ship standing on a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Occupant {
    /// Identifier of the ship.
    pub ship: ShipId,
    /// Side that owns the ship.
    pub owner: Side,
}

/// Points a cell yields when claimed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScoringCell {
    /// Points awarded per claim. Zero for cells that yield nothing.
    pub points: u32,
    /// Whether the cell keeps yielding points after a claim.
    pub reusable: bool,
}

impl ScoringCell {
    /// Reports whether claiming the cell awards anything.
    #[must_use]
    pub const fn yields_points(&self) -> bool {
        self.points > 0
    }
}

/// Occupancy, blocked and scoring layers of the battle grid.
///
/// Every layer is a dense row-major array so lookups stay constant time. All
/// public lookups validate the position first and fail with [`BoundsError`]
/// instead of wrapping or clamping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleGrid {
    dimensions: GridDimensions,
    occupants: Vec<Option<Occupant>>,
    blocked: Vec<bool>,
    scoring: Vec<ScoringCell>,
}

impl BattleGrid {
    /// Creates an empty grid without terrain.
    #[must_use]
    pub fn new(dimensions: GridDimensions) -> Self {
        let cells = dimensions.cell_count();
        Self {
            dimensions,
            occupants: vec![None; cells],
            blocked: vec![false; cells],
            scoring: vec![ScoringCell::default(); cells],
        }
    }

    /// Creates an empty grid and carves the layout into it.
    ///
    /// Layout entries outside the grid are skipped.
    #[must_use]
    pub fn from_layout(dimensions: GridDimensions, layout: &MapLayout) -> Self {
        let mut grid = Self::new(dimensions);
        for position in &layout.blocked {
            if let Some(index) = dimensions.index(*position) {
                grid.blocked[index] = true;
            }
        }
        for tile in &layout.scoring {
            if let Some(index) = dimensions.index(tile.position) {
                grid.scoring[index] = ScoringCell {
                    points: tile.points,
                    reusable: !tile.one_time,
                };
            }
        }
        grid
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Ship occupying the cell, if any.
    pub fn occupant_at(&self, position: Position) -> Result<Option<Occupant>, BoundsError> {
        let index = self.slot(position)?;
        Ok(self.occupants[index])
    }

    /// Reports whether the cell blocks line of sight.
    pub fn is_blocked(&self, position: Position) -> Result<bool, BoundsError> {
        let index = self.slot(position)?;
        Ok(self.blocked[index])
    }

    /// Points the cell yields when claimed.
    pub fn scoring_at(&self, position: Position) -> Result<ScoringCell, BoundsError> {
        let index = self.slot(position)?;
        Ok(self.scoring[index])
    }

    /// Reports whether the cell lies inside the grid and holds no ship.
    #[must_use]
    pub fn is_free(&self, position: Position) -> bool {
        matches!(self.occupant_at(position), Ok(None))
    }

    /// Iterates the cells that block line of sight in row-major order.
    pub fn blocked_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.dimensions
            .positions()
            .zip(self.blocked.iter())
            .filter_map(|(position, blocked)| blocked.then_some(position))
    }

    /// Iterates the cells that still yield points in row-major order.
    pub fn scoring_tiles(&self) -> impl Iterator<Item = ScoringTile> + '_ {
        self.dimensions
            .positions()
            .zip(self.scoring.iter())
            .filter(|(_, cell)| cell.yields_points())
            .map(|(position, cell)| ScoringTile {
                position,
                points: cell.points,
                one_time: !cell.reusable,
            })
    }

    pub(crate) fn occupy(
        &mut self,
        position: Position,
        occupant: Occupant,
    ) -> Result<(), OccupancyError> {
        let index = self
            .dimensions
            .index(position)
            .ok_or(OccupancyError::OutOfBounds)?;
        match self.occupants[index] {
            Some(existing) if existing.ship != occupant.ship => Err(OccupancyError::Occupied),
            _ => {
                self.occupants[index] = Some(occupant);
                Ok(())
            }
        }
    }

    pub(crate) fn vacate(&mut self, position: Position) {
        if let Some(index) = self.dimensions.index(position) {
            self.occupants[index] = None;
        }
    }

    /// Claims the cell, exhausting it when it is one-time. Returns what the claim yielded.
    pub(crate) fn claim(&mut self, position: Position) -> Option<ScoringCell> {
        let index = self.dimensions.index(position)?;
        let cell = self.scoring[index];
        if !cell.yields_points() {
            return None;
        }
        if !cell.reusable {
            self.scoring[index] = ScoringCell::default();
        }
        Some(cell)
    }

    fn slot(&self, position: Position) -> Result<usize, BoundsError> {
        self.dimensions.check(position)?;
        self.dimensions.index(position).ok_or(BoundsError {
            position,
            dimensions: self.dimensions,
        })
    }
}
