#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Warpflow combat engine.
//!
//! This crate defines the message surface that connects adapters, the locally
//! mirrored world, and the pure rules systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values describing what
//! changed. Systems query immutable views and answer with ranges, previews, and
//! [`ActionIntent`] values that the contract layer turns into transactions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dimensions of the grid used for regular matches.
pub const FULL_GRID: GridDimensions = GridDimensions::new(25, 13);

/// Dimensions of the reduced grid used by the tutorial scenario.
pub const TUTORIAL_GRID: GridDimensions = GridDimensions::new(17, 11);

/// Number of reactor critical hits that destroy a disabled ship.
pub const REACTOR_CRITICAL_LIMIT: u8 = 3;

/// Hull points restored to a disabled ship when a friendly ship assists it.
pub const ASSIST_HULL_RESTORE: u32 = 20;

/// Status effect marker applied to ships hit by an EMP.
pub const STATUS_EMP_DISRUPTED: u8 = 1;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Replaces the grid with an empty board using the provided dimensions and layout.
    ConfigureMap {
        /// Width and height of the new grid.
        dimensions: GridDimensions,
        /// Blocked and scoring cells to carve into the grid.
        layout: MapLayout,
    },
    /// Requests that a ship be placed on the grid.
    PlaceShip {
        /// Identifier of the ship being placed.
        ship: ShipId,
        /// Side that owns the ship.
        owner: Side,
        /// Cell the ship should occupy.
        position: Position,
        /// Special ability carried by the ship.
        special: SpecialAbility,
    },
    /// Replaces the attribute record mirrored for a ship.
    SetAttributes {
        /// Identifier of the ship whose attributes change.
        ship: ShipId,
        /// New attribute record supplied by the authority.
        attributes: ShipAttributes,
    },
    /// Moves a ship to a new cell.
    MoveShip {
        /// Identifier of the ship that moves.
        ship: ShipId,
        /// Destination cell.
        to: Position,
    },
    /// Records that a ship acted during the current round.
    MarkMoved {
        /// Identifier of the ship that acted.
        ship: ShipId,
    },
    /// Removes a ship from the battle.
    RemoveShip {
        /// Identifier of the ship to remove.
        ship: ShipId,
    },
    /// Claims the scoring cell currently occupied by a ship for its owner.
    ClaimScore {
        /// Identifier of the ship standing on the scoring cell.
        ship: ShipId,
    },
    /// Adds points to a side's score without touching the grid.
    AwardPoints {
        /// Side receiving the points.
        side: Side,
        /// Number of points awarded.
        points: u32,
    },
    /// Hands the turn to the opposing side.
    PassTurn,
    /// Starts a new round and clears both moved-ship sets.
    AdvanceRound,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Announces that the grid was rebuilt.
    MapConfigured {
        /// Dimensions of the rebuilt grid.
        dimensions: GridDimensions,
    },
    /// Confirms that a ship was placed on the grid.
    ShipPlaced {
        /// Identifier of the placed ship.
        ship: ShipId,
        /// Side that owns the ship.
        owner: Side,
        /// Cell the ship occupies.
        position: Position,
    },
    /// Reports that a placement request was rejected.
    ShipPlacementRejected {
        /// Identifier of the ship that could not be placed.
        ship: ShipId,
        /// Cell requested for the placement.
        position: Position,
        /// Reason the placement failed.
        reason: OccupancyError,
    },
    /// Confirms that a ship's attribute record was replaced.
    AttributesUpdated {
        /// Identifier of the updated ship.
        ship: ShipId,
    },
    /// Confirms that a ship changed cells.
    ShipMoved {
        /// Identifier of the ship that moved.
        ship: ShipId,
        /// Cell the ship occupied before the move.
        from: Position,
        /// Cell the ship occupies after the move.
        to: Position,
    },
    /// Reports that a move request was rejected.
    ShipMoveRejected {
        /// Identifier of the ship that could not move.
        ship: ShipId,
        /// Destination that was requested.
        to: Position,
        /// Reason the move failed.
        reason: OccupancyError,
    },
    /// Confirms that a ship was recorded as having acted this round.
    ShipMarkedMoved {
        /// Identifier of the ship.
        ship: ShipId,
        /// Side that owns the ship.
        side: Side,
    },
    /// Confirms that a ship left the battle.
    ShipRemoved {
        /// Identifier of the removed ship.
        ship: ShipId,
        /// Cell the ship occupied before removal.
        position: Position,
    },
    /// Confirms that points were added to a side's score.
    PointsAwarded {
        /// Side that received the points.
        side: Side,
        /// Number of points awarded by the command.
        points: u32,
        /// Score of the side after the award.
        total: u32,
    },
    /// Reports that a one-time scoring cell was exhausted.
    ScoringCellConsumed {
        /// Cell that no longer yields points.
        position: Position,
    },
    /// Announces that the turn passed to another side.
    TurnPassed {
        /// Side whose turn it now is.
        current: Side,
    },
    /// Announces that a new round started.
    RoundAdvanced {
        /// Number of the round that started.
        round: u32,
    },
    /// Reports that a command referenced a ship the world does not know.
    UnknownShip {
        /// Identifier carried by the rejected command.
        ship: ShipId,
    },
}

/// Reasons the world may refuse to put a ship on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum OccupancyError {
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// Another ship already occupies the requested cell.
    #[error("cell is occupied by another ship")]
    Occupied,
    /// A ship with the same identifier is already on the grid.
    #[error("ship is already on the grid")]
    DuplicateShip,
}

/// Unique identifier assigned to a ship by the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipId(u64);

impl ShipId {
    /// Creates a new ship identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two participants of a match.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Player that created the game.
    #[default]
    Creator,
    /// Player that joined the game.
    Joiner,
}

impl Side {
    /// Returns the side facing this one.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Creator => Self::Joiner,
            Self::Joiner => Self::Creator,
        }
    }
}

/// Cell location on the battle grid.
///
/// Ordering is row-major, which gives every set of positions a deterministic
/// iteration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    row: u32,
    col: u32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn col(&self) -> u32 {
        self.col
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Shifts the position by signed deltas, returning `None` below zero.
    #[must_use]
    pub fn offset(self, d_row: i64, d_col: i64) -> Option<Position> {
        let row = u32::try_from(i64::from(self.row).checked_add(d_row)?).ok()?;
        let col = u32::try_from(i64::from(self.col).checked_add(d_col)?).ok()?;
        Some(Position::new(row, col))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Width and height of a battle grid measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    width: u32,
    height: u32,
}

impl GridDimensions {
    /// Creates a new dimension pair.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub const fn contains(&self, position: Position) -> bool {
        position.row < self.height && position.col < self.width
    }

    /// Validates the position against the grid.
    pub fn check(&self, position: Position) -> Result<(), BoundsError> {
        if self.contains(position) {
            Ok(())
        } else {
            Err(BoundsError {
                position,
                dimensions: *self,
            })
        }
    }

    /// Total number of cells contained in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.width) * u64::from(self.height);
        usize::try_from(count).unwrap_or(0)
    }

    /// Dense row-major index of the position, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        let row = usize::try_from(position.row).ok()?;
        let col = usize::try_from(position.col).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + col)
    }

    /// Iterates every position of the grid in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |col| Position::new(row, col)))
    }
}

impl fmt::Display for GridDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Raised when a position is looked up outside the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("position {position} lies outside the {dimensions} grid")]
pub struct BoundsError {
    /// Position that was looked up.
    pub position: Position,
    /// Dimensions of the grid that rejected the lookup.
    pub dimensions: GridDimensions,
}

/// Raised when an operation needs a ship's attribute record and none is loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("no attribute record is loaded for ship {0}")]
pub struct MissingAttributes(pub ShipId);

/// Combat attributes supplied by the authority for a single ship.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShipAttributes {
    /// Primary weapon range in Manhattan cells.
    pub range: u32,
    /// Damage dealt by the primary weapon before mitigation.
    pub gun_damage: u32,
    /// Current hull points. Zero marks the ship as disabled.
    pub hull_points: u32,
    /// Maximum hull points.
    pub max_hull_points: u32,
    /// Maximum Manhattan distance the ship may move in one action.
    pub movement: u32,
    /// Percentage of incoming damage absorbed, in `0..=100`.
    pub damage_reduction: u32,
    /// Reactor critical hits accumulated while disabled.
    pub reactor_critical_timer: u8,
    /// Opaque status effect markers.
    #[serde(default)]
    pub status_effects: Vec<u8>,
}

impl ShipAttributes {
    /// Reports whether the ship is disabled (zero hull points).
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.hull_points == 0
    }

    /// Returns a copy with hull points clamped to the maximum and reduction capped at 100.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.hull_points = self.hull_points.min(self.max_hull_points);
        self.damage_reduction = self.damage_reduction.min(100);
        self
    }
}

/// Kinds of special ability a ship may carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialKind {
    /// The ship carries no special ability.
    #[default]
    None,
    /// Electromagnetic pulse that disrupts an enemy ship.
    Emp,
    /// Repair beam that restores hull to a friendly ship.
    Repair,
    /// Flak burst that damages every ship in range.
    Flak,
}

impl SpecialKind {
    /// Resolves the contract's numeric ability index.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::None),
            1 => Some(Self::Emp),
            2 => Some(Self::Repair),
            3 => Some(Self::Flak),
            _ => None,
        }
    }

    /// Numeric index used by the contract.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Emp => 1,
            Self::Repair => 2,
            Self::Flak => 3,
        }
    }

    /// Reports whether the ability reaches targets regardless of blocked cells.
    #[must_use]
    pub const fn ignores_line_of_sight(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Effect the ability has on its targets.
    #[must_use]
    pub const fn effect(self) -> Option<SpecialEffect> {
        match self {
            Self::None => None,
            Self::Emp => Some(SpecialEffect::Disrupt),
            Self::Repair => Some(SpecialEffect::Restore),
            Self::Flak => Some(SpecialEffect::Damage),
        }
    }

    /// Ships the ability may be aimed at.
    #[must_use]
    pub const fn target_filter(self) -> Option<TargetFilter> {
        match self {
            Self::None => None,
            Self::Emp => Some(TargetFilter::Enemies),
            Self::Repair => Some(TargetFilter::Friendlies),
            Self::Flak => Some(TargetFilter::AllExceptShooter),
        }
    }

    /// Reports whether the ability hits every ship in range at once.
    #[must_use]
    pub const fn is_area_effect(self) -> bool {
        matches!(self, Self::Flak)
    }
}

/// What a special ability does to the ships it reaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialEffect {
    /// Reduces hull points like a weapon.
    Damage,
    /// Applies a status effect without touching hull.
    Disrupt,
    /// Restores hull points.
    Restore,
}

/// Ownership filter applied when collecting legal targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetFilter {
    /// Only ships of the opposing side.
    Enemies,
    /// Only ships of the shooter's side.
    Friendlies,
    /// Every ship except the shooter itself.
    AllExceptShooter,
}

impl TargetFilter {
    /// Reports whether a ship owned by `candidate` passes the filter for a shooter owned by `shooter`.
    #[must_use]
    pub fn accepts(self, shooter: Side, candidate: Side) -> bool {
        match self {
            Self::Enemies => shooter != candidate,
            Self::Friendlies => shooter == candidate,
            Self::AllExceptShooter => true,
        }
    }
}

/// Special ability carried by a ship together with its externally supplied numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecialAbility {
    /// Kind of ability.
    pub kind: SpecialKind,
    /// Reach of the ability in Manhattan cells.
    pub range: u32,
    /// Damage dealt or hull restored by the ability.
    pub strength: u32,
}

impl SpecialAbility {
    /// Ability record for ships without a special.
    pub const NONE: Self = Self::new(SpecialKind::None, 0, 0);

    /// Creates a new ability record.
    #[must_use]
    pub const fn new(kind: SpecialKind, range: u32, strength: u32) -> Self {
        Self {
            kind,
            range,
            strength,
        }
    }
}

/// Weapon the player is currently aiming with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponMode {
    /// Primary gun.
    #[default]
    Primary,
    /// The ship's special ability.
    Special,
}

/// Target picked for an attack or ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetChoice {
    /// A single ship.
    Ship(ShipId),
    /// Every ship inside the ability's reach.
    AreaEffect,
}

impl TargetChoice {
    /// Ship aimed at, when the choice names one.
    #[must_use]
    pub const fn ship(self) -> Option<ShipId> {
        match self {
            Self::Ship(ship) => Some(ship),
            Self::AreaEffect => None,
        }
    }
}

/// Action performed after the (optional) move of a committed turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Move only.
    Pass,
    /// Fire the primary weapon at an enemy.
    Shoot {
        /// Ship being fired at.
        target: ShipId,
    },
    /// Leave the battle.
    Retreat,
    /// Restore a disabled friendly ship.
    Assist {
        /// Disabled friendly ship being assisted.
        target: ShipId,
    },
    /// Use the ship's special ability.
    Special {
        /// Ship or area the ability is aimed at.
        target: TargetChoice,
    },
    /// Claim the scoring cell the ship ends on.
    ClaimPoints,
}

/// Committed move-then-act request handed to the contract layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionIntent {
    /// Ship performing the action.
    pub ship: ShipId,
    /// Cell the ship ends on. Equal to its current cell when it does not move.
    pub destination: Position,
    /// Action performed from the destination.
    pub action: ActionKind,
}

/// Immutable representation of a single ship's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShipSnapshot {
    /// Identifier of the ship.
    pub id: ShipId,
    /// Side that owns the ship.
    pub owner: Side,
    /// Cell the ship occupies.
    pub position: Position,
    /// Special ability carried by the ship.
    pub special: SpecialAbility,
    /// Attribute record, if the authority supplied one.
    pub attributes: Option<ShipAttributes>,
}

impl ShipSnapshot {
    /// Attribute record of the ship or a [`MissingAttributes`] error.
    pub fn require_attributes(&self) -> Result<&ShipAttributes, MissingAttributes> {
        self.attributes.as_ref().ok_or(MissingAttributes(self.id))
    }

    /// Reports whether the ship is known to be disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.attributes
            .as_ref()
            .is_some_and(ShipAttributes::is_disabled)
    }
}

/// Read-only view of every ship on the grid, ordered by identifier.
#[derive(Clone, Debug, Default)]
pub struct FleetView {
    snapshots: Vec<ShipSnapshot>,
}

impl FleetView {
    /// Builds a view from snapshots, sorting them by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ShipSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterates over the captured ship snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &ShipSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a ship.
    #[must_use]
    pub fn get(&self, ship: ShipId) -> Option<&ShipSnapshot> {
        self.snapshots
            .binary_search_by_key(&ship, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Looks up the ship standing on a cell.
    #[must_use]
    pub fn at(&self, position: Position) -> Option<&ShipSnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.position == position)
    }

    /// Number of ships captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no ships.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ShipSnapshot> {
        self.snapshots
    }
}

/// Scoring cell description used when building a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoringTile {
    /// Cell that yields points.
    pub position: Position,
    /// Points awarded when the cell is claimed.
    pub points: u32,
    /// Whether the cell is exhausted after the first claim.
    #[serde(default)]
    pub one_time: bool,
}

/// Static terrain of a map: blocked cells and scoring cells.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayout {
    /// Cells that block line of sight.
    #[serde(default)]
    pub blocked: Vec<Position>,
    /// Cells that yield points.
    #[serde(default)]
    pub scoring: Vec<ScoringTile>,
}

/// Score of both sides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scores {
    /// Points held by the creator.
    pub creator: u32,
    /// Points held by the joiner.
    pub joiner: u32,
}

impl Scores {
    /// Points held by the provided side.
    #[must_use]
    pub const fn get(&self, side: Side) -> u32 {
        match side {
            Side::Creator => self.creator,
            Side::Joiner => self.joiner,
        }
    }

    /// Mutable access to a side's points.
    pub fn get_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Creator => &mut self.creator,
            Side::Joiner => &mut self.joiner,
        }
    }
}

/// Ship entry of a [`GameSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipRecord {
    /// Identifier of the ship.
    pub id: ShipId,
    /// Side that owns the ship.
    pub owner: Side,
    /// Cell the ship occupies.
    pub position: Position,
    /// Special ability carried by the ship.
    #[serde(default)]
    pub special: SpecialAbility,
    /// Attribute record, when the authority supplied one.
    #[serde(default)]
    pub attributes: Option<ShipAttributes>,
}

/// Authoritative game state as published by the contract layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Dimensions of the grid.
    pub dimensions: GridDimensions,
    /// Static terrain of the map.
    #[serde(default)]
    pub layout: MapLayout,
    /// Ships in play.
    #[serde(default)]
    pub ships: Vec<ShipRecord>,
    /// Creator ships that already acted this round.
    #[serde(default)]
    pub moved_creator: Vec<ShipId>,
    /// Joiner ships that already acted this round.
    #[serde(default)]
    pub moved_joiner: Vec<ShipId>,
    /// Side whose turn it is.
    #[serde(default)]
    pub current_turn: Side,
    /// Current round number.
    #[serde(default)]
    pub round: u32,
    /// Points held by both sides.
    #[serde(default)]
    pub scores: Scores,
}

/// Reasons an action state machine transition is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum IllegalTransition {
    /// The transition needs a selected ship and none is selected.
    #[error("no ship is selected")]
    NoSelection,
    /// The referenced ship is not on the grid.
    #[error("ship {0} is not on the grid")]
    UnknownShip(ShipId),
    /// The acting side does not hold the turn.
    #[error("it is not the acting side's turn")]
    NotYourTurn,
    /// The selected ship is owned by the other side or already acted this round.
    #[error("ship {0} cannot act this turn")]
    NotActionable(ShipId),
    /// The requested cell is outside the selected ship's movement range.
    #[error("cell {0} is outside the movement range")]
    OutOfMovementRange(Position),
    /// The requested target is not legal from the staged position.
    #[error("target {0:?} is not legal from the staged position")]
    InvalidTarget(TargetChoice),
    /// The commit needs a target and none is selected.
    #[error("no target is selected")]
    NoTarget,
    /// The commit does not match the active weapon mode.
    #[error("the active weapon mode does not allow this action")]
    WrongWeaponMode,
    /// The selected ship has no special ability.
    #[error("ship {0} has no special ability")]
    NoSpecialAbility(ShipId),
    /// Points can only be claimed from a cell that yields them.
    #[error("cell {0} yields no points")]
    NotOnScoringTile(Position),
    /// An attribute record needed by the transition is missing.
    #[error(transparent)]
    MissingAttributes(#[from] MissingAttributes),
    /// A drag operation was continued or finished without being started.
    #[error("no drag is in progress")]
    DragInactive,
    /// A position outside the grid was supplied.
    #[error(transparent)]
    OutOfBounds(#[from] BoundsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_is_symmetric() {
        let a = Position::new(2, 7);
        let b = Position::new(5, 3);
        assert_eq!(a.manhattan_distance(b), 7);
        assert_eq!(b.manhattan_distance(a), 7);
    }

    #[test]
    fn offset_rejects_negative_coordinates() {
        let origin = Position::new(0, 1);
        assert_eq!(origin.offset(0, -1), Some(Position::new(0, 0)));
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(0, -2), None);
    }

    #[test]
    fn check_reports_out_of_bounds_positions() {
        let grid = FULL_GRID;
        assert!(grid.check(Position::new(12, 24)).is_ok());
        let error = grid
            .check(Position::new(13, 0))
            .expect_err("row 13 lies outside a 13-row grid");
        assert_eq!(error.position, Position::new(13, 0));
        assert_eq!(error.to_string(), "position (13, 0) lies outside the 25x13 grid");
    }

    #[test]
    fn index_is_row_major() {
        let grid = GridDimensions::new(4, 3);
        assert_eq!(grid.index(Position::new(0, 0)), Some(0));
        assert_eq!(grid.index(Position::new(1, 0)), Some(4));
        assert_eq!(grid.index(Position::new(2, 3)), Some(11));
        assert_eq!(grid.index(Position::new(0, 4)), None);
        assert_eq!(grid.positions().count(), grid.cell_count());
    }

    #[test]
    fn normalized_clamps_hull_to_maximum() {
        let attributes = ShipAttributes {
            hull_points: 150,
            max_hull_points: 120,
            damage_reduction: 130,
            ..ShipAttributes::default()
        }
        .normalized();
        assert_eq!(attributes.hull_points, 120);
        assert_eq!(attributes.damage_reduction, 100);
    }

    #[test]
    fn special_kinds_round_trip_contract_indices() {
        for index in 0..4 {
            let kind = SpecialKind::from_index(index).expect("indices 0..=3 are defined");
            assert_eq!(kind.index(), index);
        }
        assert_eq!(SpecialKind::from_index(4), None);
    }

    #[test]
    fn target_filters_follow_ownership() {
        assert!(TargetFilter::Enemies.accepts(Side::Creator, Side::Joiner));
        assert!(!TargetFilter::Enemies.accepts(Side::Creator, Side::Creator));
        assert!(TargetFilter::Friendlies.accepts(Side::Joiner, Side::Joiner));
        assert!(TargetFilter::AllExceptShooter.accepts(Side::Joiner, Side::Joiner));
        assert!(TargetFilter::AllExceptShooter.accepts(Side::Joiner, Side::Creator));
    }

    #[test]
    fn snapshot_defaults_fill_missing_fields() {
        let json = r#"{"dimensions":{"width":17,"height":11}}"#;
        let snapshot: GameSnapshot = serde_json::from_str(json).expect("minimal snapshot parses");
        assert_eq!(snapshot.dimensions, TUTORIAL_GRID);
        assert_eq!(snapshot.current_turn, Side::Creator);
        assert!(snapshot.ships.is_empty());
    }

    #[test]
    fn fleet_view_looks_up_by_id_and_cell() {
        let fleet = FleetView::from_snapshots(vec![
            ShipSnapshot {
                id: ShipId::new(9),
                owner: Side::Joiner,
                position: Position::new(1, 1),
                special: SpecialAbility::NONE,
                attributes: None,
            },
            ShipSnapshot {
                id: ShipId::new(3),
                owner: Side::Creator,
                position: Position::new(0, 2),
                special: SpecialAbility::NONE,
                attributes: None,
            },
        ]);
        assert_eq!(fleet.iter().next().map(|ship| ship.id), Some(ShipId::new(3)));
        assert_eq!(fleet.get(ShipId::new(9)).map(|ship| ship.owner), Some(Side::Joiner));
        assert_eq!(fleet.at(Position::new(0, 2)).map(|ship| ship.id), Some(ShipId::new(3)));
        assert!(fleet.get(ShipId::new(4)).is_none());
    }
}
