#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Locally mirrored battle state for Warpflow.
//!
//! The chain stays authoritative. This crate keeps the client's copy of the
//! grid, the fleet, and the turn bookkeeping, mutated only through [`apply`]
//! so optimistic updates and authoritative snapshots travel the same path.

mod fleet;
mod grid;
pub mod map;

use log::debug;
use warpflow_core::{
    Command, Event, GameSnapshot, GridDimensions, MapLayout, OccupancyError, Position, Scores,
    ShipId, Side, FULL_GRID,
};

use crate::fleet::{Fleet, MovedShips, ShipState};

pub use crate::grid::{BattleGrid, Occupant, ScoringCell};

/// Represents the client's mirror of a Warpflow battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct World {
    grid: BattleGrid,
    fleet: Fleet,
    moved: MovedShips,
    current_turn: Side,
    round: u32,
    scores: Scores,
}

impl World {
    /// Creates an empty battle on the full-size grid.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimensions(FULL_GRID)
    }

    /// Creates an empty battle on a grid of the provided size.
    #[must_use]
    pub fn with_dimensions(dimensions: GridDimensions) -> Self {
        Self {
            grid: BattleGrid::new(dimensions),
            fleet: Fleet::default(),
            moved: MovedShips::default(),
            current_turn: Side::Creator,
            round: 0,
            scores: Scores::default(),
        }
    }

    /// Rebuilds the mirror from an authoritative snapshot.
    ///
    /// Ships that cannot be placed (outside the grid or on an occupied cell)
    /// are skipped and logged.
    #[must_use]
    pub fn from_snapshot(snapshot: &GameSnapshot) -> Self {
        let mut world = Self::with_dimensions(snapshot.dimensions);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureMap {
                dimensions: snapshot.dimensions,
                layout: snapshot.layout.clone(),
            },
            &mut events,
        );

        for record in &snapshot.ships {
            apply(
                &mut world,
                Command::PlaceShip {
                    ship: record.id,
                    owner: record.owner,
                    position: record.position,
                    special: record.special,
                },
                &mut events,
            );
            if let Some(attributes) = &record.attributes {
                apply(
                    &mut world,
                    Command::SetAttributes {
                        ship: record.id,
                        attributes: attributes.clone(),
                    },
                    &mut events,
                );
            }
        }

        for ship in snapshot.moved_creator.iter().chain(&snapshot.moved_joiner) {
            apply(&mut world, Command::MarkMoved { ship: *ship }, &mut events);
        }

        for event in &events {
            if let Event::ShipPlacementRejected { ship, reason, .. } = event {
                debug!("snapshot ship {ship} skipped: {reason}");
            }
        }

        world.current_turn = snapshot.current_turn;
        world.round = snapshot.round;
        world.scores = snapshot.scores;
        world
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureMap { dimensions, layout } => {
            world.grid = BattleGrid::from_layout(dimensions, &layout);
            world.fleet.clear();
            world.moved.clear();
            out_events.push(Event::MapConfigured { dimensions });
        }
        Command::PlaceShip {
            ship,
            owner,
            position,
            special,
        } => {
            if world.fleet.contains(ship) {
                out_events.push(Event::ShipPlacementRejected {
                    ship,
                    position,
                    reason: OccupancyError::DuplicateShip,
                });
                return;
            }
            match world.grid.occupy(position, Occupant { ship, owner }) {
                Ok(()) => {
                    world.fleet.insert(ShipState {
                        id: ship,
                        owner,
                        position,
                        special,
                        attributes: None,
                    });
                    out_events.push(Event::ShipPlaced {
                        ship,
                        owner,
                        position,
                    });
                }
                Err(reason) => out_events.push(Event::ShipPlacementRejected {
                    ship,
                    position,
                    reason,
                }),
            }
        }
        Command::SetAttributes { ship, attributes } => match world.fleet.get_mut(ship) {
            Some(state) => {
                state.attributes = Some(attributes.normalized());
                out_events.push(Event::AttributesUpdated { ship });
            }
            None => out_events.push(Event::UnknownShip { ship }),
        },
        Command::MoveShip { ship, to } => move_ship(world, ship, to, out_events),
        Command::MarkMoved { ship } => match world.fleet.get(ship) {
            Some(state) => {
                let side = state.owner;
                if world.moved.mark(side, ship) {
                    out_events.push(Event::ShipMarkedMoved { ship, side });
                }
            }
            None => out_events.push(Event::UnknownShip { ship }),
        },
        Command::RemoveShip { ship } => match world.fleet.remove(ship) {
            Some(state) => {
                world.grid.vacate(state.position);
                world.moved.forget(ship);
                out_events.push(Event::ShipRemoved {
                    ship,
                    position: state.position,
                });
            }
            None => out_events.push(Event::UnknownShip { ship }),
        },
        Command::ClaimScore { ship } => {
            let Some(state) = world.fleet.get(ship) else {
                out_events.push(Event::UnknownShip { ship });
                return;
            };
            let (owner, position) = (state.owner, state.position);
            if let Some(cell) = world.grid.claim(position) {
                award(world, owner, cell.points, out_events);
                if !cell.reusable {
                    out_events.push(Event::ScoringCellConsumed { position });
                }
            }
        }
        Command::AwardPoints { side, points } => award(world, side, points, out_events),
        Command::PassTurn => {
            world.current_turn = world.current_turn.opponent();
            out_events.push(Event::TurnPassed {
                current: world.current_turn,
            });
        }
        Command::AdvanceRound => {
            world.round = world.round.saturating_add(1);
            world.moved.clear();
            out_events.push(Event::RoundAdvanced { round: world.round });
        }
    }
}

fn move_ship(world: &mut World, ship: ShipId, to: Position, out: &mut Vec<Event>) {
    let Some(state) = world.fleet.get(ship) else {
        out.push(Event::UnknownShip { ship });
        return;
    };
    let (from, owner) = (state.position, state.owner);
    if from == to {
        return;
    }

    if let Err(reason) = world.grid.occupy(to, Occupant { ship, owner }) {
        debug!("move of ship {ship} to {to} rejected: {reason}");
        out.push(Event::ShipMoveRejected { ship, to, reason });
        return;
    }
    world.grid.vacate(from);
    if let Some(state) = world.fleet.get_mut(ship) {
        state.position = to;
    }
    out.push(Event::ShipMoved { ship, from, to });
}

fn award(world: &mut World, side: Side, points: u32, out: &mut Vec<Event>) {
    let total = world.scores.get_mut(side);
    *total = total.saturating_add(points);
    out.push(Event::PointsAwarded {
        side,
        points,
        total: *total,
    });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use warpflow_core::{
        FleetView, GameSnapshot, GridDimensions, MapLayout, Scores, ShipAttributes, ShipId,
        ShipRecord, ShipSnapshot, Side,
    };

    use super::{BattleGrid, World};

    /// Dimensions of the battle grid.
    #[must_use]
    pub fn dimensions(world: &World) -> GridDimensions {
        world.grid.dimensions()
    }

    /// Provides read-only access to the spatial grid model.
    #[must_use]
    pub fn grid(world: &World) -> &BattleGrid {
        &world.grid
    }

    /// Captures a read-only view of every ship on the grid.
    #[must_use]
    pub fn fleet_view(world: &World) -> FleetView {
        FleetView::from_snapshots(world.fleet.iter().map(|ship| ship.snapshot()).collect())
    }

    /// Captures the state of a single ship.
    #[must_use]
    pub fn ship(world: &World, ship: ShipId) -> Option<ShipSnapshot> {
        world.fleet.get(ship).map(|state| state.snapshot())
    }

    /// Attribute record of a ship, when one is loaded.
    #[must_use]
    pub fn attributes(world: &World, ship: ShipId) -> Option<&ShipAttributes> {
        world
            .fleet
            .get(ship)
            .and_then(|state| state.attributes.as_ref())
    }

    /// Reports whether the ship already acted during the current round.
    #[must_use]
    pub fn has_moved(world: &World, ship: ShipId) -> bool {
        world.moved.contains(ship)
    }

    /// Ships of a side that already acted during the current round, in identifier order.
    #[must_use]
    pub fn moved_ships(world: &World, side: Side) -> Vec<ShipId> {
        world.moved.side(side).iter().copied().collect()
    }

    /// Side whose turn it is.
    #[must_use]
    pub fn current_turn(world: &World) -> Side {
        world.current_turn
    }

    /// Current round number.
    #[must_use]
    pub fn round(world: &World) -> u32 {
        world.round
    }

    /// Points held by both sides.
    #[must_use]
    pub fn scores(world: &World) -> Scores {
        world.scores
    }

    /// Terrain that is still active on the grid.
    #[must_use]
    pub fn layout(world: &World) -> MapLayout {
        MapLayout {
            blocked: world.grid.blocked_positions().collect(),
            scoring: world.grid.scoring_tiles().collect(),
        }
    }

    /// Captures the world as a snapshot that [`World::from_snapshot`] accepts.
    #[must_use]
    pub fn snapshot(world: &World) -> GameSnapshot {
        GameSnapshot {
            dimensions: dimensions(world),
            layout: layout(world),
            ships: world
                .fleet
                .iter()
                .map(|ship| ShipRecord {
                    id: ship.id,
                    owner: ship.owner,
                    position: ship.position,
                    special: ship.special,
                    attributes: ship.attributes.clone(),
                })
                .collect(),
            moved_creator: moved_ships(world, Side::Creator),
            moved_joiner: moved_ships(world, Side::Joiner),
            current_turn: world.current_turn,
            round: world.round,
            scores: world.scores,
        }
    }
}

/// Builds a `ConfigureMap` command with the layout clipped to the grid.
#[must_use]
pub fn configure_map(dimensions: GridDimensions, layout: &MapLayout) -> Command {
    Command::ConfigureMap {
        dimensions,
        layout: map::clip_layout(layout, dimensions),
    }
}
