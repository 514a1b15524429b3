#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shooting ranges, danger zones, and target legality.
//!
//! Every query is a pure function of the grid, the fleet, and the shooter's
//! attributes. Candidate lists are written into caller-owned buffers in
//! row-major cell order so repeated queries are deterministic.

use std::collections::BTreeSet;

use log::trace;
use warpflow_core::{
    BoundsError, FleetView, Position, ShipAttributes, ShipId, ShipSnapshot, SpecialAbility,
    TargetFilter, WeaponMode,
};
use warpflow_system_line_of_sight::has_line_of_sight;
use warpflow_system_movement::movement_range;
use warpflow_world::BattleGrid;

/// Reach of the weapon a ship is aiming with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShotProfile {
    /// Maximum Manhattan distance to a target.
    pub range: u32,
    /// Whether blocked cells between shooter and target are ignored.
    pub ignores_line_of_sight: bool,
}

/// Derives the shot profile of a ship for the active weapon mode.
///
/// Returns `None` in special mode for ships without a special ability.
#[must_use]
pub fn shot_profile(
    attributes: &ShipAttributes,
    special: SpecialAbility,
    mode: WeaponMode,
) -> Option<ShotProfile> {
    match mode {
        WeaponMode::Primary => Some(ShotProfile {
            range: attributes.range,
            ignores_line_of_sight: false,
        }),
        WeaponMode::Special => {
            if special.kind.effect().is_none() {
                return None;
            }
            Some(ShotProfile {
                range: special.range,
                ignores_line_of_sight: special.kind.ignores_line_of_sight(),
            })
        }
    }
}

/// Ownership filter applied to targets of the active weapon mode.
#[must_use]
pub fn target_filter(special: SpecialAbility, mode: WeaponMode) -> Option<TargetFilter> {
    match mode {
        WeaponMode::Primary => Some(TargetFilter::Enemies),
        WeaponMode::Special => special.kind.target_filter(),
    }
}

/// Cells a shot fired from `origin` can reach.
///
/// A cell qualifies when its distance lies in `1..=range` and it is adjacent,
/// or the profile ignores line of sight, or the line of sight is clear.
pub fn threat_range(
    grid: &BattleGrid,
    origin: Position,
    profile: ShotProfile,
) -> Result<BTreeSet<Position>, BoundsError> {
    let dimensions = grid.dimensions();
    dimensions.check(origin)?;

    let mut cells = BTreeSet::new();
    let radius = profile.range;
    let last_row = dimensions.height().saturating_sub(1);
    let last_col = dimensions.width().saturating_sub(1);
    let rows =
        origin.row().saturating_sub(radius)..=origin.row().saturating_add(radius).min(last_row);
    for row in rows {
        let cols =
            origin.col().saturating_sub(radius)..=origin.col().saturating_add(radius).min(last_col);
        for col in cols {
            let cell = Position::new(row, col);
            let distance = origin.manhattan_distance(cell);
            if distance == 0 || distance > radius {
                continue;
            }
            if distance == 1
                || profile.ignores_line_of_sight
                || has_line_of_sight(grid, origin, cell)?
            {
                let _ = cells.insert(cell);
            }
        }
    }
    Ok(cells)
}

/// Cells threatened by a ship after any legal move this turn.
///
/// The union of [`threat_range`] over every reachable cell and the current
/// cell. This is the most expensive query in the engine and callers are
/// expected to cache it until the selection or weapon mode changes.
pub fn danger_zone(
    grid: &BattleGrid,
    origin: Position,
    movement: u32,
    profile: ShotProfile,
) -> Result<BTreeSet<Position>, BoundsError> {
    let mut zone = threat_range(grid, origin, profile)?;
    for cell in movement_range(grid, origin, movement, None)? {
        zone.extend(threat_range(grid, cell, profile)?);
    }
    trace!("danger zone from {origin} covers {} cells", zone.len());
    Ok(zone)
}

/// Ship that may be aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetCandidate {
    /// Identifier of the ship.
    pub ship: ShipId,
    /// Cell the ship occupies.
    pub position: Position,
    /// Whether the ship is disabled.
    pub disabled: bool,
}

impl TargetCandidate {
    fn from_snapshot(snapshot: &ShipSnapshot) -> Self {
        Self {
            ship: snapshot.id,
            position: snapshot.position,
            disabled: snapshot.is_disabled(),
        }
    }
}

/// Collects the ships `shooter` may aim at from `origin` with the active weapon mode.
///
/// The output buffer is cleared first. Shooters without an attribute record,
/// or without a special ability in special mode, have no targets. The shooter
/// itself is never a target.
pub fn valid_targets(
    grid: &BattleGrid,
    fleet: &FleetView,
    shooter: &ShipSnapshot,
    origin: Position,
    mode: WeaponMode,
    out: &mut Vec<TargetCandidate>,
) -> Result<(), BoundsError> {
    out.clear();

    let Some(attributes) = shooter.attributes.as_ref() else {
        return Ok(());
    };
    let (Some(profile), Some(filter)) = (
        shot_profile(attributes, shooter.special, mode),
        target_filter(shooter.special, mode),
    ) else {
        return Ok(());
    };

    for cell in threat_range(grid, origin, profile)? {
        let Some(occupant) = grid.occupant_at(cell)? else {
            continue;
        };
        if occupant.ship == shooter.id || !filter.accepts(shooter.owner, occupant.owner) {
            continue;
        }
        if let Some(snapshot) = fleet.get(occupant.ship) {
            out.push(TargetCandidate::from_snapshot(snapshot));
        }
    }
    Ok(())
}

/// Collects disabled friendly ships adjacent to any of the provided origins.
///
/// The output buffer is cleared first. Each ship appears once, in identifier
/// order.
pub fn assist_targets(
    fleet: &FleetView,
    shooter: &ShipSnapshot,
    origins: &[Position],
    out: &mut Vec<TargetCandidate>,
) {
    out.clear();
    out.extend(
        fleet
            .iter()
            .filter(|ship| ship.id != shooter.id && ship.owner == shooter.owner)
            .filter(|ship| ship.is_disabled())
            .filter(|ship| {
                origins
                    .iter()
                    .any(|origin| origin.manhattan_distance(ship.position) == 1)
            })
            .map(TargetCandidate::from_snapshot),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpflow_core::SpecialKind;

    fn attributes(range: u32) -> ShipAttributes {
        ShipAttributes {
            range,
            gun_damage: 40,
            hull_points: 100,
            max_hull_points: 100,
            movement: 2,
            ..ShipAttributes::default()
        }
    }

    #[test]
    fn special_mode_without_ability_has_no_profile() {
        assert_eq!(
            shot_profile(&attributes(4), SpecialAbility::NONE, WeaponMode::Special),
            None
        );
        assert_eq!(target_filter(SpecialAbility::NONE, WeaponMode::Special), None);
    }

    #[test]
    fn special_profiles_ignore_line_of_sight() {
        for kind in [SpecialKind::Emp, SpecialKind::Repair, SpecialKind::Flak] {
            let profile = shot_profile(
                &attributes(4),
                SpecialAbility::new(kind, 6, 10),
                WeaponMode::Special,
            )
            .expect("ability present");
            assert_eq!(profile.range, 6);
            assert!(profile.ignores_line_of_sight, "{kind:?} must ignore occlusion");
        }
        let primary = shot_profile(
            &attributes(4),
            SpecialAbility::new(SpecialKind::Emp, 6, 10),
            WeaponMode::Primary,
        )
        .expect("primary always has a profile");
        assert_eq!(primary.range, 4);
        assert!(!primary.ignores_line_of_sight);
    }

    #[test]
    fn threat_range_on_open_grid_is_a_diamond() {
        let grid = BattleGrid::new(warpflow_core::FULL_GRID);
        let cells = threat_range(
            &grid,
            Position::new(6, 12),
            ShotProfile {
                range: 3,
                ignores_line_of_sight: false,
            },
        )
        .expect("origin in bounds");
        assert_eq!(cells.len(), 24);
    }
}
