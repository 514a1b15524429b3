#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn-based action state machine for the acting player.
//!
//! The machine walks `Idle → ShipSelected → PreviewingMove/Targeting → Idle`.
//! Every transition validates against the current world and fails with an
//! [`IllegalTransition`] without touching the machine. A successful commit
//! yields the [`ActionIntent`] for the contract layer and the optimistic world
//! commands the caller should apply locally.

mod selection;

use std::collections::BTreeSet;

use log::{debug, info};
use warpflow_core::{
    ActionIntent, ActionKind, Command, IllegalTransition, MissingAttributes, Position, ShipId,
    ShipSnapshot, Side, SpecialKind, TargetChoice, WeaponMode,
};
use warpflow_system_damage::{DamagePreview, DamageRules};
use warpflow_system_movement::movement_range;
use warpflow_system_targeting::{
    assist_targets, danger_zone, shot_profile, threat_range, valid_targets, TargetCandidate,
};
use warpflow_world::{query, World};

use crate::selection::Drag;

pub use crate::selection::{Phase, Selection};

/// Action a player commits for the selected ship.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommitKind {
    /// Move (or stay) without acting.
    Pass,
    /// Fire the primary weapon at the picked target.
    Shoot,
    /// Use the special ability on the picked target or area.
    Special,
    /// Restore the picked disabled friendly ship.
    Assist,
    /// Leave the battle.
    Retreat,
    /// Claim the scoring cell at the destination.
    ClaimPoints,
}

/// Selection and preview state machine for one player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionMachine {
    acting_side: Side,
    rules: DamageRules,
    selection: Option<Selection>,
    drag: Option<Drag>,
    danger_zone: BTreeSet<Position>,
}

impl ActionMachine {
    /// Creates an idle machine for the provided side using the default damage rules.
    #[must_use]
    pub fn new(acting_side: Side) -> Self {
        Self::with_rules(acting_side, DamageRules::default())
    }

    /// Creates an idle machine with explicit damage rules.
    #[must_use]
    pub fn with_rules(acting_side: Side, rules: DamageRules) -> Self {
        Self {
            acting_side,
            rules,
            selection: None,
            drag: None,
            danger_zone: BTreeSet::new(),
        }
    }

    /// Side the machine acts for.
    #[must_use]
    pub const fn acting_side(&self) -> Side {
        self.acting_side
    }

    /// Damage rules used for previews.
    #[must_use]
    pub const fn rules(&self) -> &DamageRules {
        &self.rules
    }

    /// Current phase of the machine.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.selection.map_or(Phase::Idle, |selection| selection.phase())
    }

    /// Current selection, if any.
    #[must_use]
    pub const fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Reports whether a drag is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Cell under the pointer of the drag in progress.
    #[must_use]
    pub fn drag_hover(&self) -> Option<Position> {
        self.drag.and_then(|drag| drag.hover)
    }

    /// Selects a ship. Any ship on the grid may be selected for inspection.
    ///
    /// Selection resets the weapon mode and target. An actionable ship standing
    /// on a scoring cell gets its own cell staged so points can be claimed
    /// without moving.
    pub fn select_ship(
        &mut self,
        world: &World,
        ship: ShipId,
    ) -> Result<Selection, IllegalTransition> {
        let snapshot =
            query::ship(world, ship).ok_or_else(|| rejected(IllegalTransition::UnknownShip(ship)))?;

        let actionable = self.is_actionable(world, &snapshot);
        let mut selection = Selection::new(ship, actionable);
        if actionable && stands_on_scoring_cell(world, snapshot.position) {
            selection.preview = Some(snapshot.position);
        }

        self.drag = None;
        self.selection = Some(selection);
        self.refresh_danger_zone(world);
        debug!("selected ship {ship} (actionable: {actionable})");
        Ok(selection)
    }

    /// Clears the selection.
    pub fn deselect(&mut self) {
        self.selection = None;
        self.drag = None;
        self.danger_zone.clear();
    }

    /// Stages a destination for the selected ship.
    ///
    /// The destination must be in the ship's movement range, or be its own cell.
    /// Staging clears any picked target.
    pub fn preview_move(
        &mut self,
        world: &World,
        destination: Position,
    ) -> Result<(), IllegalTransition> {
        let (mut selection, ship) = self.actionable_subject(world).map_err(rejected)?;
        query::dimensions(world)
            .check(destination)
            .map_err(|error| rejected(error.into()))?;

        if destination != ship.position {
            let reachable = self.reachable(world, &ship, selection.preview).map_err(rejected)?;
            if !reachable.contains(&destination) {
                return Err(rejected(IllegalTransition::OutOfMovementRange(destination)));
            }
        }

        selection.preview = Some(destination);
        selection.target = None;
        self.selection = Some(selection);
        Ok(())
    }

    /// Drops the staged destination and picked target.
    pub fn cancel_preview(&mut self) -> Result<(), IllegalTransition> {
        let selection = self
            .selection
            .as_mut()
            .ok_or_else(|| rejected(IllegalTransition::NoSelection))?;
        selection.preview = None;
        selection.target = None;
        Ok(())
    }

    /// Picks a target for the selected ship.
    pub fn select_target(
        &mut self,
        world: &World,
        choice: TargetChoice,
    ) -> Result<(), IllegalTransition> {
        let (mut selection, ship) = self.actionable_subject(world).map_err(rejected)?;
        if !target_is_legal(world, &ship, &selection, choice).map_err(rejected)? {
            return Err(rejected(IllegalTransition::InvalidTarget(choice)));
        }
        selection.target = Some(choice);
        self.selection = Some(selection);
        Ok(())
    }

    /// Drops the picked target.
    pub fn clear_target(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.target = None;
        }
    }

    /// Switches between the primary weapon and the special ability.
    ///
    /// A picked target that is no longer legal under the new mode is dropped.
    /// Ships without an ability may switch to special mode but have nothing
    /// to aim at there.
    pub fn switch_weapon_mode(
        &mut self,
        world: &World,
        mode: WeaponMode,
    ) -> Result<(), IllegalTransition> {
        let (mut selection, ship) = self.subject(world).map_err(rejected)?;
        selection.mode = mode;
        if let Some(target) = selection.target {
            if !target_is_legal(world, &ship, &selection, target).unwrap_or(false) {
                selection.target = None;
            }
        }
        self.selection = Some(selection);
        self.refresh_danger_zone(world);
        Ok(())
    }

    /// Starts dragging a ship. The current selection is stashed and restored if
    /// the drag does not end on a legal cell.
    pub fn begin_drag(&mut self, world: &World, ship: ShipId) -> Result<(), IllegalTransition> {
        if self.selection.map(|selection| selection.ship) != Some(ship) {
            let before = (self.selection, self.drag, self.danger_zone.clone());
            let selected = self.select_ship(world, ship)?;
            if !selected.actionable {
                (self.selection, self.drag, self.danger_zone) = before;
                return Err(rejected(IllegalTransition::NotActionable(ship)));
            }
        }

        let (mut selection, _) = self.actionable_subject(world).map_err(rejected)?;
        let stash = selection;
        selection.preview = None;
        selection.target = None;
        self.selection = Some(selection);
        self.drag = Some(Drag { stash, hover: None });
        Ok(())
    }

    /// Tracks the cell under the pointer. Returns whether dropping there is legal.
    pub fn drag_over(&mut self, world: &World, cell: Position) -> Result<bool, IllegalTransition> {
        let mut drag = self
            .drag
            .ok_or_else(|| rejected(IllegalTransition::DragInactive))?;
        query::dimensions(world)
            .check(cell)
            .map_err(|error| rejected(error.into()))?;
        drag.hover = Some(cell);
        self.drag = Some(drag);
        Ok(self.movement_range(world).contains(&cell))
    }

    /// Finishes a drag. A drop on a reachable cell stages it as the destination.
    /// Any other drop restores the selection held before the drag.
    pub fn drop(&mut self, world: &World, cell: Position) -> Result<(), IllegalTransition> {
        let drag = self
            .drag
            .take()
            .ok_or_else(|| rejected(IllegalTransition::DragInactive))?;

        if self.movement_range(world).contains(&cell) {
            if let Some(selection) = self.selection.as_mut() {
                selection.preview = Some(cell);
                selection.target = None;
            }
            return Ok(());
        }

        self.selection = Some(drag.stash);
        Err(rejected(IllegalTransition::OutOfMovementRange(cell)))
    }

    /// Abandons a drag and restores the selection held before it.
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.selection = Some(drag.stash);
        }
    }

    /// Commits the selected ship's turn.
    ///
    /// On success the machine returns to idle, the optimistic move and
    /// moved-marker commands are appended to `out`, and the intent for the
    /// contract layer is returned.
    pub fn commit(
        &mut self,
        world: &World,
        kind: CommitKind,
        out: &mut Vec<Command>,
    ) -> Result<ActionIntent, IllegalTransition> {
        let intent = self.plan_commit(world, kind).map_err(rejected)?;
        let current = query::ship(world, intent.ship).map(|ship| ship.position);
        if current != Some(intent.destination) {
            out.push(Command::MoveShip {
                ship: intent.ship,
                to: intent.destination,
            });
        }
        out.push(Command::MarkMoved { ship: intent.ship });

        info!(
            "committed {:?} for ship {} at {}",
            intent.action, intent.ship, intent.destination
        );
        self.deselect();
        Ok(intent)
    }

    /// Validates a commit without changing the machine.
    pub fn plan_commit(
        &self,
        world: &World,
        kind: CommitKind,
    ) -> Result<ActionIntent, IllegalTransition> {
        let selection = self.selection.ok_or(IllegalTransition::NoSelection)?;
        if query::current_turn(world) != self.acting_side {
            return Err(IllegalTransition::NotYourTurn);
        }
        let ship = query::ship(world, selection.ship)
            .ok_or(IllegalTransition::UnknownShip(selection.ship))?;
        if !self.is_actionable(world, &ship) {
            return Err(IllegalTransition::NotActionable(ship.id));
        }

        let destination = selection.preview.unwrap_or(ship.position);
        if destination != ship.position {
            let reachable = self.reachable(world, &ship, None)?;
            if !reachable.contains(&destination) {
                return Err(IllegalTransition::OutOfMovementRange(destination));
            }
        }

        let action = match kind {
            CommitKind::Pass => ActionKind::Pass,
            CommitKind::Retreat => ActionKind::Retreat,
            CommitKind::ClaimPoints => {
                if !stands_on_scoring_cell(world, destination) {
                    return Err(IllegalTransition::NotOnScoringTile(destination));
                }
                ActionKind::ClaimPoints
            }
            CommitKind::Shoot => {
                if selection.mode != WeaponMode::Primary {
                    return Err(IllegalTransition::WrongWeaponMode);
                }
                let target = picked_ship(selection)?;
                if !in_weapon_range(world, &ship, destination, WeaponMode::Primary, target)? {
                    return Err(IllegalTransition::InvalidTarget(TargetChoice::Ship(target)));
                }
                ActionKind::Shoot { target }
            }
            CommitKind::Special => {
                if ship.special.kind == SpecialKind::None {
                    return Err(IllegalTransition::NoSpecialAbility(ship.id));
                }
                if selection.mode != WeaponMode::Special {
                    return Err(IllegalTransition::WrongWeaponMode);
                }
                let choice = selection.target.ok_or(IllegalTransition::NoTarget)?;
                if !target_is_legal(world, &ship, &selection, choice)? {
                    return Err(IllegalTransition::InvalidTarget(choice));
                }
                let target = if ship.special.kind.is_area_effect() {
                    TargetChoice::AreaEffect
                } else {
                    choice
                };
                if let TargetChoice::Ship(id) = target {
                    if !in_weapon_range(world, &ship, destination, WeaponMode::Special, id)? {
                        return Err(IllegalTransition::InvalidTarget(target));
                    }
                }
                ActionKind::Special { target }
            }
            CommitKind::Assist => {
                let target = picked_ship(selection)?;
                let mut candidates = Vec::new();
                assist_targets(
                    &query::fleet_view(world),
                    &ship,
                    &assist_origins(&ship, &selection),
                    &mut candidates,
                );
                if !candidates.iter().any(|candidate| candidate.ship == target) {
                    return Err(IllegalTransition::InvalidTarget(TargetChoice::Ship(target)));
                }
                ActionKind::Assist { target }
            }
        };

        Ok(ActionIntent {
            ship: ship.id,
            destination,
            action,
        })
    }

    /// Clears all transient state. Called when the turn or round advances.
    pub fn reset(&mut self) {
        self.deselect();
    }

    /// Re-validates the selection after the world changed underneath it.
    ///
    /// A selection whose ship left the grid is dropped. A ship that can no
    /// longer act keeps its selection for inspection but loses its staged
    /// move and target.
    pub fn reconcile(&mut self, world: &World) {
        let Some(mut selection) = self.selection else {
            return;
        };
        let Some(ship) = query::ship(world, selection.ship) else {
            debug!("selected ship {} left the grid", selection.ship);
            self.deselect();
            return;
        };

        selection.actionable = self.is_actionable(world, &ship);
        if !selection.actionable {
            selection.preview = None;
            selection.target = None;
            self.drag = None;
        } else if let Some(target) = selection.target {
            if !target_is_legal(world, &ship, &selection, target).unwrap_or(false) {
                selection.target = None;
            }
        }
        self.selection = Some(selection);
        self.refresh_danger_zone(world);
    }

    /// Cells the selected ship may move to. Empty for ships that cannot act.
    #[must_use]
    pub fn movement_range(&self, world: &World) -> BTreeSet<Position> {
        let Ok((selection, ship)) = self.actionable_subject(world) else {
            return BTreeSet::new();
        };
        self.reachable(world, &ship, selection.preview)
            .unwrap_or_default()
    }

    /// Cells the selected ship threatens from its staged (or current) cell.
    #[must_use]
    pub fn threat_range(&self, world: &World) -> BTreeSet<Position> {
        let Ok((selection, ship)) = self.subject(world) else {
            return BTreeSet::new();
        };
        threat_from(world, &ship, selection.mode, selection.preview.unwrap_or(ship.position))
    }

    /// Cells threatened from the cell under the pointer during a drag.
    #[must_use]
    pub fn drag_threat_range(&self, world: &World) -> BTreeSet<Position> {
        let Some(hover) = self.drag_hover() else {
            return BTreeSet::new();
        };
        let Ok((selection, ship)) = self.subject(world) else {
            return BTreeSet::new();
        };
        if hover != ship.position && !self.movement_range(world).contains(&hover) {
            return BTreeSet::new();
        }
        threat_from(world, &ship, selection.mode, hover)
    }

    /// Cached union of the selected ship's threat over every reachable cell.
    #[must_use]
    pub const fn danger_zone(&self) -> &BTreeSet<Position> {
        &self.danger_zone
    }

    /// Ships the selected ship may aim at with the active weapon mode.
    #[must_use]
    pub fn valid_targets(&self, world: &World) -> Vec<TargetCandidate> {
        let mut out = Vec::new();
        let Ok((selection, ship)) = self.actionable_subject(world) else {
            return out;
        };
        let origin = selection.preview.unwrap_or(ship.position);
        let fleet = query::fleet_view(world);
        if let Err(error) = valid_targets(
            query::grid(world),
            &fleet,
            &ship,
            origin,
            selection.mode,
            &mut out,
        ) {
            debug!("target query failed: {error}");
            out.clear();
        }
        out
    }

    /// Disabled friendly ships the selected ship may assist.
    #[must_use]
    pub fn assist_targets(&self, world: &World) -> Vec<TargetCandidate> {
        let mut out = Vec::new();
        if let Ok((selection, ship)) = self.actionable_subject(world) {
            assist_targets(
                &query::fleet_view(world),
                &ship,
                &assist_origins(&ship, &selection),
                &mut out,
            );
        }
        out
    }

    /// Damage preview against the picked target ship.
    #[must_use]
    pub fn damage_preview(&self, world: &World) -> Option<DamagePreview> {
        let selection = self.selection?;
        let target = selection.target?.ship()?;
        warpflow_system_damage::preview(
            &self.rules,
            &query::fleet_view(world),
            selection.ship,
            target,
            selection.mode,
        )
    }

    fn is_actionable(&self, world: &World, ship: &ShipSnapshot) -> bool {
        ship.owner == self.acting_side
            && query::current_turn(world) == self.acting_side
            && !query::has_moved(world, ship.id)
    }

    fn subject(&self, world: &World) -> Result<(Selection, ShipSnapshot), IllegalTransition> {
        let selection = self.selection.ok_or(IllegalTransition::NoSelection)?;
        let ship = query::ship(world, selection.ship)
            .ok_or(IllegalTransition::UnknownShip(selection.ship))?;
        Ok((selection, ship))
    }

    fn actionable_subject(
        &self,
        world: &World,
    ) -> Result<(Selection, ShipSnapshot), IllegalTransition> {
        let (selection, ship) = self.subject(world)?;
        if !selection.actionable || !self.is_actionable(world, &ship) {
            return Err(IllegalTransition::NotActionable(ship.id));
        }
        Ok((selection, ship))
    }

    fn reachable(
        &self,
        world: &World,
        ship: &ShipSnapshot,
        staged: Option<Position>,
    ) -> Result<BTreeSet<Position>, IllegalTransition> {
        let attributes = ship.require_attributes()?;
        Ok(movement_range(
            query::grid(world),
            ship.position,
            attributes.movement,
            staged,
        )?)
    }

    fn refresh_danger_zone(&mut self, world: &World) {
        self.danger_zone.clear();
        let Ok((selection, ship)) = self.subject(world) else {
            return;
        };
        let Some(attributes) = ship.attributes.as_ref() else {
            return;
        };
        let Some(profile) = shot_profile(attributes, ship.special, selection.mode) else {
            return;
        };
        let grid = query::grid(world);
        let zone = if query::has_moved(world, ship.id) {
            threat_range(grid, ship.position, profile)
        } else {
            danger_zone(grid, ship.position, attributes.movement, profile)
        };
        match zone {
            Ok(zone) => self.danger_zone = zone,
            Err(error) => debug!("danger zone for ship {} unavailable: {error}", ship.id),
        }
    }
}

fn rejected(error: IllegalTransition) -> IllegalTransition {
    debug!("transition rejected: {error}");
    error
}

fn stands_on_scoring_cell(world: &World, position: Position) -> bool {
    query::grid(world)
        .scoring_at(position)
        .is_ok_and(|cell| cell.yields_points())
}

fn picked_ship(selection: Selection) -> Result<ShipId, IllegalTransition> {
    match selection.target {
        Some(TargetChoice::Ship(ship)) => Ok(ship),
        Some(choice) => Err(IllegalTransition::InvalidTarget(choice)),
        None => Err(IllegalTransition::NoTarget),
    }
}

fn assist_origins(ship: &ShipSnapshot, selection: &Selection) -> Vec<Position> {
    let mut origins = vec![ship.position];
    if let Some(preview) = selection.preview {
        if preview != ship.position {
            origins.push(preview);
        }
    }
    origins
}

fn threat_from(
    world: &World,
    ship: &ShipSnapshot,
    mode: WeaponMode,
    origin: Position,
) -> BTreeSet<Position> {
    ship.attributes
        .as_ref()
        .and_then(|attributes| shot_profile(attributes, ship.special, mode))
        .and_then(|profile| threat_range(query::grid(world), origin, profile).ok())
        .unwrap_or_default()
}

fn in_weapon_range(
    world: &World,
    ship: &ShipSnapshot,
    origin: Position,
    mode: WeaponMode,
    target: ShipId,
) -> Result<bool, IllegalTransition> {
    if ship.attributes.is_none() {
        return Err(MissingAttributes(ship.id).into());
    }
    let mut candidates = Vec::new();
    valid_targets(
        query::grid(world),
        &query::fleet_view(world),
        ship,
        origin,
        mode,
        &mut candidates,
    )?;
    Ok(candidates.iter().any(|candidate| candidate.ship == target))
}

fn target_is_legal(
    world: &World,
    ship: &ShipSnapshot,
    selection: &Selection,
    choice: TargetChoice,
) -> Result<bool, IllegalTransition> {
    let origin = selection.preview.unwrap_or(ship.position);
    match choice {
        TargetChoice::AreaEffect => {
            if selection.mode != WeaponMode::Special || !ship.special.kind.is_area_effect() {
                return Ok(false);
            }
            let fleet = query::fleet_view(world);
            let mut candidates: Vec<TargetCandidate> = Vec::new();
            valid_targets(
                query::grid(world),
                &fleet,
                ship,
                origin,
                WeaponMode::Special,
                &mut candidates,
            )?;
            Ok(!candidates.is_empty())
        }
        TargetChoice::Ship(target) => {
            if in_weapon_range(world, ship, origin, selection.mode, target)? {
                return Ok(true);
            }
            let mut candidates = Vec::new();
            assist_targets(
                &query::fleet_view(world),
                ship,
                &assist_origins(ship, selection),
                &mut candidates,
            );
            Ok(candidates.iter().any(|candidate| candidate.ship == target))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpflow_core::{ShipAttributes, SpecialAbility, TUTORIAL_GRID};
    use warpflow_world as world;

    fn world_with_ship(owner: Side) -> World {
        let mut world = World::with_dimensions(TUTORIAL_GRID);
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::PlaceShip {
                ship: ShipId::new(1),
                owner,
                position: Position::new(5, 5),
                special: SpecialAbility::NONE,
            },
            &mut events,
        );
        world::apply(
            &mut world,
            Command::SetAttributes {
                ship: ShipId::new(1),
                attributes: ShipAttributes {
                    range: 3,
                    gun_damage: 25,
                    hull_points: 100,
                    max_hull_points: 100,
                    movement: 3,
                    ..ShipAttributes::default()
                },
            },
            &mut events,
        );
        world
    }

    #[test]
    fn enemy_ships_are_selectable_but_not_actionable() {
        let world = world_with_ship(Side::Joiner);
        let mut machine = ActionMachine::new(Side::Creator);
        let selection = machine
            .select_ship(&world, ShipId::new(1))
            .expect("any ship can be inspected");
        assert!(!selection.actionable);
        assert!(machine.movement_range(&world).is_empty());
        assert!(
            !machine.danger_zone().is_empty(),
            "enemy threat is still shown for inspection"
        );
    }

    #[test]
    fn special_mode_without_an_ability_has_no_targets() {
        let world = world_with_ship(Side::Creator);
        let mut machine = ActionMachine::new(Side::Creator);
        let _ = machine
            .select_ship(&world, ShipId::new(1))
            .expect("own ship selectable");
        machine
            .switch_weapon_mode(&world, WeaponMode::Special)
            .expect("switching is legal while a ship is selected");
        assert_eq!(
            machine.selection().map(|selection| selection.mode),
            Some(WeaponMode::Special)
        );
        assert!(machine.valid_targets(&world).is_empty());
        assert!(machine.danger_zone().is_empty());
        assert!(machine.threat_range(&world).is_empty());

        let mut commands = Vec::new();
        assert_eq!(
            machine.commit(&world, CommitKind::Special, &mut commands),
            Err(IllegalTransition::NoSpecialAbility(ShipId::new(1)))
        );
        assert!(commands.is_empty());
    }

    #[test]
    fn drag_queries_fail_without_a_drag() {
        let world = world_with_ship(Side::Creator);
        let mut machine = ActionMachine::new(Side::Creator);
        assert_eq!(
            machine.drag_over(&world, Position::new(0, 0)),
            Err(IllegalTransition::DragInactive)
        );
        assert!(machine.drag_threat_range(&world).is_empty());
    }
}
