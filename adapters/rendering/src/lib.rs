#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Warpflow adapters.
//!
//! The rules crates report overlapping facts about a cell: it may be a
//! movement tile, inside the threat range and hold a valid target all at
//! once. This crate folds those facts into a single [`CellVisual`] per cell
//! so every adapter styles the grid the same way.

use std::collections::BTreeSet;

use anyhow::Result as AnyResult;
use warpflow_core::{
    GridDimensions, Position, Scores, ShipId, Side, SpecialKind, WeaponMode,
};
use warpflow_system_actions::{ActionMachine, Selection};
use warpflow_system_damage::DamagePreview;
use warpflow_world::{query, Occupant, ScoringCell, World};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with a different opacity.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Flavor of a targeting highlight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TargetTint {
    /// Primary weapon.
    #[default]
    Weapon,
    /// Damaging area ability.
    Flak,
    /// Supportive or disruptive ability.
    Special,
    /// Assist on a disabled friendly ship.
    Assist,
}

impl TargetTint {
    /// Tint for the selected ship's active weapon mode.
    #[must_use]
    pub const fn for_mode(mode: WeaponMode, special: SpecialKind) -> Self {
        match (mode, special) {
            (WeaponMode::Primary, _) => Self::Weapon,
            (WeaponMode::Special, SpecialKind::Flak) => Self::Flak,
            (WeaponMode::Special, _) => Self::Special,
        }
    }
}

/// Every fact the rules report about a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellContext {
    /// Ship standing on the cell.
    pub occupant: Option<Occupant>,
    /// Whether the cell blocks line of sight.
    pub blocked: bool,
    /// Scoring value of the cell.
    pub scoring: ScoringCell,
    /// Whether the occupant is the selected ship.
    pub selected: bool,
    /// Whether the selected ship may still act.
    pub selected_can_move: bool,
    /// Whether the occupant belongs to the acting side and already acted this round.
    pub moved: bool,
    /// Whether the occupant is the picked target.
    pub selected_target: bool,
    /// Whether the occupant can be targeted by the selected ship.
    pub valid_target: bool,
    /// Whether the occupant can be assisted by the selected ship.
    pub assist_candidate: bool,
    /// Whether the selected ship can move here.
    pub movement_tile: bool,
    /// Whether the selected ship threatens the cell.
    pub threat_tile: bool,
    /// Whether the cell is the staged destination.
    pub staged: bool,
    /// Flavor of targeting highlights.
    pub tint: TargetTint,
}

/// Single visual state of a cell after resolving overlapping facts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellVisual {
    /// Holds the selected ship.
    Selected {
        /// Whether the ship may still act.
        can_move: bool,
    },
    /// Holds a ship of the acting side that already acted.
    Moved,
    /// Holds the picked target.
    SelectedTarget(TargetTint),
    /// Holds a ship the selected ship can target.
    ValidTarget(TargetTint),
    /// Holds a disabled friendly ship that can be assisted.
    AssistCandidate,
    /// Reachable by the selected ship.
    MovementTile,
    /// Threatened by the selected ship.
    ThreatTile,
    /// Nothing to highlight.
    Idle,
}

/// Resolves the visual state of a cell.
///
/// Precedence runs selected, moved, selected target, valid target, assist
/// candidate, movement tile, threat tile, idle. A picked target that is an
/// assist candidate is shown as an assist.
#[must_use]
pub const fn cell_visual(context: &CellContext) -> CellVisual {
    if context.selected {
        return CellVisual::Selected {
            can_move: context.selected_can_move,
        };
    }
    if context.moved {
        return CellVisual::Moved;
    }
    if context.selected_target {
        let tint = if context.assist_candidate {
            TargetTint::Assist
        } else {
            context.tint
        };
        return CellVisual::SelectedTarget(tint);
    }
    if context.valid_target {
        return CellVisual::ValidTarget(context.tint);
    }
    if context.assist_candidate {
        return CellVisual::AssistCandidate;
    }
    if context.movement_tile {
        return CellVisual::MovementTile;
    }
    if context.threat_tile {
        return CellVisual::ThreatTile;
    }
    CellVisual::Idle
}

const BLUE: Color = Color::from_rgb_u8(30, 58, 138);
const PURPLE: Color = Color::from_rgb_u8(88, 28, 135);
const GRAY: Color = Color::from_rgb_u8(55, 65, 81);
const RED: Color = Color::from_rgb_u8(127, 29, 29);
const ORANGE: Color = Color::from_rgb_u8(124, 45, 18);
const CYAN: Color = Color::from_rgb_u8(22, 78, 99);
const GREEN: Color = Color::from_rgb_u8(20, 83, 45);
const ALERT: Color = Color::from_rgb_u8(239, 68, 68);
const VOID: Color = Color::from_rgb_u8(3, 7, 18);
const GOLD: Color = Color::from_rgb_u8(250, 204, 21);

/// Background color of a visual state.
#[must_use]
pub const fn palette(visual: CellVisual) -> Color {
    match visual {
        CellVisual::Selected { can_move: true } => BLUE,
        CellVisual::Selected { can_move: false } => PURPLE,
        CellVisual::Moved => GRAY.with_alpha(0.6),
        CellVisual::SelectedTarget(tint) => tint_color(tint),
        CellVisual::ValidTarget(TargetTint::Weapon) => ORANGE.with_alpha(0.5),
        CellVisual::ValidTarget(tint) => tint_color(tint).with_alpha(0.5),
        CellVisual::AssistCandidate => CYAN.with_alpha(0.5),
        CellVisual::MovementTile => GREEN.with_alpha(0.5),
        CellVisual::ThreatTile => ALERT.with_alpha(0.1),
        CellVisual::Idle => VOID,
    }
}

const fn tint_color(tint: TargetTint) -> Color {
    match tint {
        TargetTint::Weapon | TargetTint::Flak => RED,
        TargetTint::Special => BLUE,
        TargetTint::Assist => CYAN,
    }
}

/// Marker color of a side's ships.
#[must_use]
pub const fn side_color(side: Side) -> Color {
    match side {
        Side::Creator => Color::from_rgb_u8(59, 130, 246),
        Side::Joiner => Color::from_rgb_u8(239, 68, 68),
    }
}

/// Border drawn around ships holding a scoring tile.
#[must_use]
pub const fn scoring_border(context: &CellContext) -> Option<Color> {
    if context.occupant.is_some() && context.scoring.yields_points() {
        Some(GOLD)
    } else {
        None
    }
}

/// Short caption printed inside a cell.
#[must_use]
pub fn cell_caption(context: &CellContext) -> Option<String> {
    if context.occupant.is_some() {
        return None;
    }
    if context.scoring.yields_points() {
        let marker = if context.scoring.reusable { "" } else { "!" };
        return Some(format!("+{}{marker}", context.scoring.points));
    }
    None
}

/// Label floated above a target showing what the committed action would do.
#[must_use]
pub fn damage_label(preview: &DamagePreview, mode: WeaponMode, special: SpecialKind) -> String {
    if preview.reactor_critical {
        return "Reactor Critical +1".to_owned();
    }
    match (mode, special) {
        (WeaponMode::Special, SpecialKind::Repair) => {
            format!("Repair {} HP", preview.display_amount(mode, false))
        }
        (WeaponMode::Special, SpecialKind::Emp) => "EMP Disrupt".to_owned(),
        _ => {
            let amount = preview.display_amount(mode, true);
            if preview.lethal {
                format!("{amount} DMG (KILL)")
            } else {
                format!("{amount} DMG")
            }
        }
    }
}

/// Cell of a scene with its resolved visual state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneCell {
    /// Position of the cell.
    pub position: Position,
    /// Facts reported by the rules.
    pub context: CellContext,
    /// Resolved visual state.
    pub visual: CellVisual,
    /// Caption printed inside the cell.
    pub caption: Option<String>,
}

/// Label anchored to a cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneLabel {
    /// Anchor cell.
    pub position: Position,
    /// Label text.
    pub text: String,
}

/// Frame-ready description of the battle from the acting side's view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scene {
    /// Grid size.
    pub dimensions: GridDimensions,
    /// Every cell in row-major order.
    pub cells: Vec<SceneCell>,
    /// Current selection.
    pub selection: Option<Selection>,
    /// Damage label for the picked target.
    pub damage_label: Option<SceneLabel>,
    /// Side whose turn it is.
    pub current_turn: Side,
    /// Round counter.
    pub round: u32,
    /// Score of both sides.
    pub scores: Scores,
}

impl Scene {
    /// Cell at the position.
    #[must_use]
    pub fn cell(&self, position: Position) -> Option<&SceneCell> {
        self.dimensions
            .index(position)
            .and_then(|index| self.cells.get(index))
    }
}

/// Computes the context and visual state of every cell once.
#[must_use]
pub fn build_scene(world: &World, machine: &ActionMachine) -> Scene {
    let grid = query::grid(world);
    let dimensions = grid.dimensions();
    let selection = machine.selection();
    let acting_turn = query::current_turn(world) == machine.acting_side();

    let movement = machine.movement_range(world);
    let threat = if machine.is_dragging() {
        machine.drag_threat_range(world)
    } else {
        machine.threat_range(world)
    };
    let targets: BTreeSet<ShipId> = machine
        .valid_targets(world)
        .into_iter()
        .map(|candidate| candidate.ship)
        .collect();
    let assists: BTreeSet<ShipId> = machine
        .assist_targets(world)
        .into_iter()
        .map(|candidate| candidate.ship)
        .collect();

    let special = selection
        .and_then(|selection| query::ship(world, selection.ship))
        .map_or(SpecialKind::None, |ship| ship.special.kind);
    let tint = selection.map_or(TargetTint::Weapon, |selection| {
        TargetTint::for_mode(selection.mode, special)
    });
    let picked = selection
        .and_then(|selection| selection.target)
        .and_then(|target| target.ship());

    let cells = dimensions
        .positions()
        .map(|position| {
            let occupant = grid.occupant_at(position).ok().flatten();
            let ship = occupant.map(|occupant| occupant.ship);
            let context = CellContext {
                occupant,
                blocked: grid.is_blocked(position).unwrap_or(false),
                scoring: grid.scoring_at(position).unwrap_or_default(),
                selected: ship.is_some() && ship == selection.map(|selection| selection.ship),
                selected_can_move: selection.is_some_and(|selection| selection.actionable),
                moved: occupant.is_some_and(|occupant| {
                    acting_turn
                        && occupant.owner == machine.acting_side()
                        && query::has_moved(world, occupant.ship)
                }),
                selected_target: ship.is_some() && ship == picked,
                valid_target: ship.is_some_and(|ship| targets.contains(&ship)),
                assist_candidate: ship.is_some_and(|ship| assists.contains(&ship)),
                movement_tile: movement.contains(&position),
                threat_tile: threat.contains(&position),
                staged: selection.and_then(|selection| selection.preview) == Some(position),
                tint,
            };
            SceneCell {
                position,
                visual: cell_visual(&context),
                caption: cell_caption(&context),
                context,
            }
        })
        .collect();

    let label = match (selection, picked) {
        (Some(selection), Some(target)) => machine.damage_preview(world).and_then(|preview| {
            query::ship(world, target).map(|ship| SceneLabel {
                position: ship.position,
                text: damage_label(&preview, selection.mode, special),
            })
        }),
        _ => None,
    };

    Scene {
        dimensions,
        cells,
        selection,
        damage_label: label,
        current_turn: query::current_turn(world),
        round: query::round(world),
        scores: query::scores(world),
    }
}

/// Rendering backend capable of presenting Warpflow scenes.
pub trait RenderingBackend {
    /// Presents a single scene.
    fn present(&mut self, scene: &Scene) -> AnyResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lighten_moves_channels_towards_white() {
        let color = Color::new(0.2, 0.4, 1.0, 0.5).lighten(0.5);
        assert!((color.red - 0.6).abs() < 1e-6);
        assert!((color.green - 0.7).abs() < 1e-6);
        assert!((color.blue - 1.0).abs() < 1e-6);
        assert!((color.alpha - 0.5).abs() < 1e-6, "alpha is preserved");
    }

    #[test]
    fn selection_outranks_every_other_fact() {
        let context = CellContext {
            selected: true,
            moved: true,
            valid_target: true,
            movement_tile: true,
            threat_tile: true,
            ..CellContext::default()
        };
        assert_eq!(
            cell_visual(&context),
            CellVisual::Selected { can_move: false }
        );
    }

    #[test]
    fn picked_assist_target_uses_the_assist_tint() {
        let context = CellContext {
            selected_target: true,
            assist_candidate: true,
            tint: TargetTint::Special,
            ..CellContext::default()
        };
        assert_eq!(
            cell_visual(&context),
            CellVisual::SelectedTarget(TargetTint::Assist)
        );
        assert_eq!(palette(cell_visual(&context)), CYAN);
    }

    #[test]
    fn movement_outranks_threat() {
        let context = CellContext {
            movement_tile: true,
            threat_tile: true,
            ..CellContext::default()
        };
        assert_eq!(cell_visual(&context), CellVisual::MovementTile);
        assert_eq!(cell_visual(&CellContext::default()), CellVisual::Idle);
    }

    #[test]
    fn labels_follow_the_weapon_mode() {
        let hit = DamagePreview {
            raw: 30,
            mitigated: 24,
            lethal: false,
            reactor_critical: false,
        };
        assert_eq!(damage_label(&hit, WeaponMode::Primary, SpecialKind::None), "24 DMG");
        assert_eq!(
            damage_label(&hit, WeaponMode::Special, SpecialKind::Repair),
            "Repair 30 HP"
        );
        assert_eq!(
            damage_label(&hit, WeaponMode::Special, SpecialKind::Flak),
            "24 DMG",
            "flak shows reduced damage"
        );
        let critical = DamagePreview {
            reactor_critical: true,
            ..hit
        };
        assert_eq!(
            damage_label(&critical, WeaponMode::Primary, SpecialKind::None),
            "Reactor Critical +1"
        );
    }
}
