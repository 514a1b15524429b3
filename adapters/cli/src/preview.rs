use std::io::Write;

use anyhow::{Context, Result};
use log::info;
use warpflow_core::{GameSnapshot, Position, ShipId, Side, TargetChoice, WeaponMode};
use warpflow_rendering::{build_scene, damage_label, RenderingBackend};
use warpflow_system_actions::ActionMachine;
use warpflow_system_damage::{DamageRules, DisabledTargetPolicy};
use warpflow_system_ship_stats::special_name;
use warpflow_world::{query, World};

use crate::ascii::{side_name, AsciiBackend};

/// Inputs of a single preview run.
#[derive(Clone, Debug)]
pub(crate) struct PreviewRequest {
    /// Battle to inspect.
    pub(crate) snapshot: GameSnapshot,
    /// Ship to select.
    pub(crate) ship: ShipId,
    /// Side the preview is computed for.
    pub(crate) acting: Side,
    /// Aim with the special ability instead of the primary weapon.
    pub(crate) special: bool,
    /// Cell to stage the move to.
    pub(crate) stage: Option<Position>,
    /// Ship to pick as the target.
    pub(crate) target: Option<ShipId>,
    /// Let repairs restore disabled ships instead of escalating their reactor.
    pub(crate) repair_disabled: bool,
}

/// Selects the requested ship and prints its ranges, targets and the grid.
pub(crate) fn run<W: Write>(out: &mut W, request: &PreviewRequest) -> Result<()> {
    let world = World::from_snapshot(&request.snapshot);
    let rules = DamageRules {
        disabled_target_policy: if request.repair_disabled {
            DisabledTargetPolicy::EscalateHostileOnly
        } else {
            DisabledTargetPolicy::EscalateAlways
        },
    };
    let mut machine = ActionMachine::with_rules(request.acting, rules);

    let ship = query::ship(&world, request.ship)
        .with_context(|| format!("ship {} is not in the snapshot", request.ship))?;
    let selection = machine
        .select_ship(&world, request.ship)
        .with_context(|| format!("could not select ship {}", request.ship))?;
    if request.special {
        machine
            .switch_weapon_mode(&world, WeaponMode::Special)
            .context("could not switch to the special ability")?;
    }
    if let Some(cell) = request.stage {
        machine
            .preview_move(&world, cell)
            .with_context(|| format!("could not stage a move to {cell}"))?;
    }
    if let Some(target) = request.target {
        machine
            .select_target(&world, TargetChoice::Ship(target))
            .with_context(|| format!("could not target ship {target}"))?;
    }
    info!(
        "previewing ship {} for the {} side",
        request.ship,
        side_name(request.acting)
    );

    let mode = if request.special {
        WeaponMode::Special
    } else {
        WeaponMode::Primary
    };
    writeln!(
        out,
        "ship {} ({}) at {} special {}{}",
        ship.id,
        side_name(ship.owner),
        ship.position,
        special_name(ship.special.kind),
        if selection.actionable {
            ""
        } else {
            " [inspect only]"
        }
    )
    .context("failed to write ship summary")?;
    writeln!(
        out,
        "movement range: {} cells\nthreat range: {} cells",
        machine.movement_range(&world).len(),
        machine.threat_range(&world).len()
    )
    .context("failed to write ranges")?;

    let fleet = query::fleet_view(&world);
    for candidate in machine.valid_targets(&world) {
        let label = warpflow_system_damage::preview(
            machine.rules(),
            &fleet,
            request.ship,
            candidate.ship,
            mode,
        )
        .map_or_else(
            || "no attributes".to_owned(),
            |hit| damage_label(&hit, mode, ship.special.kind),
        );
        writeln!(
            out,
            "target {} at {}: {label}{}",
            candidate.ship,
            candidate.position,
            if candidate.disabled { " [disabled]" } else { "" }
        )
        .context("failed to write target")?;
    }
    for candidate in machine.assist_targets(&world) {
        writeln!(out, "assist {} at {}", candidate.ship, candidate.position)
            .context("failed to write assist candidate")?;
    }

    AsciiBackend::new(out).present(&build_scene(&world, &machine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpflow_core::Command;
    use warpflow_system_scenario::tutorial::{self, EMP_VESSEL, ENEMY_FIGHTER, SCOUT};
    use warpflow_world as world;

    fn request(snapshot: GameSnapshot, ship: ShipId) -> PreviewRequest {
        PreviewRequest {
            snapshot,
            ship,
            acting: Side::Creator,
            special: false,
            stage: None,
            target: None,
            repair_disabled: false,
        }
    }

    fn render(request: &PreviewRequest) -> Result<String> {
        let mut output = Vec::new();
        run(&mut output, request)?;
        Ok(String::from_utf8(output).expect("utf-8 output"))
    }

    #[test]
    fn staged_scout_lists_its_targets_with_damage() {
        let mut preview = request(query::snapshot(&tutorial::initial_world()), SCOUT);
        preview.stage = Some(Position::new(5, 8));
        preview.target = Some(ENEMY_FIGHTER);

        let text = render(&preview).expect("preview succeeds");
        assert!(text.starts_with("ship #1001 (creator) at (5, 5) special None\n"));
        assert!(text.contains("target #2001 at (5, 11): 24 DMG\n"));
        assert!(text.contains("target #2002 at (4, 10): Reactor Critical +1 [disabled]\n"));
        assert!(text.contains("target at (5, 11): 24 DMG"), "label under the grid");
    }

    #[test]
    fn special_mode_uses_the_ability_label() {
        let mut state = tutorial::initial_world();
        let mut events = Vec::new();
        world::apply(
            &mut state,
            Command::MoveShip {
                ship: EMP_VESSEL,
                to: Position::new(5, 8),
            },
            &mut events,
        );
        let mut preview = request(query::snapshot(&state), EMP_VESSEL);
        preview.special = true;

        let text = render(&preview).expect("preview succeeds");
        assert!(text.contains("special EMP"));
        assert!(text.contains("target #2001 at (5, 11): EMP Disrupt\n"));
    }

    #[test]
    fn unknown_ship_is_reported() {
        let preview = request(
            query::snapshot(&tutorial::initial_world()),
            ShipId::new(77),
        );
        let error = render(&preview).expect_err("ship missing");
        assert_eq!(error.to_string(), "ship #77 is not in the snapshot");
    }
}
