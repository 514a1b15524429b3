//! Local stand-in for the contract that settles committed actions.

use log::debug;
use warpflow_core::{
    ActionIntent, ActionKind, Command, ShipId, ShipSnapshot, TargetChoice, WeaponMode,
    ASSIST_HULL_RESTORE,
};
use warpflow_system_damage::{hit_effect, settle, DamageRules};
use warpflow_system_targeting::valid_targets;
use warpflow_world::{query, World};

/// Resolves approved intents into world commands the way the contract would.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SimulatedAuthority {
    rules: DamageRules,
}

impl SimulatedAuthority {
    /// Creates an authority resolving hits with the provided rules.
    #[must_use]
    pub const fn new(rules: DamageRules) -> Self {
        Self { rules }
    }

    /// Emits the commands that settle `intent` against the current world.
    ///
    /// The output buffer is cleared first. The ship moves (if needed), is
    /// marked as moved, then its action takes effect. Ending the turn on a
    /// scoring cell claims it unless the ship retreated.
    pub fn resolve(&self, world: &World, intent: &ActionIntent, out: &mut Vec<Command>) {
        out.clear();
        let Some(actor) = query::ship(world, intent.ship) else {
            debug!("authority ignored intent of unknown ship {}", intent.ship);
            return;
        };

        if actor.position != intent.destination {
            out.push(Command::MoveShip {
                ship: actor.id,
                to: intent.destination,
            });
        }
        out.push(Command::MarkMoved { ship: actor.id });

        match intent.action {
            ActionKind::Pass | ActionKind::ClaimPoints => {}
            ActionKind::Shoot { target } => {
                self.strike(world, &actor, target, WeaponMode::Primary, out);
            }
            ActionKind::Special {
                target: TargetChoice::Ship(target),
            } => self.strike(world, &actor, target, WeaponMode::Special, out),
            ActionKind::Special {
                target: TargetChoice::AreaEffect,
            } => {
                let mut candidates = Vec::new();
                let fleet = query::fleet_view(world);
                if let Err(error) = valid_targets(
                    query::grid(world),
                    &fleet,
                    &actor,
                    intent.destination,
                    WeaponMode::Special,
                    &mut candidates,
                ) {
                    debug!("area effect of ship {} skipped: {error}", actor.id);
                }
                for candidate in candidates {
                    self.strike(world, &actor, candidate.ship, WeaponMode::Special, out);
                }
            }
            ActionKind::Assist { target } => match query::attributes(world, target) {
                Some(attributes) => {
                    let mut restored = attributes.clone();
                    restored.hull_points = restored
                        .hull_points
                        .saturating_add(ASSIST_HULL_RESTORE)
                        .min(restored.max_hull_points);
                    restored.reactor_critical_timer = 0;
                    out.push(Command::SetAttributes {
                        ship: target,
                        attributes: restored,
                    });
                }
                None => debug!("assist on ship {target} skipped: attributes not loaded"),
            },
            ActionKind::Retreat => {
                out.push(Command::RemoveShip { ship: actor.id });
                return;
            }
        }

        let scores = query::grid(world)
            .scoring_at(intent.destination)
            .is_ok_and(|cell| cell.yields_points());
        if scores {
            out.push(Command::ClaimScore { ship: actor.id });
        }
    }

    fn strike(
        &self,
        world: &World,
        actor: &ShipSnapshot,
        target: ShipId,
        mode: WeaponMode,
        out: &mut Vec<Command>,
    ) {
        let (Some(attacker), Some(victim)) =
            (actor.attributes.as_ref(), query::attributes(world, target))
        else {
            debug!("hit {} -> {target} skipped: attributes not loaded", actor.id);
            return;
        };
        let Some(effect) = hit_effect(actor.special, mode) else {
            return;
        };

        let hit = self.rules.resolve(attacker, actor.special, victim, mode);
        let outcome = settle(victim, &hit, effect);
        if outcome.destroyed {
            out.push(Command::RemoveShip { ship: target });
        } else {
            out.push(Command::SetAttributes {
                ship: target,
                attributes: outcome.attributes,
            });
        }
    }
}
