#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Damage resolution with armor and shield mitigation.
//!
//! All arithmetic is integer. Mitigation floors the absorbed share, so a hit
//! of 25 against 5% reduction deals 24 rather than 23.75.

use log::debug;
use warpflow_core::{
    FleetView, ShipAttributes, ShipId, SpecialAbility, SpecialEffect, WeaponMode,
    REACTOR_CRITICAL_LIMIT, STATUS_EMP_DISRUPTED,
};

/// Numbers shown to the player before committing an attack or ability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DamagePreview {
    /// Gun damage or ability strength before mitigation.
    pub raw: u32,
    /// Value after the target's damage reduction.
    pub mitigated: u32,
    /// Whether the hit brings the target to zero hull.
    pub lethal: bool,
    /// Whether the hit escalates a disabled target's reactor instead of dealing damage.
    pub reactor_critical: bool,
}

impl DamagePreview {
    /// Value a presentation layer should print for this preview.
    ///
    /// Primary weapons always show the mitigated value. Special abilities show
    /// their raw strength unless `show_reduced` asks for the mitigated value.
    #[must_use]
    pub const fn display_amount(&self, mode: WeaponMode, show_reduced: bool) -> u32 {
        match mode {
            WeaponMode::Primary => self.mitigated,
            WeaponMode::Special if show_reduced => self.mitigated,
            WeaponMode::Special => self.raw,
        }
    }
}

/// How hits on disabled (zero hull) ships are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisabledTargetPolicy {
    /// Every hit on a disabled ship escalates its reactor, including repairs.
    #[default]
    EscalateAlways,
    /// Only hostile effects escalate. Repairs restore hull as usual.
    EscalateHostileOnly,
}

/// Tunable combat rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DamageRules {
    /// Treatment of hits on disabled ships.
    pub disabled_target_policy: DisabledTargetPolicy,
}

impl DamageRules {
    /// Resolves a single hit of `attacker` on `target` with the active weapon mode.
    #[must_use]
    pub fn resolve(
        &self,
        attacker: &ShipAttributes,
        special: SpecialAbility,
        target: &ShipAttributes,
        mode: WeaponMode,
    ) -> DamagePreview {
        let effect = hit_effect(special, mode);
        if target.is_disabled() && effect.map_or(true, |effect| self.escalates(effect)) {
            return DamagePreview {
                raw: 0,
                mitigated: 0,
                lethal: false,
                reactor_critical: true,
            };
        }
        let Some(effect) = effect else {
            return DamagePreview::default();
        };

        let raw = match mode {
            WeaponMode::Primary => attacker.gun_damage,
            WeaponMode::Special => special.strength,
        };
        let mitigated = mitigate(raw, target.damage_reduction);
        DamagePreview {
            raw,
            mitigated,
            lethal: effect == SpecialEffect::Damage && mitigated >= target.hull_points,
            reactor_critical: false,
        }
    }

    fn escalates(&self, effect: SpecialEffect) -> bool {
        match self.disabled_target_policy {
            DisabledTargetPolicy::EscalateAlways => true,
            DisabledTargetPolicy::EscalateHostileOnly => effect != SpecialEffect::Restore,
        }
    }
}

/// Resolves a hit under the default rules.
#[must_use]
pub fn resolve(
    attacker: &ShipAttributes,
    special: SpecialAbility,
    target: &ShipAttributes,
    mode: WeaponMode,
) -> DamagePreview {
    DamageRules::default().resolve(attacker, special, target, mode)
}

/// Applies a percentage reduction, flooring the absorbed share and saturating at zero.
#[must_use]
pub fn mitigate(base: u32, reduction_percent: u32) -> u32 {
    let absorbed = u64::from(base) * u64::from(reduction_percent.min(100)) / 100;
    base.saturating_sub(u32::try_from(absorbed).unwrap_or(u32::MAX))
}

/// Effect a hit has on its target, or `None` for special mode without an ability.
#[must_use]
pub const fn hit_effect(special: SpecialAbility, mode: WeaponMode) -> Option<SpecialEffect> {
    match mode {
        WeaponMode::Primary => Some(SpecialEffect::Damage),
        WeaponMode::Special => special.kind.effect(),
    }
}

/// Previews a hit between two ships of the fleet.
///
/// Returns `None` when either ship is unknown or lacks an attribute record.
#[must_use]
pub fn preview(
    rules: &DamageRules,
    fleet: &FleetView,
    attacker: ShipId,
    target: ShipId,
    mode: WeaponMode,
) -> Option<DamagePreview> {
    let shooter = fleet.get(attacker)?;
    let victim = fleet.get(target)?;
    match (&shooter.attributes, &victim.attributes) {
        (Some(shooter_attributes), Some(victim_attributes)) => Some(rules.resolve(
            shooter_attributes,
            shooter.special,
            victim_attributes,
            mode,
        )),
        _ => {
            debug!("damage preview {attacker} -> {target} skipped: attributes not loaded");
            None
        }
    }
}

/// Previews an area-effect ability against every listed ship.
///
/// The output buffer is cleared first. Ships without a preview are skipped.
pub fn area_preview(
    rules: &DamageRules,
    fleet: &FleetView,
    attacker: ShipId,
    targets: &[ShipId],
    out: &mut Vec<(ShipId, DamagePreview)>,
) {
    out.clear();
    for target in targets {
        if let Some(hit) = preview(rules, fleet, attacker, *target, WeaponMode::Special) {
            out.push((*target, hit));
        }
    }
}

/// Target state after a resolved hit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HitOutcome {
    /// Updated attribute record of the target.
    pub attributes: ShipAttributes,
    /// Whether the reactor limit was reached and the ship is lost.
    pub destroyed: bool,
}

/// Applies a resolved hit to the target's attributes.
#[must_use]
pub fn settle(
    target: &ShipAttributes,
    hit: &DamagePreview,
    effect: SpecialEffect,
) -> HitOutcome {
    let mut attributes = target.clone();
    if hit.reactor_critical {
        attributes.reactor_critical_timer = attributes.reactor_critical_timer.saturating_add(1);
    } else {
        match effect {
            SpecialEffect::Damage => {
                attributes.hull_points = attributes.hull_points.saturating_sub(hit.mitigated);
            }
            SpecialEffect::Restore => {
                attributes.hull_points = attributes
                    .hull_points
                    .saturating_add(hit.raw)
                    .min(attributes.max_hull_points);
            }
            SpecialEffect::Disrupt => {
                if !attributes.status_effects.contains(&STATUS_EMP_DISRUPTED) {
                    attributes.status_effects.push(STATUS_EMP_DISRUPTED);
                }
            }
        }
    }

    let destroyed = attributes.reactor_critical_timer >= REACTOR_CRITICAL_LIMIT;
    HitOutcome {
        attributes,
        destroyed,
    }
}
