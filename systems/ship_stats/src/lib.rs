#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Derives combat attributes from a ship's equipment, traits and record.
//!
//! The tables follow the contract's attribute calculation. Every bonus is a
//! floored percentage applied in contract order, so the numbers shown here
//! match what the chain reports once the ship is loaded.

use serde::{Deserialize, Serialize};
use warpflow_core::{ShipAttributes, SpecialAbility, SpecialKind};

const BASE_HULL: u32 = 100;
const BASE_SPEED: i32 = 3;
const FORE_ACCURACY_PERCENT: [u32; 3] = [0, 25, 50];
const HULL_BONUS: [u32; 3] = [0, 10, 20];
const ENGINE_SPEED: [i32; 3] = [0, 1, 2];

/// Main weapon fitted to a ship.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GunKind {
    /// Short range, steady damage.
    #[default]
    Laser,
    /// Long range.
    Railgun,
    /// Heavy warhead that slows the ship.
    MissileLauncher,
    /// Very short range, highest damage.
    PlasmaCannon,
}

impl GunKind {
    /// Decodes the contract's enum index. Unknown indices fall back to a laser.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index {
            1 => Self::Railgun,
            2 => Self::MissileLauncher,
            3 => Self::PlasmaCannon,
            _ => Self::Laser,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Laser => "Laser",
            Self::Railgun => "Railgun",
            Self::MissileLauncher => "Missile",
            Self::PlasmaCannon => "Plasma",
        }
    }

    const fn profile(self) -> (u32, u32, i32) {
        match self {
            Self::Laser => (3, 50, 0),
            Self::Railgun => (6, 40, 0),
            Self::MissileLauncher => (4, 60, -1),
            Self::PlasmaCannon => (2, 80, 0),
        }
    }
}

/// Hull plating fitted to a ship.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorKind {
    /// No plating. The ship moves faster.
    #[default]
    None,
    /// Light plating.
    Light,
    /// Medium plating.
    Medium,
    /// Heavy plating.
    Heavy,
}

impl ArmorKind {
    /// Decodes the contract's enum index. Unknown indices mean no armor.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index {
            1 => Self::Light,
            2 => Self::Medium,
            3 => Self::Heavy,
            _ => Self::None,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Light => "Light",
            Self::Medium => "Medium",
            Self::Heavy => "Heavy",
        }
    }

    const fn profile(self) -> (u32, i32) {
        match self {
            Self::None => (0, 1),
            Self::Light => (15, 0),
            Self::Medium => (30, -1),
            Self::Heavy => (45, -2),
        }
    }
}

/// Shield generator fitted to a ship.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldKind {
    /// No shields.
    #[default]
    None,
    /// Basic shields.
    Light,
    /// Enhanced shields.
    Medium,
    /// Advanced shields.
    Heavy,
}

impl ShieldKind {
    /// Decodes the contract's enum index. Unknown indices mean no shields.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index {
            1 => Self::Light,
            2 => Self::Medium,
            3 => Self::Heavy,
            _ => Self::None,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Light => "Basic",
            Self::Medium => "Enhanced",
            Self::Heavy => "Advanced",
        }
    }

    const fn profile(self) -> (u32, i32) {
        match self {
            Self::None => (0, 1),
            Self::Light => (15, 1),
            Self::Medium => (30, 0),
            Self::Heavy => (45, -1),
        }
    }
}

/// Display name of a special ability.
#[must_use]
pub const fn special_name(kind: SpecialKind) -> &'static str {
    match kind {
        SpecialKind::None => "None",
        SpecialKind::Emp => "EMP",
        SpecialKind::Repair => "Repair",
        SpecialKind::Flak => "Flak",
    }
}

/// Equipment loadout of a ship.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Equipment {
    /// Main weapon.
    pub main_weapon: GunKind,
    /// Armor plating.
    pub armor: ArmorKind,
    /// Shield generator.
    pub shields: ShieldKind,
    /// Special ability.
    pub special: SpecialKind,
}

/// Trait levels rolled at construction. Each level is clamped to `0..=2`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Traits {
    /// Fore accuracy level, extends weapon range.
    pub accuracy: u8,
    /// Hull level, adds flat hull points.
    pub hull: u8,
    /// Engine level, adds movement.
    pub speed: u8,
}

fn trait_level(level: u8) -> usize {
    usize::from(level.min(2))
}

/// Rank earned from the number of ships destroyed.
#[must_use]
pub const fn rank_from_kills(ships_destroyed: u64) -> u8 {
    match ships_destroyed {
        1000.. => 6,
        300.. => 5,
        100.. => 4,
        30.. => 3,
        10.. => 2,
        _ => 1,
    }
}

/// Percentage bonus granted by a rank.
#[must_use]
pub const fn rank_multiplier(rank: u8) -> u32 {
    match rank {
        0 | 1 => 0,
        2 => 10,
        3 => 20,
        4 => 30,
        5 => 40,
        _ => 50,
    }
}

fn with_bonus(value: u32, percent: u32) -> u32 {
    value.saturating_add(value.saturating_mul(percent) / 100)
}

/// Computes the fresh attribute record of a ship.
///
/// Range takes the rank bonus first and the fore accuracy bonus second, each
/// floored on the intermediate value. Hull starts at full strength.
#[must_use]
pub fn derive_attributes(
    equipment: &Equipment,
    traits: &Traits,
    ships_destroyed: u64,
) -> ShipAttributes {
    let rank_bonus = rank_multiplier(rank_from_kills(ships_destroyed));
    let (gun_range, gun_damage, gun_movement) = equipment.main_weapon.profile();
    let (armor_reduction, armor_movement) = equipment.armor.profile();
    let (shield_reduction, shield_movement) = equipment.shields.profile();

    let range = with_bonus(
        with_bonus(gun_range, rank_bonus),
        FORE_ACCURACY_PERCENT[trait_level(traits.accuracy)],
    );
    let hull = with_bonus(BASE_HULL + HULL_BONUS[trait_level(traits.hull)], rank_bonus);

    let base_movement = BASE_SPEED
        + ENGINE_SPEED[trait_level(traits.speed)]
        + gun_movement
        + armor_movement
        + shield_movement;
    let movement = with_bonus(u32::try_from(base_movement.max(0)).unwrap_or(0), rank_bonus);

    ShipAttributes {
        range,
        gun_damage: with_bonus(gun_damage, rank_bonus),
        hull_points: hull,
        max_hull_points: hull,
        movement,
        damage_reduction: with_bonus(armor_reduction + shield_reduction, rank_bonus),
        reactor_critical_timer: 0,
        status_effects: Vec::new(),
    }
}

/// Range and strength of a special ability as fitted by the shipyard.
#[must_use]
pub const fn default_special(kind: SpecialKind) -> SpecialAbility {
    match kind {
        SpecialKind::None => SpecialAbility::NONE,
        SpecialKind::Emp => SpecialAbility::new(SpecialKind::Emp, 5, 0),
        SpecialKind::Repair => SpecialAbility::new(SpecialKind::Repair, 3, 30),
        SpecialKind::Flak => SpecialAbility::new(SpecialKind::Flak, 2, 15),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_thresholds() {
        assert_eq!(rank_from_kills(0), 1);
        assert_eq!(rank_from_kills(9), 1);
        assert_eq!(rank_from_kills(10), 2);
        assert_eq!(rank_from_kills(299), 4);
        assert_eq!(rank_from_kills(300), 5);
        assert_eq!(rank_from_kills(5_000), 6);
        assert_eq!(rank_multiplier(rank_from_kills(30)), 20);
    }

    #[test]
    fn unknown_indices_fall_back_to_the_first_entry() {
        assert_eq!(GunKind::from_index(9), GunKind::Laser);
        assert_eq!(ArmorKind::from_index(4), ArmorKind::None);
        assert_eq!(ShieldKind::from_index(200), ShieldKind::None);
        assert_eq!(ShieldKind::from_index(3).name(), "Advanced");
    }

    #[test]
    fn trait_levels_above_two_are_clamped() {
        let equipment = Equipment::default();
        let maxed = Traits {
            accuracy: 2,
            hull: 2,
            speed: 2,
        };
        let overflow = Traits {
            accuracy: 7,
            hull: 9,
            speed: 255,
        };
        assert_eq!(
            derive_attributes(&equipment, &maxed, 0),
            derive_attributes(&equipment, &overflow, 0)
        );
    }
}
