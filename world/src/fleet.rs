//! Authoritative ship state management utilities.

use std::collections::{BTreeMap, BTreeSet};

use warpflow_core::{Position, ShipAttributes, ShipId, ShipSnapshot, Side, SpecialAbility};

/// Snapshot of a ship stored inside the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ShipState {
    /// Identifier assigned by the contract.
    pub(crate) id: ShipId,
    /// Side that owns the ship.
    pub(crate) owner: Side,
    /// Cell currently occupied by the ship.
    pub(crate) position: Position,
    /// Special ability carried by the ship.
    pub(crate) special: SpecialAbility,
    /// Attribute record mirrored from the authority.
    pub(crate) attributes: Option<ShipAttributes>,
}

impl ShipState {
    pub(crate) fn snapshot(&self) -> ShipSnapshot {
        ShipSnapshot {
            id: self.id,
            owner: self.owner,
            position: self.position,
            special: self.special,
            attributes: self.attributes.clone(),
        }
    }
}

/// Registry of ships keyed by identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Fleet {
    entries: BTreeMap<ShipId, ShipState>,
}

impl Fleet {
    pub(crate) fn contains(&self, ship: ShipId) -> bool {
        self.entries.contains_key(&ship)
    }

    pub(crate) fn get(&self, ship: ShipId) -> Option<&ShipState> {
        self.entries.get(&ship)
    }

    pub(crate) fn get_mut(&mut self, ship: ShipId) -> Option<&mut ShipState> {
        self.entries.get_mut(&ship)
    }

    pub(crate) fn insert(&mut self, state: ShipState) {
        let _ = self.entries.insert(state.id, state);
    }

    pub(crate) fn remove(&mut self, ship: ShipId) -> Option<ShipState> {
        self.entries.remove(&ship)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &ShipState> {
        self.entries.values()
    }
}

/// Ships of each side that already acted during the current round.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct MovedShips {
    creator: BTreeSet<ShipId>,
    joiner: BTreeSet<ShipId>,
}

impl MovedShips {
    pub(crate) fn side(&self, side: Side) -> &BTreeSet<ShipId> {
        match side {
            Side::Creator => &self.creator,
            Side::Joiner => &self.joiner,
        }
    }

    /// Records the ship, returning whether it was newly recorded.
    pub(crate) fn mark(&mut self, side: Side, ship: ShipId) -> bool {
        match side {
            Side::Creator => self.creator.insert(ship),
            Side::Joiner => self.joiner.insert(ship),
        }
    }

    pub(crate) fn forget(&mut self, ship: ShipId) {
        let _ = self.creator.remove(&ship);
        let _ = self.joiner.remove(&ship);
    }

    pub(crate) fn contains(&self, ship: ShipId) -> bool {
        self.creator.contains(&ship) || self.joiner.contains(&ship)
    }

    pub(crate) fn clear(&mut self) {
        self.creator.clear();
        self.joiner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: u64, owner: Side) -> ShipState {
        ShipState {
            id: ShipId::new(id),
            owner,
            position: Position::new(0, 0),
            special: SpecialAbility::NONE,
            attributes: None,
        }
    }

    #[test]
    fn fleet_iterates_in_identifier_order() {
        let mut fleet = Fleet::default();
        fleet.insert(state(7, Side::Joiner));
        fleet.insert(state(2, Side::Creator));
        let ids: Vec<u64> = fleet.iter().map(|ship| ship.id.get()).collect();
        assert_eq!(ids, vec![2, 7]);
        assert!(fleet.remove(ShipId::new(2)).is_some());
        assert!(!fleet.contains(ShipId::new(2)));
    }

    #[test]
    fn moved_ships_are_tracked_per_side() {
        let mut moved = MovedShips::default();
        assert!(moved.mark(Side::Creator, ShipId::new(1)));
        assert!(!moved.mark(Side::Creator, ShipId::new(1)));
        assert!(moved.side(Side::Joiner).is_empty());
        assert!(moved.contains(ShipId::new(1)));
        moved.forget(ShipId::new(1));
        assert!(!moved.contains(ShipId::new(1)));
    }
}
