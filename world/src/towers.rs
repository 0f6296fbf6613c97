//! Authoritative tower and slot bookkeeping.

use std::collections::BTreeMap;

use kernel_defence_core::{geometry::Vec2, SlotId, TowerId, WeaponDefinition};
use serde::{Deserialize, Serialize};

/// Tower stored inside the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Slot the tower is bound to.
    pub(crate) slot: SlotId,
    /// Definition cached at placement time.
    pub(crate) definition: WeaponDefinition,
    /// Current level.
    pub(crate) level: u32,
    /// Seconds until the tower may fire again.
    pub(crate) cooldown: f32,
    /// Hash spent on purchase and upgrades.
    pub(crate) invested: f64,
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Allocates an identifier and stores a fresh tower.
    pub(crate) fn insert(
        &mut self,
        slot: SlotId,
        definition: WeaponDefinition,
        level: u32,
        invested: f64,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                slot,
                definition,
                level,
                cooldown: 0.0,
                invested,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    /// Towers in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Placement sites along the lane, each bound to at most one tower.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SlotTable {
    positions: Vec<Vec2>,
    occupants: Vec<Option<TowerId>>,
}

impl SlotTable {
    pub(crate) fn new(positions: Vec<Vec2>) -> Self {
        let occupants = vec![None; positions.len()];
        Self {
            positions,
            occupants,
        }
    }

    pub(crate) fn position(&self, slot: SlotId) -> Option<Vec2> {
        self.positions.get(slot.get() as usize).copied()
    }

    /// Occupant of `slot`; `None` when the slot does not exist.
    pub(crate) fn occupant(&self, slot: SlotId) -> Option<Option<TowerId>> {
        self.occupants.get(slot.get() as usize).copied()
    }

    /// Binds `tower` to an empty slot. Returns `false` when the slot is unknown or taken.
    pub(crate) fn bind(&mut self, slot: SlotId, tower: TowerId) -> bool {
        match self.occupants.get_mut(slot.get() as usize) {
            Some(entry @ None) => {
                *entry = Some(tower);
                true
            }
            _ => false,
        }
    }

    /// Frees `slot` if it holds `tower`.
    pub(crate) fn release(&mut self, slot: SlotId, tower: TowerId) {
        if let Some(entry) = self.occupants.get_mut(slot.get() as usize) {
            if *entry == Some(tower) {
                *entry = None;
            }
        }
    }

    /// Slots with their position and occupant, in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (SlotId, Vec2, Option<TowerId>)> + '_ {
        self.positions
            .iter()
            .zip(self.occupants.iter())
            .enumerate()
            .map(|(index, (position, occupant))| (SlotId::new(index as u32), *position, *occupant))
    }

    pub(crate) fn len(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_defence_core::{BuiltinContent, ContentLibrary, WeaponKind};

    fn definition() -> WeaponDefinition {
        BuiltinContent::new()
            .weapon(&WeaponKind::KernelPulse.id())
            .cloned()
            .expect("builtin weapon")
    }

    #[test]
    fn registry_allocates_increasing_identifiers() {
        let mut registry = TowerRegistry::new();
        let first = registry.insert(SlotId::new(0), definition(), 1, 50.0);
        let second = registry.insert(SlotId::new(1), definition(), 1, 50.0);
        assert_eq!(first, TowerId::new(0));
        assert_eq!(second, TowerId::new(1));

        let _ = registry.remove(first);
        let third = registry.insert(SlotId::new(0), definition(), 1, 50.0);
        assert_eq!(third, TowerId::new(2));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn slot_binds_exactly_once() {
        let mut slots = SlotTable::new(vec![Vec2::ZERO, Vec2::ONE]);
        assert!(slots.bind(SlotId::new(0), TowerId::new(4)));
        assert!(!slots.bind(SlotId::new(0), TowerId::new(5)));
        assert!(!slots.bind(SlotId::new(7), TowerId::new(5)));
        assert_eq!(slots.occupant(SlotId::new(0)), Some(Some(TowerId::new(4))));
        assert_eq!(slots.occupant(SlotId::new(7)), None);
    }

    #[test]
    fn release_ignores_foreign_towers() {
        let mut slots = SlotTable::new(vec![Vec2::ZERO]);
        assert!(slots.bind(SlotId::new(0), TowerId::new(1)));
        slots.release(SlotId::new(0), TowerId::new(2));
        assert_eq!(slots.occupant(SlotId::new(0)), Some(Some(TowerId::new(1))));
        slots.release(SlotId::new(0), TowerId::new(1));
        assert_eq!(slots.occupant(SlotId::new(0)), Some(None));
    }
}
