//! Read-only player progression snapshot handed to the simulators.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{SectorId, WeaponId, WeaponKind};

/// Hardware components the player upgrades between runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Raises power capacity.
    Psu,
    /// Extends overclock duration.
    Ram,
    /// Raises tower damage.
    Gpu,
    /// Shortens the leak decay interval.
    Cache,
    /// Raises the hash storage ceiling.
    Storage,
    /// Adds placement slots.
    Expansion,
    /// Extends tower range.
    Network,
    /// Speeds up projectiles.
    Io,
    /// Raises hash income.
    Cpu,
}

impl ComponentKind {
    /// Every component kind in declaration order.
    pub const ALL: [ComponentKind; 9] = [
        Self::Psu,
        Self::Ram,
        Self::Gpu,
        Self::Cache,
        Self::Storage,
        Self::Expansion,
        Self::Network,
        Self::Io,
        Self::Cpu,
    ];
}

/// Snapshot of the player's long-term state at the start of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progression {
    /// Weapons the player has compiled and may place.
    pub compiled: BTreeSet<WeaponId>,
    /// Protocol level per weapon; absent entries are level 1.
    pub weapon_levels: BTreeMap<WeaponId, u32>,
    /// Component levels; absent entries are level 0.
    pub components: BTreeMap<ComponentKind, u32>,
    /// Sectors whose hostiles the spawn policy may emit.
    pub unlocked_sectors: BTreeSet<SectorId>,
    /// Hash balance at the start of the run.
    pub starting_hash: f64,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            compiled: BTreeSet::new(),
            weapon_levels: BTreeMap::new(),
            components: BTreeMap::new(),
            unlocked_sectors: [SectorId::new(0)].into_iter().collect(),
            starting_hash: 150.0,
        }
    }
}

impl Progression {
    /// Fresh profile with nothing compiled.
    #[must_use]
    pub fn fresh() -> Self {
        Self::default()
    }

    /// Profile with the provided weapon kinds compiled at level 1.
    #[must_use]
    pub fn with_compiled(kinds: &[WeaponKind]) -> Self {
        let mut progression = Self::default();
        for kind in kinds {
            let _ = progression.compiled.insert(kind.id());
        }
        progression
    }

    /// Whether `weapon` has been compiled.
    #[must_use]
    pub fn is_compiled(&self, weapon: &WeaponId) -> bool {
        self.compiled.contains(weapon)
    }

    /// Protocol level of `weapon`, never below 1.
    #[must_use]
    pub fn weapon_level(&self, weapon: &WeaponId) -> u32 {
        self.weapon_levels.get(weapon).copied().unwrap_or(1).max(1)
    }

    /// Level of `component`.
    #[must_use]
    pub fn component_level(&self, component: ComponentKind) -> u32 {
        self.components.get(&component).copied().unwrap_or(0)
    }

    /// Whether `sector` is unlocked.
    #[must_use]
    pub fn is_unlocked(&self, sector: SectorId) -> bool {
        self.unlocked_sectors.contains(&sector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_profile_unlocks_only_first_sector() {
        let progression = Progression::fresh();
        assert!(progression.compiled.is_empty());
        assert!(progression.is_unlocked(SectorId::new(0)));
        assert!(!progression.is_unlocked(SectorId::new(1)));
    }

    #[test]
    fn missing_levels_fall_back_to_defaults() {
        let mut progression = Progression::with_compiled(&[WeaponKind::IceShard]);
        assert!(progression.is_compiled(&WeaponKind::IceShard.id()));
        assert_eq!(progression.weapon_level(&WeaponKind::IceShard.id()), 1);
        assert_eq!(progression.component_level(ComponentKind::Cpu), 0);

        let _ = progression
            .weapon_levels
            .insert(WeaponKind::IceShard.id(), 0);
        assert_eq!(progression.weapon_level(&WeaponKind::IceShard.id()), 1);
    }

    #[test]
    fn progression_round_trips_through_bincode() {
        let mut progression = Progression::with_compiled(&[WeaponKind::Overflow]);
        let _ = progression.components.insert(ComponentKind::Psu, 3);
        let bytes = bincode::serialize(&progression).expect("serialize");
        let restored: Progression = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, progression);
    }
}
