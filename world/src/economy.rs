//! Hash balance, leak counter and the capacity limits fixed at run start.

use kernel_defence_core::{
    balance::{Efficiency, RarityTable},
    BalanceConfig, ComponentKind, Progression, Scenario,
};
use serde::{Deserialize, Serialize};

/// Shortest leak decay interval any CACHE level can reach.
const MIN_DECAY_INTERVAL: f32 = 0.5;

/// Capacity limits and multipliers derived from the progression snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Limits {
    pub(crate) power_capacity: f32,
    pub(crate) tower_power: RarityTable,
    pub(crate) storage: f64,
    pub(crate) income_per_second: f64,
    pub(crate) damage_multiplier: f32,
    pub(crate) range_multiplier: f32,
    pub(crate) projectile_speed_multiplier: f32,
    pub(crate) leak_decay_interval: f32,
    pub(crate) overclock_duration: f32,
    pub(crate) slot_count: u32,
}

impl Limits {
    pub(crate) fn derive(
        balance: &BalanceConfig,
        progression: &Progression,
        scenario: Scenario,
    ) -> Self {
        let level = |component| progression.component_level(component);
        let components = &balance.components;
        let grid = &balance.power_grid;
        let economy = &balance.hash_economy;

        let mut income = economy.base_hash_per_second;
        for _ in 0..level(ComponentKind::Cpu) {
            income *= economy.cpu_level_scaling;
        }

        let cache_reduction = components.cache_decay_bonus * level(ComponentKind::Cache) as f32;
        let decay_interval = (balance.efficiency.leak_decay_interval * (1.0 - cache_reduction))
            .max(MIN_DECAY_INTERVAL);

        Self {
            power_capacity: grid.base_power_budget
                + grid.power_per_psu_level * level(ComponentKind::Psu) as f32,
            tower_power: grid.tower_power,
            storage: economy.base_storage
                + economy.storage_per_level * f64::from(level(ComponentKind::Storage)),
            income_per_second: income * scenario.income_multiplier(),
            damage_multiplier: 1.0 + components.gpu_damage_bonus * level(ComponentKind::Gpu) as f32,
            range_multiplier: 1.0
                + components.network_range_bonus * level(ComponentKind::Network) as f32,
            projectile_speed_multiplier: 1.0
                + components.io_speed_bonus * level(ComponentKind::Io) as f32,
            leak_decay_interval: decay_interval,
            overclock_duration: balance.overclock.duration
                * (1.0 + components.ram_overclock_bonus * level(ComponentKind::Ram) as f32),
            slot_count: balance.towers.base_slots.saturating_add(
                components
                    .expansion_slots
                    .saturating_mul(level(ComponentKind::Expansion)),
            ),
        }
    }
}

/// Mutable resource counters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Economy {
    hash: f64,
    leak: f32,
    decay_accumulator: f32,
    warning_active: bool,
}

impl Economy {
    pub(crate) fn new(starting_hash: f64, storage: f64) -> Self {
        Self {
            hash: starting_hash.clamp(0.0, storage),
            leak: 0.0,
            decay_accumulator: 0.0,
            warning_active: false,
        }
    }

    pub(crate) fn hash(&self) -> f64 {
        self.hash
    }

    pub(crate) fn leak(&self) -> f32 {
        self.leak
    }

    /// Efficiency percentage in `[0, 100]`.
    pub(crate) fn efficiency(&self, tuning: &Efficiency) -> f32 {
        if tuning.max_leak <= 0.0 {
            return 100.0;
        }
        (100.0 * (1.0 - self.leak / tuning.max_leak)).clamp(0.0, 100.0)
    }

    /// Adds hash up to the storage ceiling, returning the amount credited.
    pub(crate) fn credit(&mut self, amount: f64, storage: f64) -> f64 {
        let before = self.hash;
        self.hash = (self.hash + amount.max(0.0)).min(storage);
        (self.hash - before).max(0.0)
    }

    /// Deducts `cost` when affordable.
    pub(crate) fn try_spend(&mut self, cost: f64) -> bool {
        if cost > self.hash {
            return false;
        }
        self.hash -= cost;
        true
    }

    /// Raises the leak counter, clamped to the value that zeroes efficiency.
    pub(crate) fn add_leak(&mut self, amount: f32, tuning: &Efficiency) {
        self.leak = (self.leak + amount.max(0.0)).min(tuning.max_leak.max(0.0));
    }

    pub(crate) fn reduce_leak(&mut self, amount: f32) {
        self.leak = (self.leak - amount.max(0.0)).max(0.0);
    }

    /// Resets the leak counter to the freeze recovery value.
    pub(crate) fn recover_from_freeze(&mut self, tuning: &Efficiency) {
        self.leak = tuning.freeze_recovery_leak.clamp(0.0, tuning.max_leak.max(0.0));
    }

    /// Removes one leak point per elapsed decay interval.
    pub(crate) fn decay_leak(&mut self, dt: f32, interval: f32) {
        self.decay_accumulator += dt;
        while self.decay_accumulator >= interval {
            self.decay_accumulator -= interval;
            self.reduce_leak(1.0);
        }
    }

    /// Reports a downward crossing of the warning threshold.
    ///
    /// Returns the efficiency when a new warning should fire; the warning
    /// re-arms once efficiency climbs back to the threshold.
    pub(crate) fn check_warning(&mut self, tuning: &Efficiency) -> Option<f32> {
        let efficiency = self.efficiency(tuning);
        if efficiency < tuning.warning_threshold {
            if !self.warning_active {
                self.warning_active = true;
                return Some(efficiency);
            }
        } else {
            self.warning_active = false;
        }
        None
    }
}
