//! Tuning table for every balance constant the simulators read.
//!
//! Section and field names follow the balance export consumed by the web
//! simulator sync check, so a JSON export of [`BalanceConfig`] can be diffed
//! against the game's own table.

use serde::{Deserialize, Serialize};

use crate::{BossArchetype, ComponentKind, ConfigError, Rarity};

/// Complete balance table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalanceConfig {
    /// Power capacity and tower draw.
    pub power_grid: PowerGrid,
    /// Threat level progression and hostile scaling.
    pub threat_level: ThreatLevel,
    /// Hash income and storage.
    pub hash_economy: HashEconomy,
    /// Per-level protocol multipliers.
    pub protocol_scaling: ProtocolScaling,
    /// Component upgrade costs and effects.
    pub components: Components,
    /// Leak counter and efficiency thresholds.
    pub efficiency: Efficiency,
    /// Zero-Day elite tuning.
    pub zero_day: ZeroDay,
    /// Overclock boost tuning.
    pub overclock: Overclock,
    /// Tower purchase and upgrade pricing.
    pub towers: TowerPricing,
    /// Sector encounter offers in the defence loop.
    pub encounters: EncounterOffers,
    /// Boss encounter tuning.
    pub bosses: Bosses,
}

impl BalanceConfig {
    /// Rejects tables the simulators cannot run sensibly.
    ///
    /// Overrides are loaded field by field, so a table can be well-formed
    /// and still describe a run that freezes forever or a boss that skips
    /// phases.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.efficiency.validate()?;
        for archetype in BossArchetype::ALL {
            archetype.tuning(&self.bosses).validate(archetype)?;
        }
        Ok(())
    }
}

/// Power capacity and per-rarity tower draw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PowerGrid {
    /// Capacity before PSU upgrades.
    pub base_power_budget: f32,
    /// Capacity added per PSU level.
    pub power_per_psu_level: f32,
    /// Draw of a tower by rarity.
    pub tower_power: RarityTable,
}

impl Default for PowerGrid {
    fn default() -> Self {
        Self {
            base_power_budget: 100.0,
            power_per_psu_level: 20.0,
            tower_power: RarityTable {
                common: 10.0,
                rare: 20.0,
                epic: 35.0,
                legendary: 50.0,
            },
        }
    }
}

/// Value per rarity tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RarityTable {
    /// Common tier value.
    pub common: f32,
    /// Rare tier value.
    pub rare: f32,
    /// Epic tier value.
    pub epic: f32,
    /// Legendary tier value.
    pub legendary: f32,
}

impl RarityTable {
    /// Value for `rarity`.
    #[must_use]
    pub const fn get(&self, rarity: Rarity) -> f32 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
        }
    }
}

/// Threat level progression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThreatLevel {
    /// Seconds between threat level increments.
    pub wave_duration: f32,
    /// Health multiplier gained per threat level.
    pub health_scaling: f32,
    /// Speed multiplier gained per threat level.
    pub speed_scaling: f32,
    /// Leak damage multiplier gained per threat level.
    pub damage_scaling: f32,
    /// Spawn interval at threat zero.
    pub base_spawn_interval: f32,
    /// Spawn interval reduction per threat level.
    pub spawn_interval_step: f32,
    /// Lowest spawn interval reachable.
    pub min_spawn_interval: f32,
}

impl Default for ThreatLevel {
    fn default() -> Self {
        Self {
            wave_duration: 30.0,
            health_scaling: 0.15,
            speed_scaling: 0.02,
            damage_scaling: 0.1,
            base_spawn_interval: 2.0,
            spawn_interval_step: 0.1,
            min_spawn_interval: 0.6,
        }
    }
}

/// Hash income and storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HashEconomy {
    /// Income per second with no CPU upgrades at full efficiency.
    pub base_hash_per_second: f64,
    /// Compounding income factor per CPU level.
    pub cpu_level_scaling: f64,
    /// Storage ceiling before STORAGE upgrades.
    pub base_storage: f64,
    /// Storage added per STORAGE level.
    pub storage_per_level: f64,
}

impl Default for HashEconomy {
    fn default() -> Self {
        Self {
            base_hash_per_second: 2.0,
            cpu_level_scaling: 1.15,
            base_storage: 1_000.0,
            storage_per_level: 500.0,
        }
    }
}

/// Per-level protocol multipliers, all linear in `level - 1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProtocolScaling {
    /// Damage fraction gained per level.
    pub damage_per_level: f32,
    /// Range fraction gained per level.
    pub range_per_level: f32,
    /// Fire-rate fraction gained per level.
    pub fire_rate_per_level: f32,
    /// Highest tower level.
    pub max_level: u32,
}

impl Default for ProtocolScaling {
    fn default() -> Self {
        Self {
            damage_per_level: 0.25,
            range_per_level: 0.02,
            fire_rate_per_level: 0.03,
            max_level: 10,
        }
    }
}

impl ProtocolScaling {
    /// Damage multiplier at `level`.
    #[must_use]
    pub fn damage_multiplier(&self, level: u32) -> f32 {
        linear(self.damage_per_level, level)
    }

    /// Range multiplier at `level`.
    #[must_use]
    pub fn range_multiplier(&self, level: u32) -> f32 {
        linear(self.range_per_level, level)
    }

    /// Fire-rate multiplier at `level`.
    #[must_use]
    pub fn fire_rate_multiplier(&self, level: u32) -> f32 {
        linear(self.fire_rate_per_level, level)
    }
}

fn linear(per_level: f32, level: u32) -> f32 {
    1.0 + per_level * level.saturating_sub(1) as f32
}

/// Component upgrade costs and simulation effects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Components {
    /// Highest component level.
    pub max_level: u32,
    /// Level 1 upgrade cost per component.
    pub base_costs: ComponentCosts,
    /// Overclock duration fraction gained per RAM level.
    pub ram_overclock_bonus: f32,
    /// Damage fraction gained per GPU level.
    pub gpu_damage_bonus: f32,
    /// Leak decay interval reduction fraction per CACHE level.
    pub cache_decay_bonus: f32,
    /// Slots gained per EXPANSION level.
    pub expansion_slots: u32,
    /// Range fraction gained per NETWORK level.
    pub network_range_bonus: f32,
    /// Projectile speed fraction gained per IO level.
    pub io_speed_bonus: f32,
}

impl Default for Components {
    fn default() -> Self {
        Self {
            max_level: 25,
            base_costs: ComponentCosts::default(),
            ram_overclock_bonus: 0.1,
            gpu_damage_bonus: 0.05,
            cache_decay_bonus: 0.05,
            expansion_slots: 2,
            network_range_bonus: 0.03,
            io_speed_bonus: 0.05,
        }
    }
}

impl Components {
    /// Cost of raising `component` from `level` to `level + 1`.
    #[must_use]
    pub fn upgrade_cost(&self, component: ComponentKind, level: u32) -> f64 {
        self.base_costs.get(component) * f64::from(level.max(1))
    }
}

/// Level 1 upgrade cost per component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentCosts {
    /// Power supply.
    pub psu: f64,
    /// Memory.
    pub ram: f64,
    /// Graphics processor.
    pub gpu: f64,
    /// Cache.
    pub cache: f64,
    /// Storage.
    pub storage: f64,
    /// Expansion bays.
    pub expansion: f64,
    /// Network card.
    pub network: f64,
    /// IO controller.
    pub io: f64,
    /// Processor.
    pub cpu: f64,
}

impl Default for ComponentCosts {
    fn default() -> Self {
        Self {
            psu: 100.0,
            ram: 150.0,
            gpu: 250.0,
            cache: 120.0,
            storage: 80.0,
            expansion: 400.0,
            network: 180.0,
            io: 140.0,
            cpu: 200.0,
        }
    }
}

impl ComponentCosts {
    /// Base cost for `component`.
    #[must_use]
    pub const fn get(&self, component: ComponentKind) -> f64 {
        match component {
            ComponentKind::Psu => self.psu,
            ComponentKind::Ram => self.ram,
            ComponentKind::Gpu => self.gpu,
            ComponentKind::Cache => self.cache,
            ComponentKind::Storage => self.storage,
            ComponentKind::Expansion => self.expansion,
            ComponentKind::Network => self.network,
            ComponentKind::Io => self.io,
            ComponentKind::Cpu => self.cpu,
        }
    }
}

/// Leak counter and efficiency thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Efficiency {
    /// Leak counter value at which efficiency reaches zero.
    pub max_leak: f32,
    /// Seconds between single-point leak decays.
    pub leak_decay_interval: f32,
    /// Efficiency percentage below which a warning fires.
    pub warning_threshold: f32,
    /// Leak counter value restored after a freeze.
    pub freeze_recovery_leak: f32,
}

impl Default for Efficiency {
    fn default() -> Self {
        Self {
            max_leak: 20.0,
            leak_decay_interval: 5.0,
            warning_threshold: 25.0,
            freeze_recovery_leak: 10.0,
        }
    }
}

impl Efficiency {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_leak.is_finite() && self.max_leak > 0.0) {
            return Err(ConfigError::NonPositiveMaxLeak {
                max_leak: self.max_leak,
            });
        }
        if !(self.leak_decay_interval.is_finite() && self.leak_decay_interval > 0.0) {
            return Err(ConfigError::NonPositiveLeakDecay {
                interval: self.leak_decay_interval,
            });
        }
        if !(0.0..self.max_leak).contains(&self.freeze_recovery_leak) {
            return Err(ConfigError::FreezeRecoveryOutOfRange {
                recovery: self.freeze_recovery_leak,
                max_leak: self.max_leak,
            });
        }
        Ok(())
    }
}

/// Zero-Day elite tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZeroDay {
    /// Health at threat level zero.
    pub base_health: f32,
    /// Movement speed.
    pub speed: f32,
    /// Leak counter increase per second while alive.
    pub efficiency_drain_rate: f32,
    /// Threat level required before the elite may appear.
    pub min_waves_before_spawn: u32,
    /// Chance per spawn opportunity once eligible.
    pub spawn_chance: f64,
    /// Hash credited on defeat.
    pub defeat_hash_bonus: f64,
    /// Leak counter reduction on defeat.
    pub defeat_efficiency_restore: f32,
}

impl Default for ZeroDay {
    fn default() -> Self {
        Self {
            base_health: 800.0,
            speed: 30.0,
            efficiency_drain_rate: 0.1,
            min_waves_before_spawn: 4,
            spawn_chance: 0.02,
            defeat_hash_bonus: 300.0,
            defeat_efficiency_restore: 5.0,
        }
    }
}

/// Overclock boost tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Overclock {
    /// Seconds the boost lasts before RAM bonuses.
    pub duration: f32,
    /// Seconds after activation before the boost can be used again.
    pub cooldown: f32,
    /// Income multiplier while active.
    pub hash_multiplier: f64,
    /// Attack-rate multiplier while active.
    pub attack_rate_multiplier: f32,
}

impl Default for Overclock {
    fn default() -> Self {
        Self {
            duration: 20.0,
            cooldown: 90.0,
            hash_multiplier: 2.0,
            attack_rate_multiplier: 1.25,
        }
    }
}

/// Tower purchase and upgrade pricing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TowerPricing {
    /// Purchase cost by rarity.
    pub cost: RarityTable,
    /// Upgrade cost factor applied to `cost * level`.
    pub upgrade_factor: f64,
    /// Fraction of invested hash returned on sale.
    pub sell_refund: f64,
    /// Slots available before EXPANSION upgrades.
    pub base_slots: u32,
    /// Flat hash bonus for defeating a marked hostile.
    pub mark_bonus: f64,
}

impl Default for TowerPricing {
    fn default() -> Self {
        Self {
            cost: RarityTable {
                common: 50.0,
                rare: 120.0,
                epic: 250.0,
                legendary: 500.0,
            },
            upgrade_factor: 0.75,
            sell_refund: 0.5,
            base_slots: 12,
            mark_bonus: 3.0,
        }
    }
}

impl TowerPricing {
    /// Purchase cost for `rarity`.
    #[must_use]
    pub fn purchase_cost(&self, rarity: Rarity) -> f64 {
        f64::from(self.cost.get(rarity))
    }

    /// Cost of raising a tower of `rarity` from `level` to `level + 1`.
    #[must_use]
    pub fn upgrade_cost(&self, rarity: Rarity, level: u32) -> f64 {
        self.purchase_cost(rarity) * f64::from(level.max(1)) * self.upgrade_factor
    }
}

/// Sector encounter offers in the defence loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncounterOffers {
    /// Seconds between offers.
    pub interval: f32,
    /// Seconds an offer stays open.
    pub window: f32,
}

impl Default for EncounterOffers {
    fn default() -> Self {
        Self {
            interval: 120.0,
            window: 20.0,
        }
    }
}

/// Boss encounter tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bosses {
    /// Cyberboss.
    pub cyberboss: BossTuning,
    /// Void Harbinger.
    pub void_harbinger: BossTuning,
    /// Overclocker.
    pub overclocker: BossTuning,
    /// Trojan Wyrm.
    pub trojan_wyrm: BossTuning,
    /// Avatar baseline.
    pub avatar: AvatarTuning,
    /// Damage multiplier per equipped weapon level above 1.
    pub weapon_damage_per_level: f32,
}

impl Default for Bosses {
    fn default() -> Self {
        Self {
            cyberboss: BossTuning::new(5_000.0, [0.75, 0.50, 0.25]),
            void_harbinger: BossTuning::new(5_500.0, [0.70, 0.40, 0.10]),
            overclocker: BossTuning::new(4_800.0, [0.80, 0.55, 0.30]),
            trojan_wyrm: BossTuning::new(6_000.0, [0.66, 0.33, 0.15]),
            avatar: AvatarTuning::default(),
            weapon_damage_per_level: 0.15,
        }
    }
}

/// Per-archetype health and phase thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BossTuning {
    /// Maximum health.
    pub base_health: f32,
    /// Health fraction at or below which phase 2 starts.
    pub phase2_threshold: f32,
    /// Health fraction at or below which phase 3 starts.
    pub phase3_threshold: f32,
    /// Health fraction at or below which phase 4 starts.
    pub phase4_threshold: f32,
}

impl BossTuning {
    const fn new(base_health: f32, thresholds: [f32; 3]) -> Self {
        Self {
            base_health,
            phase2_threshold: thresholds[0],
            phase3_threshold: thresholds[1],
            phase4_threshold: thresholds[2],
        }
    }

    fn validate(&self, archetype: BossArchetype) -> Result<(), ConfigError> {
        if !(self.base_health.is_finite() && self.base_health > 0.0) {
            return Err(ConfigError::NonPositiveBossHealth {
                archetype,
                health: self.base_health,
            });
        }
        let thresholds = [
            self.phase2_threshold,
            self.phase3_threshold,
            self.phase4_threshold,
        ];
        let inside = thresholds.iter().all(|t| *t > 0.0 && *t < 1.0);
        let descending = thresholds.windows(2).all(|pair| pair[0] > pair[1]);
        if !(inside && descending) {
            return Err(ConfigError::InvalidPhaseThresholds {
                archetype,
                thresholds,
            });
        }
        Ok(())
    }

    /// Threshold guarding entry into `phase` (2..=4).
    #[must_use]
    pub const fn threshold_for(&self, phase: u8) -> Option<f32> {
        match phase {
            2 => Some(self.phase2_threshold),
            3 => Some(self.phase3_threshold),
            4 => Some(self.phase4_threshold),
            _ => None,
        }
    }
}

/// Avatar baseline before difficulty and weapon scaling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AvatarTuning {
    /// Maximum health.
    pub health: f32,
    /// Damage per attack.
    pub damage: f32,
    /// Seconds between attacks.
    pub attack_interval: f32,
    /// Attack reach.
    pub attack_range: f32,
    /// Movement speed.
    pub speed: f32,
    /// Health fraction restored on revive.
    pub revive_fraction: f32,
    /// Invulnerability seconds after revive.
    pub revive_invulnerability: f32,
}

impl Default for AvatarTuning {
    fn default() -> Self {
        Self {
            health: 500.0,
            damage: 25.0,
            attack_interval: 0.5,
            attack_range: 140.0,
            speed: 220.0,
            revive_fraction: 0.5,
            revive_invulnerability: 2.0,
        }
    }
}
