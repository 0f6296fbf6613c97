#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Kernel Defence simulation engine.
//!
//! This crate defines the message surface that connects the harness, the
//! authoritative defence world, the pure systems, and the bots. Bots return
//! [`DefenceAction`] or [`EncounterAction`] values, the defence loop turns
//! actions and system output into [`Command`] values, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what happened. Rejected commands never fault; they surface as
//! [`Event::ActionRejected`].

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

pub mod balance;
pub mod content;
pub mod geometry;
pub mod progression;
pub mod rng;

mod error;

pub use balance::BalanceConfig;
pub use content::{
    BuiltinContent, ContentLibrary, HostileKind, HostileProfile, OnHitEffect, Rarity, SectorId,
    WeaponDefinition, WeaponId, WeaponKind,
};
pub use error::ConfigError;
pub use geometry::Vec2;
pub use progression::{ComponentKind, Progression};
pub use rng::{derive_seed, SimRng};

/// Unique identifier assigned to a hostile. Identifiers increase in spawn order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostileId(u32);

impl HostileId {
    /// Creates a new hostile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a placement slot along the lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a new slot identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the slot identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Decision returned by a defence bot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DefenceAction {
    /// Do nothing this decision.
    Idle,
    /// Place a compiled weapon into an empty slot.
    Place {
        /// Weapon to build.
        weapon: WeaponId,
        /// Slot to bind the new tower to.
        slot: SlotId,
    },
    /// Raise a tower's level by one.
    Upgrade {
        /// Tower to upgrade.
        tower: TowerId,
    },
    /// Sell a tower and free its slot.
    Sell {
        /// Tower to sell.
        tower: TowerId,
    },
    /// Start the overclock boost.
    ActivateOverclock,
    /// Accept the pending sector encounter.
    EngageEncounter,
    /// Dismiss the pending sector encounter.
    SkipEncounter,
}

impl DefenceAction {
    /// Translates the action into the world command that executes it.
    #[must_use]
    pub fn into_command(self) -> Option<Command> {
        match self {
            Self::Idle => None,
            Self::Place { weapon, slot } => Some(Command::PlaceTower { weapon, slot }),
            Self::Upgrade { tower } => Some(Command::UpgradeTower { tower }),
            Self::Sell { tower } => Some(Command::SellTower { tower }),
            Self::ActivateOverclock => Some(Command::ActivateOverclock),
            Self::EngageEncounter => Some(Command::EngageEncounter),
            Self::SkipEncounter => Some(Command::SkipEncounter),
        }
    }
}

/// Decision returned by an encounter bot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EncounterAction {
    /// Stand still.
    Idle,
    /// Move along the provided direction at full speed.
    MoveVector(Vec2),
    /// Move toward the provided arena point, stopping on arrival.
    MoveToward(Vec2),
}

/// Commands that express all permissible defence world mutations.
///
/// The stage commands (`Tick` through `TickEconomy`) are issued once per tick
/// by the defence loop in a fixed order; the remaining commands come from bot
/// actions and the pure systems.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock and runs the freeze check.
    Tick {
        /// Seconds of simulated time to advance.
        dt: f32,
    },
    /// Ticks the overclock boost, tower cooldowns and elite drain.
    TickPassives {
        /// Seconds of simulated time elapsed.
        dt: f32,
    },
    /// Removes hostiles that reached the objective and charges their leak.
    ResolveObjective,
    /// Moves projectiles, steering homing ones, and culls expired shots.
    AdvanceProjectiles {
        /// Seconds of simulated time elapsed.
        dt: f32,
    },
    /// Resolves swept projectile collisions against hostiles.
    ResolveCollisions,
    /// Spends burn pools and clears expired status effects.
    TickStatusEffects {
        /// Seconds of simulated time elapsed.
        dt: f32,
    },
    /// Credits and removes defeated hostiles.
    Cleanup,
    /// Decays the leak counter and accrues hash.
    TickEconomy {
        /// Seconds of simulated time elapsed.
        dt: f32,
    },
    /// Requests placement of a compiled weapon into a slot.
    PlaceTower {
        /// Weapon definition to build.
        weapon: WeaponId,
        /// Slot that will hold the tower.
        slot: SlotId,
    },
    /// Requests a single-level tower upgrade.
    UpgradeTower {
        /// Tower to upgrade.
        tower: TowerId,
    },
    /// Requests the sale of a tower.
    SellTower {
        /// Tower to sell.
        tower: TowerId,
    },
    /// Requests activation of the overclock boost.
    ActivateOverclock,
    /// Accepts the pending sector encounter.
    EngageEncounter,
    /// Dismisses the pending sector encounter.
    SkipEncounter,
    /// Requests that a hostile of the provided kind enters the lane.
    SpawnHostile {
        /// Kind of hostile to spawn.
        kind: HostileKind,
    },
    /// Moves a hostile along the lane.
    AdvanceHostile {
        /// Hostile to move.
        hostile: HostileId,
        /// Distance travelled along the lane this tick.
        distance: f32,
    },
    /// Fires a ready tower at its selected target.
    FireAt {
        /// Tower that fires.
        tower: TowerId,
        /// Hostile the tower aims at.
        hostile: HostileId,
    },
}

/// Reasons a command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The hash balance cannot cover the cost.
    InsufficientFunds,
    /// The slot already holds a tower.
    SlotOccupied,
    /// No slot with the provided identifier exists.
    UnknownSlot,
    /// The tower would exceed the power capacity.
    PowerBudgetExceeded,
    /// The content library has no definition for the weapon.
    UnknownWeapon,
    /// The weapon exists but has not been compiled.
    WeaponNotCompiled,
    /// No tower with the provided identifier exists.
    UnknownTower,
    /// The tower is already at the highest level.
    MaxLevel,
    /// The overclock is active or cooling down.
    OverclockUnavailable,
    /// There is no encounter offer to answer.
    NoPendingEncounter,
    /// The hostile or target no longer exists.
    UnknownHostile,
    /// The tower is still cooling down.
    TowerNotReady,
}

/// Events broadcast by the world after processing commands and tick stages.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Seconds of simulated time that elapsed in the tick.
        dt: f32,
    },
    /// Efficiency hit zero and the system froze.
    FreezeTriggered {
        /// Simulation time of the freeze.
        at: f64,
    },
    /// Efficiency fell below the warning threshold.
    EfficiencyWarning {
        /// Efficiency percentage when the warning fired.
        efficiency: f32,
    },
    /// Threat level increased.
    ThreatRaised {
        /// New threat level.
        level: u32,
    },
    /// A hostile entered the lane.
    HostileSpawned {
        /// Identifier of the new hostile.
        hostile: HostileId,
        /// Kind of the new hostile.
        kind: HostileKind,
    },
    /// A hostile was defeated.
    HostileKilled {
        /// Identifier of the defeated hostile.
        hostile: HostileId,
        /// Kind of the defeated hostile.
        kind: HostileKind,
        /// Hash credited for the kill.
        reward: f64,
    },
    /// A hostile reached the objective.
    HostileLeaked {
        /// Identifier of the hostile.
        hostile: HostileId,
        /// Leak counter increase applied.
        leak: f32,
    },
    /// A tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Slot the tower occupies.
        slot: SlotId,
        /// Weapon family of the tower.
        weapon: WeaponKind,
    },
    /// A tower gained a level.
    TowerUpgraded {
        /// Identifier of the tower.
        tower: TowerId,
        /// New level.
        level: u32,
    },
    /// A tower was sold.
    TowerSold {
        /// Identifier of the tower.
        tower: TowerId,
        /// Hash refunded.
        refund: f64,
    },
    /// A tower fired.
    TowerFired {
        /// Identifier of the tower.
        tower: TowerId,
        /// Target of the shot.
        hostile: HostileId,
    },
    /// The overclock boost started.
    OverclockStarted {
        /// Seconds the boost will last.
        duration: f32,
    },
    /// The overclock boost ended.
    OverclockExpired,
    /// A sector encounter is available.
    EncounterOffered {
        /// Simulation time at which the offer lapses.
        expires_at: f64,
    },
    /// The player engaged the sector encounter.
    EncounterEngaged,
    /// The player skipped the sector encounter, or it lapsed.
    EncounterSkipped,
    /// A command was rejected and had no effect.
    ActionRejected {
        /// Specific reason for the rejection.
        reason: RejectionReason,
    },
}

/// Spawn and income modifiers selected per run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    /// Default pacing.
    #[default]
    Standard,
    /// Hostiles arrive faster.
    Onslaught,
    /// Income is reduced.
    Drought,
}

impl Scenario {
    /// Every scenario in declaration order.
    pub const ALL: [Scenario; 3] = [Self::Standard, Self::Onslaught, Self::Drought];

    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Onslaught => "onslaught",
            Self::Drought => "drought",
        }
    }

    /// Multiplier applied to the spawn interval.
    #[must_use]
    pub const fn spawn_interval_multiplier(self) -> f32 {
        match self {
            Self::Standard | Self::Drought => 1.0,
            Self::Onslaught => 0.6,
        }
    }

    /// Multiplier applied to hash income.
    #[must_use]
    pub const fn income_multiplier(self) -> f64 {
        match self {
            Self::Standard | Self::Onslaught => 1.0,
            Self::Drought => 0.5,
        }
    }
}

/// Boss archetypes available to the encounter loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BossArchetype {
    /// Minion-summoning sentinel with lasers.
    Cyberboss,
    /// Pylon-shielded rift caller.
    VoidHarbinger,
    /// Blade-spinning furnace.
    Overclocker,
    /// Segmented serpent that splits.
    TrojanWyrm,
}

impl BossArchetype {
    /// Every archetype in declaration order.
    pub const ALL: [BossArchetype; 4] = [
        Self::Cyberboss,
        Self::VoidHarbinger,
        Self::Overclocker,
        Self::TrojanWyrm,
    ];

    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cyberboss => "cyberboss",
            Self::VoidHarbinger => "void-harbinger",
            Self::Overclocker => "overclocker",
            Self::TrojanWyrm => "trojan-wyrm",
        }
    }

    /// Tuning entry for the archetype.
    #[must_use]
    pub const fn tuning(self, bosses: &balance::Bosses) -> &balance::BossTuning {
        match self {
            Self::Cyberboss => &bosses.cyberboss,
            Self::VoidHarbinger => &bosses.void_harbinger,
            Self::Overclocker => &bosses.overclocker,
            Self::TrojanWyrm => &bosses.trojan_wyrm,
        }
    }
}

impl fmt::Display for BossArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Difficulty tiers for the encounter loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Forgiving tier.
    Easy,
    /// Reference tier.
    #[default]
    Normal,
    /// Punishing tier.
    Hard,
    /// Extreme tier.
    Nightmare,
}

impl Difficulty {
    /// Every tier from easiest to hardest.
    pub const ALL: [Difficulty; 4] = [Self::Easy, Self::Normal, Self::Hard, Self::Nightmare];

    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
            Self::Nightmare => "nightmare",
        }
    }

    /// Avatar health multiplier.
    #[must_use]
    pub const fn avatar_health_multiplier(self) -> f32 {
        match self {
            Self::Easy => 1.5,
            Self::Normal => 1.0,
            Self::Hard => 0.85,
            Self::Nightmare => 0.7,
        }
    }

    /// Avatar damage multiplier.
    #[must_use]
    pub const fn avatar_damage_multiplier(self) -> f32 {
        match self {
            Self::Easy => 1.25,
            Self::Normal => 1.0,
            Self::Hard => 0.9,
            Self::Nightmare => 0.8,
        }
    }

    /// Boss damage multiplier.
    #[must_use]
    pub const fn boss_damage_multiplier(self) -> f32 {
        match self {
            Self::Easy => 0.6,
            Self::Normal => 1.0,
            Self::Hard => 1.4,
            Self::Nightmare => 2.0,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Services injected into every simulation at construction.
///
/// Content and balance are shared read-only behind [`Arc`], so many runs can
/// borrow the same tables from parallel workers without cross-talk.
#[derive(Clone, Debug)]
pub struct SimulationContext {
    content: Arc<dyn ContentLibrary>,
    balance: Arc<BalanceConfig>,
}

impl SimulationContext {
    /// Creates a context from explicit services.
    #[must_use]
    pub fn new(content: Arc<dyn ContentLibrary>, balance: Arc<BalanceConfig>) -> Self {
        Self { content, balance }
    }

    /// Context backed by the built-in content and default balance.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            Arc::new(BuiltinContent::new()),
            Arc::new(BalanceConfig::default()),
        )
    }

    /// Returns a copy of the context that uses `balance`.
    #[must_use]
    pub fn with_balance(&self, balance: BalanceConfig) -> Self {
        Self {
            content: Arc::clone(&self.content),
            balance: Arc::new(balance),
        }
    }

    /// Content library.
    #[must_use]
    pub fn content(&self) -> &dyn ContentLibrary {
        self.content.as_ref()
    }

    /// Balance table.
    #[must_use]
    pub fn balance(&self) -> &BalanceConfig {
        &self.balance
    }
}

/// Immutable representation of a single hostile used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostileSnapshot {
    /// Identifier assigned to the hostile.
    pub id: HostileId,
    /// Kind of hostile.
    pub kind: HostileKind,
    /// Current position.
    pub position: Vec2,
    /// Current health.
    pub health: f32,
    /// Health at spawn.
    pub max_health: f32,
    /// Distance travelled along the lane.
    pub progress: f32,
    /// Base movement speed.
    pub speed: f32,
    /// Movement multiplier from status effects; zero while stunned.
    pub speed_factor: f32,
    /// Whether an active mark makes the hostile pay a bonus on defeat.
    pub marked: bool,
    /// Collision radius.
    pub radius: f32,
}

/// Read-only snapshot describing all live hostiles.
#[derive(Clone, Debug, Default)]
pub struct HostileView {
    snapshots: Vec<HostileSnapshot>,
}

impl HostileView {
    /// Creates a new hostile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<HostileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &HostileSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured hostiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a single tower used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Slot the tower occupies.
    pub slot: SlotId,
    /// Weapon family.
    pub weapon: WeaponKind,
    /// Rarity tier of the weapon.
    pub rarity: Rarity,
    /// Current level.
    pub level: u32,
    /// Position of the tower's slot.
    pub position: Vec2,
    /// Effective targeting range.
    pub range: f32,
    /// Seconds until the tower may fire again.
    pub ready_in: f32,
}

/// Read-only snapshot describing all placed towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a tower by identifier.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured towers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Target assignment computed for a tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower that aims.
    pub tower: TowerId,
    /// Hostile selected as the target.
    pub hostile: HostileId,
    /// Squared distance between tower and target.
    pub distance_sq: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&TowerId::new(42));
        assert_round_trip(&HostileId::new(7));
        assert_round_trip(&SlotId::new(3));
    }

    #[test]
    fn actions_round_trip_through_bincode() {
        assert_round_trip(&DefenceAction::Place {
            weapon: WeaponKind::KernelPulse.id(),
            slot: SlotId::new(1),
        });
        assert_round_trip(&EncounterAction::MoveToward(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn idle_action_has_no_command() {
        assert_eq!(DefenceAction::Idle.into_command(), None);
        assert_eq!(
            DefenceAction::Sell {
                tower: TowerId::new(2)
            }
            .into_command(),
            Some(Command::SellTower {
                tower: TowerId::new(2)
            })
        );
    }

    #[test]
    fn tower_view_lookup_uses_sorted_ids() {
        let snapshot = |id: u32| TowerSnapshot {
            id: TowerId::new(id),
            slot: SlotId::new(id),
            weapon: WeaponKind::KernelPulse,
            rarity: Rarity::Common,
            level: 1,
            position: Vec2::ZERO,
            range: 100.0,
            ready_in: 0.0,
        };
        let view = TowerView::from_snapshots(vec![snapshot(5), snapshot(2), snapshot(9)]);
        let ids: Vec<u32> = view.iter().map(|tower| tower.id.get()).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert!(view.get(TowerId::new(5)).is_some());
        assert!(view.get(TowerId::new(4)).is_none());
    }

    #[test]
    fn difficulty_scales_boss_damage_monotonically() {
        let tiers = [
            Difficulty::Easy,
            Difficulty::Normal,
            Difficulty::Hard,
            Difficulty::Nightmare,
        ];
        for pair in tiers.windows(2) {
            assert!(pair[0].boss_damage_multiplier() < pair[1].boss_damage_multiplier());
        }
    }
}
