#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative defence world state for Kernel Defence.
//!
//! The world owns towers, slots, hostiles, projectiles, the status ledger and
//! the economy counters of exactly one run. Every mutation flows through
//! [`apply`]; systems and bots observe the world through [`query`].

mod combat;
mod economy;
mod path;
mod stages;
mod status;
mod towers;

use std::collections::BTreeMap;

use kernel_defence_core::{
    derive_seed, geometry::Vec2, Command, ConfigError, Event, HostileId, Progression, Scenario,
    SimRng, SimulationContext,
};
use serde::{Deserialize, Serialize};

use crate::{
    combat::{Hostile, Projectile},
    economy::{Economy, Limits},
    path::LanePath,
    status::StatusLedger,
    towers::{SlotTable, TowerRegistry},
};

/// Construction parameters of a defence world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    seed: u64,
    scenario: Scenario,
    lane: Vec<Vec2>,
}

impl WorldConfig {
    /// Creates a configuration that uses the built-in lane.
    #[must_use]
    pub fn new(seed: u64, scenario: Scenario) -> Self {
        Self {
            seed,
            scenario,
            lane: path::default_waypoints(),
        }
    }

    /// Replaces the lane waypoints.
    #[must_use]
    pub fn with_lane(mut self, waypoints: Vec<Vec2>) -> Self {
        self.lane = waypoints;
        self
    }

    /// Seed the world derives its combat rolls from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Scenario modifiers applied to the run.
    #[must_use]
    pub const fn scenario(&self) -> Scenario {
        self.scenario
    }
}

/// Monotonic run instrumentation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Hostiles defeated.
    pub kills: u32,
    /// Hostiles spawned.
    pub hostiles_spawned: u32,
    /// Hostiles that reached the objective.
    pub leaks: u32,
    /// Hash credited from kills, income and refunds.
    pub hash_earned: f64,
    /// Damage applied to hostiles.
    pub damage_dealt: f64,
    /// Freezes triggered.
    pub freezes: u32,
    /// Simulation time of the first freeze.
    pub first_freeze_at: Option<f64>,
    /// Towers placed.
    pub towers_built: u32,
    /// Highest level any tower reached.
    pub peak_tower_level: u32,
    /// Zero-Day elites defeated.
    pub zero_days_defeated: u32,
    /// Sector encounters engaged.
    pub encounters_engaged: u32,
}

/// Timed overclock bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct OverclockState {
    active_until: Option<f64>,
    ready_at: f64,
}

/// Sector encounter offer bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct EncounterOffers {
    next_offer_at: Option<f64>,
    pending_until: Option<f64>,
}

/// Serializable state of one run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct WorldState {
    clock: f64,
    tick_index: u64,
    scenario: Scenario,
    progression: Progression,
    limits: Limits,
    lane: LanePath,
    slots: SlotTable,
    towers: TowerRegistry,
    hostiles: BTreeMap<HostileId, Hostile>,
    next_hostile_id: HostileId,
    projectiles: Vec<Projectile>,
    status: StatusLedger,
    economy: Economy,
    overclock: OverclockState,
    encounters: EncounterOffers,
    threat: u32,
    frozen_this_tick: bool,
    stats: RunStats,
    rng: SimRng,
}

/// Represents the authoritative defence world of one run.
#[derive(Clone, Debug)]
pub struct World {
    context: SimulationContext,
    state: WorldState,
}

/// Opaque serializable capture of a world, restored with [`World::restore`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldSnapshot {
    state: WorldState,
}

impl World {
    /// Builds the world for one run from the player's progression.
    pub fn new(
        context: SimulationContext,
        progression: &Progression,
        config: &WorldConfig,
    ) -> Result<Self, ConfigError> {
        let balance = context.balance();
        balance.validate()?;
        let lane = LanePath::new(&config.lane)?;
        let limits = Limits::derive(balance, progression, config.scenario);
        if limits.slot_count == 0 {
            return Err(ConfigError::NoSlots);
        }

        let slots = SlotTable::new(lane.slot_positions(limits.slot_count));
        let economy = Economy::new(progression.starting_hash, limits.storage);
        let interval = balance.encounters.interval;
        let state = WorldState {
            clock: 0.0,
            tick_index: 0,
            scenario: config.scenario,
            progression: progression.clone(),
            slots,
            towers: TowerRegistry::new(),
            hostiles: BTreeMap::new(),
            next_hostile_id: HostileId::new(0),
            projectiles: Vec::new(),
            status: StatusLedger::new(),
            economy,
            overclock: OverclockState {
                active_until: None,
                ready_at: 0.0,
            },
            encounters: EncounterOffers {
                next_offer_at: (interval > 0.0).then(|| f64::from(interval)),
                pending_until: None,
            },
            threat: 0,
            frozen_this_tick: false,
            stats: RunStats::default(),
            rng: SimRng::new(derive_seed(config.seed, "world", 0)),
            limits,
            lane,
        };

        Ok(Self { context, state })
    }

    /// Captures the complete run state.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            state: self.state.clone(),
        }
    }

    /// Rebuilds a world from a snapshot and the context it was created with.
    #[must_use]
    pub fn restore(snapshot: WorldSnapshot, context: SimulationContext) -> Self {
        Self {
            context,
            state: snapshot.state,
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands that cannot be honoured leave the world untouched and emit
/// [`Event::ActionRejected`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let World { context, state } = world;
    let balance = context.balance();
    match command {
        Command::Tick { dt } => state.begin_tick(dt, balance, out_events),
        Command::TickPassives { dt } => state.tick_passives(dt, balance, out_events),
        Command::ResolveObjective => state.resolve_objective(balance, out_events),
        Command::AdvanceProjectiles { dt } => state.advance_projectiles(dt),
        Command::ResolveCollisions => state.resolve_collisions(),
        Command::TickStatusEffects { dt } => state.tick_status_effects(dt),
        Command::Cleanup => state.cleanup(balance, out_events),
        Command::TickEconomy { dt } => state.tick_economy(dt, balance, out_events),
        Command::PlaceTower { weapon, slot } => {
            state.place_tower(context.content(), balance, &weapon, slot, out_events);
        }
        Command::UpgradeTower { tower } => state.upgrade_tower(tower, balance, out_events),
        Command::SellTower { tower } => state.sell_tower(tower, balance, out_events),
        Command::ActivateOverclock => state.activate_overclock(balance, out_events),
        Command::EngageEncounter => state.engage_encounter(balance, out_events),
        Command::SkipEncounter => state.skip_encounter(out_events),
        Command::SpawnHostile { kind } => state.spawn_hostile(kind, balance, out_events),
        Command::AdvanceHostile { hostile, distance } => state.advance_hostile(hostile, distance),
        Command::FireAt { tower, hostile } => state.fire_at(tower, hostile, balance, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use kernel_defence_core::{
        geometry::Vec2, BalanceConfig, HostileKind, HostileSnapshot, HostileView, Progression,
        Scenario, SlotId, TowerId, TowerSnapshot, TowerView, WeaponDefinition, WeaponId,
    };

    use super::{RunStats, World};

    /// Seconds of simulated time elapsed.
    #[must_use]
    pub fn clock(world: &World) -> f64 {
        world.state.clock
    }

    /// Number of ticks processed.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.state.tick_index
    }

    /// Current threat level.
    #[must_use]
    pub fn threat_level(world: &World) -> u32 {
        world.state.threat
    }

    /// Scenario the run was built with.
    #[must_use]
    pub fn scenario(world: &World) -> Scenario {
        world.state.scenario
    }

    /// Progression snapshot the run was built from.
    #[must_use]
    pub fn progression(world: &World) -> &Progression {
        &world.state.progression
    }

    /// Balance table in effect.
    #[must_use]
    pub fn balance(world: &World) -> &BalanceConfig {
        world.context.balance()
    }

    /// Current hash balance.
    #[must_use]
    pub fn hash(world: &World) -> f64 {
        world.state.economy.hash()
    }

    /// Hash storage ceiling.
    #[must_use]
    pub fn storage(world: &World) -> f64 {
        world.state.limits.storage
    }

    /// Income per second at full efficiency without overclock.
    #[must_use]
    pub fn base_income(world: &World) -> f64 {
        world.state.limits.income_per_second
    }

    /// Current leak counter.
    #[must_use]
    pub fn leak(world: &World) -> f32 {
        world.state.economy.leak()
    }

    /// Efficiency percentage in `[0, 100]`.
    #[must_use]
    pub fn efficiency(world: &World) -> f32 {
        world
            .state
            .economy
            .efficiency(&world.context.balance().efficiency)
    }

    /// Power capacity of the grid.
    #[must_use]
    pub fn power_capacity(world: &World) -> f32 {
        world.state.limits.power_capacity
    }

    /// Power drawn by placed towers.
    #[must_use]
    pub fn power_draw(world: &World) -> f32 {
        world.state.power_draw()
    }

    /// Power a tower of `weapon` would draw, if the weapon is known.
    #[must_use]
    pub fn tower_power(world: &World, weapon: &WeaponId) -> Option<f32> {
        weapon_definition(world, weapon)
            .map(|definition| world.state.limits.tower_power.get(definition.rarity))
    }

    /// Looks up a weapon definition in the injected content library.
    #[must_use]
    pub fn weapon_definition<'a>(
        world: &'a World,
        weapon: &WeaponId,
    ) -> Option<&'a WeaponDefinition> {
        world.context.content().weapon(weapon)
    }

    /// Compiled weapons that the content library knows about, in id order.
    #[must_use]
    pub fn placeable_weapons(world: &World) -> Vec<&WeaponDefinition> {
        world
            .context
            .content()
            .weapons()
            .into_iter()
            .filter(|definition| world.state.progression.is_compiled(&definition.id))
            .collect()
    }

    /// Purchase cost of a tower of `weapon`.
    #[must_use]
    pub fn purchase_cost(world: &World, weapon: &WeaponId) -> Option<f64> {
        weapon_definition(world, weapon)
            .map(|definition| world.context.balance().towers.purchase_cost(definition.rarity))
    }

    /// Cost of the next upgrade of `tower`, or `None` when unknown or maxed.
    #[must_use]
    pub fn upgrade_cost(world: &World, tower: TowerId) -> Option<f64> {
        let balance = world.context.balance();
        world
            .state
            .towers
            .get(tower)
            .filter(|state| state.level < balance.protocol_scaling.max_level)
            .map(|state| {
                balance
                    .towers
                    .upgrade_cost(state.definition.rarity, state.level)
            })
    }

    /// Captures a read-only view of the live hostiles.
    #[must_use]
    pub fn hostile_view(world: &World) -> HostileView {
        let state = &world.state;
        let snapshots: Vec<HostileSnapshot> = state
            .hostiles
            .values()
            .filter(|hostile| hostile.is_live())
            .map(|hostile| HostileSnapshot {
                id: hostile.id,
                kind: hostile.kind,
                position: hostile.position,
                health: hostile.health,
                max_health: hostile.max_health,
                progress: hostile.progress,
                speed: hostile.speed,
                speed_factor: state.status.speed_factor(hostile.id, state.clock),
                marked: state.status.is_marked(hostile.id, state.clock),
                radius: hostile.radius,
            })
            .collect();
        HostileView::from_snapshots(snapshots)
    }

    /// Number of live hostiles of `kind`.
    #[must_use]
    pub fn hostile_count(world: &World, kind: HostileKind) -> usize {
        world
            .state
            .hostiles
            .values()
            .filter(|hostile| hostile.kind == kind && hostile.is_live())
            .count()
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let state = &world.state;
        let balance = world.context.balance();
        let snapshots: Vec<TowerSnapshot> = state
            .towers
            .iter()
            .map(|tower| TowerSnapshot {
                id: tower.id,
                slot: tower.slot,
                weapon: tower.definition.kind,
                rarity: tower.definition.rarity,
                level: tower.level,
                position: state.slots.position(tower.slot).unwrap_or(Vec2::ZERO),
                range: state.effective_range(tower, balance),
                ready_in: tower.cooldown,
            })
            .collect();
        TowerView::from_snapshots(snapshots)
    }

    /// Mean level of the placed towers, zero without towers.
    #[must_use]
    pub fn average_tower_level(world: &World) -> f32 {
        let towers = &world.state.towers;
        if towers.len() == 0 {
            return 0.0;
        }
        let total: u32 = towers.iter().map(|tower| tower.level).sum();
        total as f32 / towers.len() as f32
    }

    /// Slot occupancy in slot order.
    #[must_use]
    pub fn slots(world: &World) -> Vec<SlotSnapshot> {
        world
            .state
            .slots
            .iter()
            .map(|(id, position, occupant)| SlotSnapshot {
                id,
                position,
                occupant,
            })
            .collect()
    }

    /// Empty slots in slot order.
    #[must_use]
    pub fn free_slots(world: &World) -> Vec<SlotId> {
        world
            .state
            .slots
            .iter()
            .filter(|(_, _, occupant)| occupant.is_none())
            .map(|(id, _, _)| id)
            .collect()
    }

    /// Number of slots.
    #[must_use]
    pub fn slot_count(world: &World) -> usize {
        world.state.slots.len()
    }

    /// Simulation time at which the pending encounter offer lapses.
    #[must_use]
    pub fn pending_encounter(world: &World) -> Option<f64> {
        world.state.encounters.pending_until
    }

    /// Current overclock availability.
    #[must_use]
    pub fn overclock_status(world: &World) -> OverclockStatus {
        let state = &world.state;
        match state.overclock.active_until {
            Some(until) if state.clock < until => OverclockStatus::Active {
                remaining: (until - state.clock) as f32,
            },
            _ if state.clock < state.overclock.ready_at => OverclockStatus::CoolingDown {
                remaining: (state.overclock.ready_at - state.clock) as f32,
            },
            _ => OverclockStatus::Ready,
        }
    }

    /// Run instrumentation.
    #[must_use]
    pub fn stats(world: &World) -> &RunStats {
        &world.state.stats
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn projectile_count(world: &World) -> usize {
        world.state.projectiles.len()
    }

    /// Number of hostiles with an entry in the status ledger.
    #[must_use]
    pub fn status_entry_count(world: &World) -> usize {
        world.state.status.len()
    }

    /// Length of the lane from spawn to objective.
    #[must_use]
    pub fn lane_length(world: &World) -> f32 {
        world.state.lane.length()
    }

    /// Slot occupancy captured for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct SlotSnapshot {
        /// Slot identifier.
        pub id: SlotId,
        /// Slot position.
        pub position: Vec2,
        /// Tower bound to the slot.
        pub occupant: Option<TowerId>,
    }

    /// Overclock availability.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub enum OverclockStatus {
        /// May be activated.
        Ready,
        /// Boost running.
        Active {
            /// Seconds left.
            remaining: f32,
        },
        /// Waiting for the cooldown.
        CoolingDown {
            /// Seconds left.
            remaining: f32,
        },
    }
}
