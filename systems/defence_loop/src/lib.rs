#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-timestep defence simulator that drives the world through the pure systems.
//!
//! One [`DefenceSimulator::step`] runs every stage of a tick in a fixed order:
//! clock and freeze check, spawning, passive timers, movement, targeting,
//! attacks, objective damage, projectile advance, collisions, status effects,
//! cleanup and finally the economy. Bot decisions are polled between ticks at
//! the configured cadence.

mod checkpoint;

use kernel_defence_core::{
    derive_seed, Command, ConfigError, DefenceAction, Event, HostileKind, Progression, Scenario,
    SimulationContext, TowerTarget,
};
use kernel_defence_system_movement::Movement;
use kernel_defence_system_spawning::{Config as SpawningConfig, Spawning};
use kernel_defence_system_tower_combat::TowerCombat;
use kernel_defence_system_tower_targeting::TowerTargeting;
use kernel_defence_world::{self as world, query, World, WorldConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

pub use checkpoint::DefenceCheckpoint;

/// Slack absorbing float error when comparing elapsed time to the cadence.
const DECISION_TOLERANCE: f64 = 1e-6;

/// Decision-making agent for the defence loop.
///
/// Strategies are pure: they read the world and the progression snapshot and
/// return one action. The loop validates and applies it.
pub trait DefenceStrategy: Send + Sync {
    /// Name used in reports and the strategy registry.
    fn name(&self) -> &str;

    /// Chooses the next action.
    fn decide(&self, world: &World, progression: &Progression) -> DefenceAction;
}

/// Parameters of one defence run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefenceConfig {
    /// Seed every random draw of the run derives from.
    pub seed: u64,
    /// Spawn and income modifiers.
    pub scenario: Scenario,
    /// Fixed physics step in seconds.
    pub tick: f32,
    /// Run horizon in seconds.
    pub max_time: f32,
    /// Seconds between bot decisions.
    pub decision_interval: f32,
    /// Player state the run starts from.
    pub progression: Progression,
}

impl DefenceConfig {
    /// Default physics step.
    pub const DEFAULT_TICK: f32 = 0.1;
    /// Default run horizon.
    pub const DEFAULT_MAX_TIME: f32 = 300.0;
    /// Default decision cadence.
    pub const DEFAULT_DECISION_INTERVAL: f32 = 1.0;

    /// Creates a configuration with the default timings.
    #[must_use]
    pub fn new(seed: u64, scenario: Scenario, progression: Progression) -> Self {
        Self {
            seed,
            scenario,
            tick: Self::DEFAULT_TICK,
            max_time: Self::DEFAULT_MAX_TIME,
            decision_interval: Self::DEFAULT_DECISION_INTERVAL,
            progression,
        }
    }

    /// Overrides the run horizon.
    #[must_use]
    pub fn with_max_time(mut self, max_time: f32) -> Self {
        self.max_time = max_time;
        self
    }

    /// Overrides the physics step and decision cadence.
    #[must_use]
    pub fn with_timing(mut self, tick: f32, decision_interval: f32) -> Self {
        self.tick = tick;
        self.decision_interval = decision_interval;
        self
    }

    /// Validates the timing parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick.is_finite() && self.tick > 0.0) {
            return Err(ConfigError::NonPositiveTick { tick: self.tick });
        }
        if !(self.max_time.is_finite() && self.max_time > 0.0) {
            return Err(ConfigError::NonPositiveDuration {
                max_time: self.max_time,
            });
        }
        if !self.decision_interval.is_finite() || self.decision_interval < self.tick {
            return Err(ConfigError::DecisionIntervalTooShort {
                interval: self.decision_interval,
                tick: self.tick,
            });
        }
        Ok(())
    }

    /// Number of physics ticks the run lasts.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        (f64::from(self.max_time) / f64::from(self.tick)).ceil() as u64
    }
}

/// Summary record of a finished (or interrupted) defence run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefenceRunResult {
    /// Strategy that drove the run.
    pub strategy: String,
    /// Seed of the run.
    pub seed: u64,
    /// Scenario of the run.
    pub scenario: Scenario,
    /// Simulated seconds.
    pub elapsed: f64,
    /// Hostiles defeated.
    pub kills: u32,
    /// Hostiles spawned.
    pub hostiles_spawned: u32,
    /// Hostiles that reached the objective.
    pub leaks: u32,
    /// Hash credited over the run.
    pub hash_earned: f64,
    /// Hash held when the run ended.
    pub final_hash: f64,
    /// Freezes triggered.
    pub freezes: u32,
    /// Time of the first freeze, if any.
    pub first_freeze_at: Option<f64>,
    /// Efficiency when the run ended.
    pub final_efficiency: f32,
    /// Towers standing when the run ended.
    pub towers: usize,
    /// Towers placed over the run.
    pub towers_built: u32,
    /// Highest tower level reached.
    pub peak_tower_level: u32,
    /// Mean level of the standing towers.
    pub average_tower_level: f32,
    /// Threat level reached.
    pub threat_level: u32,
    /// Damage applied to hostiles.
    pub damage_dealt: f64,
    /// Zero-Day elites defeated.
    pub zero_days_defeated: u32,
    /// Sector encounters engaged.
    pub encounters_engaged: u32,
    /// Bot decisions polled.
    pub decisions: u64,
    /// Bot actions the world rejected.
    pub rejected_actions: u64,
}

/// Drives one defence run.
#[derive(Debug)]
pub struct DefenceSimulator {
    config: DefenceConfig,
    world: World,
    spawning: Spawning,
    movement: Movement,
    targeting: TowerTargeting,
    combat: TowerCombat,
    targets: Vec<TowerTarget>,
    ticks_elapsed: u64,
    total_ticks: u64,
    decisions: u64,
    rejected_actions: u64,
}

impl DefenceSimulator {
    /// Builds a simulator for `config`.
    pub fn new(context: SimulationContext, config: DefenceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let world = World::new(
            context,
            &config.progression,
            &WorldConfig::new(config.seed, config.scenario),
        )?;
        let spawning = Spawning::new(SpawningConfig::new(
            derive_seed(config.seed, "spawning", 0),
            config.scenario,
        ));
        Ok(Self::assemble(config, world, spawning))
    }

    fn assemble(config: DefenceConfig, world: World, spawning: Spawning) -> Self {
        Self {
            total_ticks: config.total_ticks(),
            config,
            world,
            spawning,
            movement: Movement::default(),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            targets: Vec::new(),
            ticks_elapsed: 0,
            decisions: 0,
            rejected_actions: 0,
        }
    }

    /// Read access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Configuration the run was built from.
    #[must_use]
    pub fn config(&self) -> &DefenceConfig {
        &self.config
    }

    /// Ticks simulated so far.
    #[must_use]
    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks_elapsed
    }

    /// Reports whether the run horizon has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.ticks_elapsed >= self.total_ticks
    }

    /// Simulates one tick, then polls the strategy when a decision is due.
    ///
    /// Every event produced during the tick is appended to `out_events`.
    pub fn step(&mut self, strategy: &dyn DefenceStrategy, out_events: &mut Vec<Event>) {
        if self.is_finished() {
            return;
        }
        let dt = self.config.tick;
        self.run_stages(dt, out_events);
        self.ticks_elapsed += 1;

        if self.decision_due() {
            self.decide(strategy, out_events);
        }
    }

    fn decision_due(&self) -> bool {
        let elapsed = self.ticks_elapsed as f64 * f64::from(self.config.tick);
        let next = (self.decisions + 1) as f64 * f64::from(self.config.decision_interval);
        elapsed + DECISION_TOLERANCE >= next
    }

    /// Simulates up to `ticks` further ticks, stopping at the horizon.
    pub fn advance(&mut self, strategy: &dyn DefenceStrategy, ticks: u64) {
        let mut events = Vec::new();
        for _ in 0..ticks {
            if self.is_finished() {
                break;
            }
            events.clear();
            self.step(strategy, &mut events);
        }
    }

    /// Runs to the horizon and returns the result record.
    pub fn run(mut self, strategy: &dyn DefenceStrategy) -> DefenceRunResult {
        let remaining = self.total_ticks.saturating_sub(self.ticks_elapsed);
        self.advance(strategy, remaining);
        let result = self.result(strategy.name());
        info!(
            strategy = %result.strategy,
            seed = result.seed,
            kills = result.kills,
            freezes = result.freezes,
            hash_earned = result.hash_earned,
            "defence run complete"
        );
        result
    }

    /// Summarises the run so far.
    #[must_use]
    pub fn result(&self, strategy: &str) -> DefenceRunResult {
        let world = &self.world;
        let stats = query::stats(world);
        DefenceRunResult {
            strategy: strategy.to_owned(),
            seed: self.config.seed,
            scenario: self.config.scenario,
            elapsed: query::clock(world),
            kills: stats.kills,
            hostiles_spawned: stats.hostiles_spawned,
            leaks: stats.leaks,
            hash_earned: stats.hash_earned,
            final_hash: query::hash(world),
            freezes: stats.freezes,
            first_freeze_at: stats.first_freeze_at,
            final_efficiency: query::efficiency(world),
            towers: query::tower_view(world).len(),
            towers_built: stats.towers_built,
            peak_tower_level: stats.peak_tower_level,
            average_tower_level: query::average_tower_level(world),
            threat_level: query::threat_level(world),
            damage_dealt: stats.damage_dealt,
            zero_days_defeated: stats.zero_days_defeated,
            encounters_engaged: stats.encounters_engaged,
            decisions: self.decisions,
            rejected_actions: self.rejected_actions,
        }
    }

    fn run_stages(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let mut tick_events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut tick_events);

        let mut commands = Vec::new();
        self.spawning.handle(
            &tick_events,
            query::threat_level(&self.world),
            query::progression(&self.world),
            query::hostile_count(&self.world, HostileKind::ZeroDay) > 0,
            query::balance(&self.world),
            &mut commands,
        );
        self.apply_all(&mut commands, &mut tick_events);

        world::apply(
            &mut self.world,
            Command::TickPassives { dt },
            &mut tick_events,
        );

        let hostiles = query::hostile_view(&self.world);
        self.movement.handle(&tick_events, &hostiles, &mut commands);
        self.apply_all(&mut commands, &mut tick_events);

        let towers = query::tower_view(&self.world);
        let hostiles = query::hostile_view(&self.world);
        self.targeting.handle(&towers, &hostiles, &mut self.targets);
        self.combat.handle(&towers, &self.targets, &mut commands);
        self.apply_all(&mut commands, &mut tick_events);

        for command in [
            Command::ResolveObjective,
            Command::AdvanceProjectiles { dt },
            Command::ResolveCollisions,
            Command::TickStatusEffects { dt },
            Command::Cleanup,
            Command::TickEconomy { dt },
        ] {
            world::apply(&mut self.world, command, &mut tick_events);
        }

        out_events.append(&mut tick_events);
    }

    fn apply_all(&mut self, commands: &mut Vec<Command>, out_events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, out_events);
        }
    }

    fn decide(&mut self, strategy: &dyn DefenceStrategy, out_events: &mut Vec<Event>) {
        self.decisions += 1;
        let action = strategy.decide(&self.world, query::progression(&self.world));
        let Some(command) = action.into_command() else {
            return;
        };
        trace!(?command, "applying bot action");

        let start = out_events.len();
        world::apply(&mut self.world, command, out_events);
        let rejected = out_events[start..]
            .iter()
            .filter(|event| matches!(event, Event::ActionRejected { .. }))
            .count();
        self.rejected_actions += rejected as u64;
    }
}
