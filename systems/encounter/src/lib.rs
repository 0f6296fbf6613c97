#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Boss encounter simulator: one avatar against one of four boss archetypes.
//!
//! Each [`EncounterSimulator::step`] runs a fixed sequence: clock and phase
//! bookkeeping, phase transitions, the archetype update, the bot decision when
//! one is due, avatar movement, hazard advance, the avatar's attack, weapon
//! on-hit damage and finally hazard collisions. The run ends on victory or at
//! the horizon; avatar deaths only cost health and time.

mod archetype;
mod checkpoint;
mod collision;
mod hazards;
mod state;
mod weapon;

use std::collections::BTreeMap;

use kernel_defence_core::{
    geometry::Vec2, BossArchetype, ConfigError, Difficulty, EncounterAction, Progression,
    SimulationContext,
};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

pub use checkpoint::EncounterCheckpoint;
pub use hazards::HazardKind;
pub use state::{Danger, EncounterState};
pub use weapon::EquippedWeapon;

use state::{LEASH_RADIUS, SPAWN_MARGIN};

/// Slack absorbing float error when comparing elapsed time to the cadence.
const DECISION_TOLERANCE: f64 = 1e-6;

/// Decision-making agent for the encounter loop.
pub trait EncounterStrategy: Send + Sync {
    /// Name used in reports and the strategy registry.
    fn name(&self) -> &str;

    /// Chooses how the avatar moves until the next decision.
    fn decide(&self, state: &EncounterState, progression: &Progression) -> EncounterAction;
}

/// Parameters of one encounter run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    /// Seed the run's random draws derive from.
    pub seed: u64,
    /// Boss to fight.
    pub archetype: BossArchetype,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Fixed physics step in seconds.
    pub tick: f32,
    /// Run horizon in seconds.
    pub max_time: f32,
    /// Seconds between bot decisions.
    pub decision_interval: f32,
    /// Weapon carried by the avatar, if any.
    pub weapon: Option<EquippedWeapon>,
    /// Arena width and height.
    pub arena: Vec2,
    /// Player state handed to the strategy.
    pub progression: Progression,
}

impl EncounterConfig {
    /// Default physics step.
    pub const DEFAULT_TICK: f32 = 0.05;
    /// Default run horizon.
    pub const DEFAULT_MAX_TIME: f32 = 300.0;
    /// Default decision cadence.
    pub const DEFAULT_DECISION_INTERVAL: f32 = 0.25;
    /// Default arena size.
    pub const DEFAULT_ARENA: Vec2 = Vec2::new(1_200.0, 1_200.0);

    /// Creates an unarmed configuration with the default timings and arena.
    #[must_use]
    pub fn new(
        seed: u64,
        archetype: BossArchetype,
        difficulty: Difficulty,
        progression: Progression,
    ) -> Self {
        Self {
            seed,
            archetype,
            difficulty,
            tick: Self::DEFAULT_TICK,
            max_time: Self::DEFAULT_MAX_TIME,
            decision_interval: Self::DEFAULT_DECISION_INTERVAL,
            weapon: None,
            arena: Self::DEFAULT_ARENA,
            progression,
        }
    }

    /// Equips the avatar.
    #[must_use]
    pub fn with_weapon(mut self, weapon: EquippedWeapon) -> Self {
        self.weapon = Some(weapon);
        self
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

    /// Overrides the arena size.
    #[must_use]
    pub fn with_arena(mut self, arena: Vec2) -> Self {
        self.arena = arena;
        self
    }

    /// Smallest arena side that fits the boss leash and the avatar spawn.
    #[must_use]
    pub fn min_arena_side() -> f32 {
        2.0 * (LEASH_RADIUS + SPAWN_MARGIN)
    }

    /// Validates the timings and the arena.
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
        let side = Self::min_arena_side();
        if !self.arena.is_finite() || self.arena.x < side || self.arena.y < side {
            return Err(ConfigError::ArenaTooSmall {
                width: self.arena.x,
                height: self.arena.y,
            });
        }
        Ok(())
    }

    /// Number of physics ticks the run lasts at most.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        (f64::from(self.max_time) / f64::from(self.tick)).ceil() as u64
    }
}

/// Summary record of an encounter run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterResult {
    /// Strategy that drove the avatar.
    pub strategy: String,
    /// Boss fought.
    pub archetype: BossArchetype,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Seed of the run.
    pub seed: u64,
    /// Whether the boss was defeated.
    pub victory: bool,
    /// Simulated seconds.
    pub elapsed: f64,
    /// Highest phase reached.
    pub phase_reached: u8,
    /// Seconds spent in each phase.
    pub phase_durations: [f64; 4],
    /// Hits taken per hazard kind.
    pub hazard_hits: BTreeMap<HazardKind, u32>,
    /// Damage dealt to every target.
    pub damage_dealt: f64,
    /// Damage dealt to the boss.
    pub boss_damage: f64,
    /// Damage dealt per simulated second.
    pub dps: f64,
    /// Times the avatar went down.
    pub deaths: u32,
    /// Damage the avatar took.
    pub damage_taken: f64,
    /// Boss health fraction when the run ended.
    pub boss_health_fraction: f32,
    /// Bot decisions polled.
    pub decisions: u64,
}

/// Drives one encounter run.
#[derive(Debug)]
pub struct EncounterSimulator {
    config: EncounterConfig,
    state: EncounterState,
    ticks_elapsed: u64,
    total_ticks: u64,
    decisions: u64,
}

impl EncounterSimulator {
    /// Builds a simulator for `config` using the boss tuning in `context`.
    pub fn new(context: &SimulationContext, config: EncounterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        context.balance().validate()?;
        let state = EncounterState::new(&config, &context.balance().bosses);
        Ok(Self::assemble(config, state))
    }

    fn assemble(config: EncounterConfig, state: EncounterState) -> Self {
        Self {
            total_ticks: config.total_ticks(),
            config,
            state,
            ticks_elapsed: 0,
            decisions: 0,
        }
    }

    /// Read access to the encounter state.
    #[must_use]
    pub fn state(&self) -> &EncounterState {
        &self.state
    }

    /// Configuration the run was built from.
    #[must_use]
    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    /// Ticks simulated so far.
    #[must_use]
    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks_elapsed
    }

    /// Reports whether the boss is down or the horizon has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.is_victory() || self.ticks_elapsed >= self.total_ticks
    }

    /// Simulates one tick, polling the strategy mid-tick when a decision is due.
    pub fn step(&mut self, strategy: &dyn EncounterStrategy) {
        if self.is_finished() {
            return;
        }
        let dt = self.config.tick;
        let phase_before = self.state.phase();
        self.state.begin_tick(dt);

        if self.decision_due() {
            self.decisions += 1;
            let action = strategy.decide(&self.state, &self.config.progression);
            if action != self.state.action {
                trace!(?action, at = self.state.clock, "avatar action changed");
            }
            self.state.action = action;
        }

        self.state.finish_tick(dt);
        self.ticks_elapsed += 1;
        debug_assert!(self.state.phase() >= phase_before);
    }

    fn decision_due(&self) -> bool {
        let elapsed = self.ticks_elapsed as f64 * f64::from(self.config.tick);
        let next = self.decisions as f64 * f64::from(self.config.decision_interval);
        elapsed + DECISION_TOLERANCE >= next
    }

    /// Simulates up to `ticks` further ticks, stopping early once finished.
    pub fn advance(&mut self, strategy: &dyn EncounterStrategy, ticks: u64) {
        for _ in 0..ticks {
            if self.is_finished() {
                break;
            }
            self.step(strategy);
        }
    }

    /// Runs to victory or the horizon and returns the result record.
    pub fn run(mut self, strategy: &dyn EncounterStrategy) -> EncounterResult {
        let remaining = self.total_ticks.saturating_sub(self.ticks_elapsed);
        self.advance(strategy, remaining);
        let result = self.result(strategy.name());
        info!(
            strategy = %result.strategy,
            archetype = result.archetype.name(),
            seed = result.seed,
            victory = result.victory,
            phase = result.phase_reached,
            deaths = result.deaths,
            dps = result.dps,
            "encounter run complete"
        );
        result
    }

    /// Summarises the run so far.
    #[must_use]
    pub fn result(&self, strategy: &str) -> EncounterResult {
        let state = &self.state;
        let ledger = &state.ledger;
        let elapsed = state.clock();
        EncounterResult {
            strategy: strategy.to_owned(),
            archetype: self.config.archetype,
            difficulty: self.config.difficulty,
            seed: self.config.seed,
            victory: state.is_victory(),
            elapsed,
            phase_reached: state.phase(),
            phase_durations: ledger.phase_durations,
            hazard_hits: ledger.hazard_hits.clone(),
            damage_dealt: ledger.damage_dealt,
            boss_damage: ledger.boss_damage,
            dps: if elapsed > 0.0 {
                ledger.damage_dealt / elapsed
            } else {
                0.0
            },
            deaths: ledger.deaths,
            damage_taken: ledger.damage_taken,
            boss_health_fraction: state.boss_health_fraction(),
            decisions: self.decisions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EncounterConfig {
        EncounterConfig::new(1, BossArchetype::Cyberboss, Difficulty::Normal, Progression::fresh())
    }

    #[test]
    fn validation_rejects_bad_timings_and_arenas() {
        assert_eq!(
            config().with_timing(0.0, 0.25).validate(),
            Err(ConfigError::NonPositiveTick { tick: 0.0 })
        );
        assert_eq!(
            config().with_timing(0.1, 0.05).validate(),
            Err(ConfigError::DecisionIntervalTooShort {
                interval: 0.05,
                tick: 0.1
            })
        );
        assert_eq!(
            config().with_arena(Vec2::new(1_200.0, 700.0)).validate(),
            Err(ConfigError::ArenaTooSmall {
                width: 1_200.0,
                height: 700.0
            })
        );
        assert!(config().with_arena(Vec2::splat(800.0)).validate().is_ok());
        assert!(config().validate().is_ok());
    }

    #[test]
    fn total_ticks_cover_the_horizon() {
        assert_eq!(config().total_ticks(), 6_000);
        assert_eq!(config().with_max_time(0.12).total_ticks(), 3);
    }
}
