#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting hostile spawn commands.

use kernel_defence_core::{
    BalanceConfig, Command, Event, HostileKind, Progression, Scenario, SimRng,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const LANE_KINDS: [HostileKind; 3] = [HostileKind::Packet, HostileKind::Worm, HostileKind::Trojan];

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
    scenario: Scenario,
}

impl Config {
    /// Creates a new configuration using the provided seed and scenario.
    #[must_use]
    pub const fn new(rng_seed: u64, scenario: Scenario) -> Self {
        Self { rng_seed, scenario }
    }
}

/// Pure system that emits at most one spawn command per tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spawning {
    accumulator: f32,
    interval_multiplier: f32,
    rng: SimRng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            accumulator: 0.0,
            interval_multiplier: config.scenario.spawn_interval_multiplier(),
            rng: SimRng::new(config.rng_seed),
        }
    }

    /// Seconds between spawns at `threat_level`.
    #[must_use]
    pub fn interval(&self, threat_level: u32, balance: &BalanceConfig) -> f32 {
        let tuning = &balance.threat_level;
        let stepped =
            tuning.base_spawn_interval - tuning.spawn_interval_step * threat_level as f32;
        stepped.max(tuning.min_spawn_interval) * self.interval_multiplier
    }

    /// Consumes time events and emits zero or one spawn command.
    ///
    /// Lane hostiles are drawn uniformly from the kinds whose sector is
    /// unlocked. Once the threat level reaches the Zero-Day gate, every spawn
    /// opportunity rolls for the elite while none is alive.
    pub fn handle(
        &mut self,
        events: &[Event],
        threat_level: u32,
        progression: &Progression,
        zero_day_alive: bool,
        balance: &BalanceConfig,
        out: &mut Vec<Command>,
    ) {
        let accumulated: f32 = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .sum();
        if accumulated <= 0.0 {
            return;
        }

        let interval = self.interval(threat_level, balance);
        if interval <= 0.0 {
            return;
        }

        self.accumulator += accumulated;
        if self.accumulator < interval {
            return;
        }
        self.accumulator = (self.accumulator - interval).min(interval);

        let candidates: Vec<HostileKind> = LANE_KINDS
            .into_iter()
            .filter(|kind| {
                kind.unlocked_by()
                    .map_or(false, |sector| progression.is_unlocked(sector))
            })
            .collect();
        if candidates.is_empty() {
            return;
        }

        let elite = &balance.zero_day;
        if threat_level >= elite.min_waves_before_spawn
            && !zero_day_alive
            && self.rng.next_bool(elite.spawn_chance)
        {
            debug!(threat_level, "zero-day spawn rolled");
            out.push(Command::SpawnHostile {
                kind: HostileKind::ZeroDay,
            });
            return;
        }

        let kind = candidates[self.rng.next_index(candidates.len())];
        out.push(Command::SpawnHostile { kind });
    }
}
