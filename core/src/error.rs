//! Construction-time validation errors.

use thiserror::Error;

use crate::BossArchetype;

/// Reasons a simulation cannot be constructed from its configuration.
///
/// These are the only hard failures the engine reports; once a run is built,
/// nothing inside the tick loop can fail.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The tick size must be a positive, finite number of seconds.
    #[error("tick size must be positive and finite, got {tick}")]
    NonPositiveTick {
        /// Rejected tick size.
        tick: f32,
    },
    /// The run horizon must be positive and finite.
    #[error("max time must be positive and finite, got {max_time}")]
    NonPositiveDuration {
        /// Rejected horizon.
        max_time: f32,
    },
    /// Decisions cannot be polled more often than the physics tick.
    #[error("decision interval {interval} is shorter than the tick size {tick}")]
    DecisionIntervalTooShort {
        /// Rejected decision interval.
        interval: f32,
        /// Configured tick size.
        tick: f32,
    },
    /// The lane layout produced no placement slots.
    #[error("layout produced no placement slots")]
    NoSlots,
    /// The lane has fewer than two distinct waypoints.
    #[error("lane path needs at least two distinct waypoints")]
    DegenerateLane,
    /// The encounter arena cannot fit the avatar and boss leash.
    #[error("arena {width}x{height} is too small for the encounter layout")]
    ArenaTooSmall {
        /// Arena width.
        width: f32,
        /// Arena height.
        height: f32,
    },    /// The leak counter needs a positive, finite ceiling.
    #[error("max leak must be positive and finite, got {max_leak}")]
    NonPositiveMaxLeak {
        /// Rejected ceiling.
        max_leak: f32,
    },
    /// Leak decay must happen at a positive, finite interval.
    #[error("leak decay interval must be positive and finite, got {interval}")]
    NonPositiveLeakDecay {
        /// Rejected interval.
        interval: f32,
    },
    /// A freeze must leave the leak counter strictly below its ceiling, or
    /// efficiency never leaves zero.
    #[error("freeze recovery leak {recovery} must lie in [0, {max_leak})")]
    FreezeRecoveryOutOfRange {
        /// Rejected recovery value.
        recovery: f32,
        /// Configured ceiling.
        max_leak: f32,
    },
    /// Every boss needs positive, finite health.
    #[error("{archetype} base health must be positive and finite, got {health}")]
    NonPositiveBossHealth {
        /// Offending archetype.
        archetype: BossArchetype,
        /// Rejected health.
        health: f32,
    },
    /// Phase thresholds must descend strictly inside (0, 1).
    #[error("{archetype} phase thresholds {thresholds:?} must descend strictly inside (0, 1)")]
    InvalidPhaseThresholds {
        /// Offending archetype.
        archetype: BossArchetype,
        /// Rejected phase 2, 3 and 4 thresholds.
        thresholds: [f32; 3],
    },
}
