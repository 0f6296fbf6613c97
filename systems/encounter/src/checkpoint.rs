//! Mid-run capture of an encounter.

use kernel_defence_core::ConfigError;
use serde::{Deserialize, Serialize};

use crate::{EncounterConfig, EncounterSimulator, EncounterState};

/// Everything required to resume an encounter at a tick boundary.
///
/// Boss and avatar tuning are baked into the captured state, so resuming
/// needs no simulation context.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncounterCheckpoint {
    config: EncounterConfig,
    state: EncounterState,
    ticks_elapsed: u64,
    decisions: u64,
}

impl EncounterCheckpoint {
    /// Configuration of the captured run.
    #[must_use]
    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    /// Ticks simulated before the capture.
    #[must_use]
    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks_elapsed
    }
}

impl EncounterSimulator {
    /// Captures the run between two ticks.
    #[must_use]
    pub fn checkpoint(&self) -> EncounterCheckpoint {
        EncounterCheckpoint {
            config: self.config.clone(),
            state: self.state.clone(),
            ticks_elapsed: self.ticks_elapsed,
            decisions: self.decisions,
        }
    }

    /// Rebuilds a simulator from a checkpoint.
    pub fn resume(checkpoint: EncounterCheckpoint) -> Result<Self, ConfigError> {
        checkpoint.config.validate()?;
        let mut simulator = Self::assemble(checkpoint.config, checkpoint.state);
        simulator.ticks_elapsed = checkpoint.ticks_elapsed;
        simulator.decisions = checkpoint.decisions;
        Ok(simulator)
    }
}
