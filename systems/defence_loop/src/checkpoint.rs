//! Mid-run capture of a defence simulation.

use kernel_defence_core::{ConfigError, SimulationContext};
use kernel_defence_system_spawning::Spawning;
use kernel_defence_world::{World, WorldSnapshot};
use serde::{Deserialize, Serialize};

use crate::{DefenceConfig, DefenceSimulator};

/// Everything required to resume a defence run at a tick boundary.
///
/// The content library and balance table are not captured; resume with the
/// same [`SimulationContext`] the run was created with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefenceCheckpoint {
    config: DefenceConfig,
    world: WorldSnapshot,
    spawning: Spawning,
    ticks_elapsed: u64,
    decisions: u64,
    rejected_actions: u64,
}

impl DefenceCheckpoint {
    /// Configuration of the captured run.
    #[must_use]
    pub fn config(&self) -> &DefenceConfig {
        &self.config
    }

    /// Ticks simulated before the capture.
    #[must_use]
    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks_elapsed
    }
}

impl DefenceSimulator {
    /// Captures the run between two ticks.
    #[must_use]
    pub fn checkpoint(&self) -> DefenceCheckpoint {
        DefenceCheckpoint {
            config: self.config.clone(),
            world: self.world.snapshot(),
            spawning: self.spawning.clone(),
            ticks_elapsed: self.ticks_elapsed,
            decisions: self.decisions,
            rejected_actions: self.rejected_actions,
        }
    }

    /// Rebuilds a simulator from a checkpoint.
    pub fn resume(
        context: SimulationContext,
        checkpoint: DefenceCheckpoint,
    ) -> Result<Self, ConfigError> {
        checkpoint.config.validate()?;
        context.balance().validate()?;
        let world = World::restore(checkpoint.world, context);
        let mut simulator = Self::assemble(checkpoint.config, world, checkpoint.spawning);
        simulator.ticks_elapsed = checkpoint.ticks_elapsed;
        simulator.decisions = checkpoint.decisions;
        simulator.rejected_actions = checkpoint.rejected_actions;
        Ok(simulator)
    }
}
