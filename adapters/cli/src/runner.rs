//! Parallel batch execution over independent seeds.

use anyhow::{anyhow, Result};
use kernel_defence_bots::{defence_strategy, encounter_strategy};
use kernel_defence_core::SimulationContext;
use kernel_defence_defence_loop::{DefenceConfig, DefenceRunResult, DefenceSimulator};
use kernel_defence_encounter::{EncounterConfig, EncounterResult, EncounterSimulator};
use rayon::prelude::*;
use tracing::debug;

/// One defence run to execute.
#[derive(Clone, Debug)]
pub(crate) struct DefenceJob {
    pub(crate) strategy: String,
    pub(crate) config: DefenceConfig,
}

/// One encounter run to execute.
#[derive(Clone, Debug)]
pub(crate) struct EncounterJob {
    pub(crate) strategy: String,
    pub(crate) config: EncounterConfig,
}

/// Runs every job, in parallel when `parallel` is set. Results keep job order.
pub(crate) fn run_defence(
    context: &SimulationContext,
    jobs: &[DefenceJob],
    parallel: bool,
) -> Result<Vec<DefenceRunResult>> {
    let run_one = |job: &DefenceJob| -> Result<DefenceRunResult> {
        let strategy = defence_strategy(&job.strategy)
            .ok_or_else(|| anyhow!("unknown defence strategy '{}'", job.strategy))?;
        debug!(strategy = %job.strategy, seed = job.config.seed, "starting defence run");
        let simulator = DefenceSimulator::new(context.clone(), job.config.clone())?;
        Ok(simulator.run(strategy.as_ref()))
    };

    if parallel {
        jobs.par_iter().map(run_one).collect()
    } else {
        jobs.iter().map(run_one).collect()
    }
}

/// Runs every job, in parallel when `parallel` is set. Results keep job order.
pub(crate) fn run_encounters(
    context: &SimulationContext,
    jobs: &[EncounterJob],
    parallel: bool,
) -> Result<Vec<EncounterResult>> {
    let run_one = |job: &EncounterJob| -> Result<EncounterResult> {
        let strategy = encounter_strategy(&job.strategy)
            .ok_or_else(|| anyhow!("unknown encounter strategy '{}'", job.strategy))?;
        debug!(
            strategy = %job.strategy,
            seed = job.config.seed,
            boss = %job.config.archetype,
            "starting encounter run"
        );
        let simulator = EncounterSimulator::new(context, job.config.clone())?;
        Ok(simulator.run(strategy.as_ref()))
    };

    if parallel {
        jobs.par_iter().map(run_one).collect()
    } else {
        jobs.iter().map(run_one).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_defence_core::{BossArchetype, Difficulty, Progression, Scenario, WeaponKind};

    #[test]
    fn parallel_and_sequential_batches_agree() {
        let context = SimulationContext::builtin();
        let progression = Progression::with_compiled(&[WeaponKind::BurstProtocol]);
        let jobs: Vec<DefenceJob> = (0..4)
            .map(|seed| DefenceJob {
                strategy: "greedy".to_owned(),
                config: DefenceConfig::new(seed, Scenario::Onslaught, progression.clone())
                    .with_max_time(60.0),
            })
            .collect();

        let parallel = run_defence(&context, &jobs, true).expect("parallel batch");
        let sequential = run_defence(&context, &jobs, false).expect("sequential batch");
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.iter().map(|run| run.seed).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn unknown_strategies_fail_the_batch() {
        let jobs = [EncounterJob {
            strategy: "berserk".to_owned(),
            config: EncounterConfig::new(
                1,
                BossArchetype::Cyberboss,
                Difficulty::Easy,
                Progression::fresh(),
            ),
        }];
        let error = run_encounters(&SimulationContext::builtin(), &jobs, false)
            .expect_err("unknown strategy");
        assert!(error.to_string().contains("berserk"));
    }
}
