#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line batch harness for the Kernel Defence balance simulator.
//!
//! Runs many seeds of either loop with the built-in bots, prints comparison
//! tables (or JSON), exports the balance table and moves mid-run checkpoints
//! around as single-line strings.

mod balance_file;
mod checkpoint_transfer;
mod runner;

use std::{fs, path::PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use kernel_defence_analytics::{defence_table, encounter_table, DefenceBatch, EncounterBatch};
use kernel_defence_bots::{
    defence_strategy, encounter_strategy, DEFENCE_STRATEGIES, ENCOUNTER_STRATEGIES,
};
use kernel_defence_core::{
    BossArchetype, Difficulty, Progression, Scenario, SimulationContext, WeaponKind,
};
use kernel_defence_defence_loop::{DefenceConfig, DefenceSimulator};
use kernel_defence_encounter::{EncounterConfig, EncounterSimulator, EquippedWeapon};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use checkpoint_transfer::{RunCheckpoint, SavedRun};
use runner::{DefenceJob, EncounterJob};

/// Headless balance simulator for Kernel Defence.
#[derive(Debug, Parser)]
#[command(name = "kernel-defence-sim", version)]
struct Cli {
    /// Log run progress to stderr. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// TOML file overriding balance constants.
    #[arg(long, global = true, value_name = "PATH")]
    balance: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run defence batches and compare strategies.
    Defence(DefenceArgs),
    /// Run boss encounter batches and compare strategies.
    Encounter(EncounterArgs),
    /// Run every built-in strategy of both loops.
    Compare(CompareArgs),
    /// Print the effective balance table as JSON.
    ExportBalance {
        /// Write to this file instead of stdout.
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Run a single simulation part-way and print a checkpoint string.
    Checkpoint {
        #[command(subcommand)]
        target: CheckpointTarget,
    },
    /// Finish a run from a checkpoint string and print its result.
    Resume {
        /// `kdsim:v1:...` string produced by `checkpoint`.
        transfer: String,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Runs per strategy and setting.
    #[arg(long, default_value_t = 20)]
    seeds: u64,
    /// First seed of the batch.
    #[arg(long, default_value_t = 0)]
    first_seed: u64,
    /// Run horizon in seconds.
    #[arg(long)]
    max_time: Option<f32>,
    /// Run on one thread.
    #[arg(long)]
    sequential: bool,
    /// Print batch summaries as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

impl BatchArgs {
    fn seeds(&self) -> impl Iterator<Item = u64> + Clone {
        self.first_seed..self.first_seed.saturating_add(self.seeds)
    }
}

#[derive(Debug, Args)]
struct ProfileArgs {
    /// Weapon compiled in the player profile, by id (repeatable).
    #[arg(long = "compile", value_name = "WEAPON", value_parser = parse_weapon)]
    compiled: Vec<WeaponKind>,
    /// Compile every weapon.
    #[arg(long, conflicts_with = "compiled")]
    all_weapons: bool,
    /// Hash balance at the start of each run.
    #[arg(long)]
    starting_hash: Option<f64>,
}

impl ProfileArgs {
    fn progression(&self) -> Progression {
        let kinds: &[WeaponKind] = if self.all_weapons {
            &WeaponKind::ALL
        } else {
            &self.compiled
        };
        let mut progression = Progression::with_compiled(kinds);
        if let Some(hash) = self.starting_hash {
            progression.starting_hash = hash;
        }
        progression
    }
}

#[derive(Debug, Args)]
struct DefenceArgs {
    /// Strategy to run (repeatable); every built-in when omitted.
    #[arg(long = "strategy", value_parser = parse_defence_strategy)]
    strategies: Vec<String>,
    /// Scenario to run (repeatable); `standard` when omitted.
    #[arg(long = "scenario", value_parser = parse_scenario)]
    scenarios: Vec<Scenario>,
    #[command(flatten)]
    profile: ProfileArgs,
    #[command(flatten)]
    batch: BatchArgs,
}

#[derive(Debug, Args)]
struct WeaponArgs {
    /// Weapon equipped for the encounter, by id.
    #[arg(long, value_parser = parse_weapon)]
    weapon: Option<WeaponKind>,
    /// Protocol level of the equipped weapon.
    #[arg(long, default_value_t = 1, requires = "weapon")]
    level: u32,
}

impl WeaponArgs {
    fn equipped(&self) -> Option<EquippedWeapon> {
        self.weapon.map(|kind| EquippedWeapon::new(kind, self.level))
    }
}

#[derive(Debug, Args)]
struct EncounterArgs {
    /// Strategy to run (repeatable); every built-in when omitted.
    #[arg(long = "strategy", value_parser = parse_encounter_strategy)]
    strategies: Vec<String>,
    /// Boss to fight (repeatable); every archetype when omitted.
    #[arg(long = "boss", value_parser = parse_archetype)]
    bosses: Vec<BossArchetype>,
    /// Difficulty tier (repeatable); `normal` when omitted.
    #[arg(long = "difficulty", value_parser = parse_difficulty)]
    difficulties: Vec<Difficulty>,
    #[command(flatten)]
    weapon: WeaponArgs,
    #[command(flatten)]
    batch: BatchArgs,
}

#[derive(Debug, Args)]
struct CompareArgs {
    /// Difficulty tier of the encounter batches.
    #[arg(long, default_value = "normal", value_parser = parse_difficulty)]
    difficulty: Difficulty,
    #[command(flatten)]
    weapon: WeaponArgs,
    #[command(flatten)]
    profile: ProfileArgs,
    #[command(flatten)]
    batch: BatchArgs,
}

#[derive(Debug, Subcommand)]
enum CheckpointTarget {
    /// Checkpoint a defence run.
    Defence {
        #[arg(long, value_parser = parse_defence_strategy)]
        strategy: String,
        #[arg(long, default_value = "standard", value_parser = parse_scenario)]
        scenario: Scenario,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Simulated seconds to run before checkpointing.
        #[arg(long)]
        at: f32,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Checkpoint an encounter run.
    Encounter {
        #[arg(long, value_parser = parse_encounter_strategy)]
        strategy: String,
        #[arg(long, value_parser = parse_archetype)]
        boss: BossArchetype,
        #[arg(long, default_value = "normal", value_parser = parse_difficulty)]
        difficulty: Difficulty,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Simulated seconds to run before checkpointing.
        #[arg(long)]
        at: f32,
        #[command(flatten)]
        weapon: WeaponArgs,
    },
}

fn parse_defence_strategy(name: &str) -> Result<String, String> {
    DEFENCE_STRATEGIES
        .iter()
        .any(|candidate| *candidate == name)
        .then(|| name.to_owned())
        .ok_or_else(|| format!("expected one of: {}", DEFENCE_STRATEGIES.join(", ")))
}

fn parse_encounter_strategy(name: &str) -> Result<String, String> {
    ENCOUNTER_STRATEGIES
        .iter()
        .any(|candidate| *candidate == name)
        .then(|| name.to_owned())
        .ok_or_else(|| format!("expected one of: {}", ENCOUNTER_STRATEGIES.join(", ")))
}

fn parse_scenario(name: &str) -> Result<Scenario, String> {
    Scenario::ALL
        .into_iter()
        .find(|scenario| scenario.name() == name)
        .ok_or_else(|| "expected standard, onslaught or drought".to_owned())
}

fn parse_archetype(name: &str) -> Result<BossArchetype, String> {
    BossArchetype::ALL
        .into_iter()
        .find(|archetype| archetype.name() == name)
        .ok_or_else(|| {
            let names: Vec<_> = BossArchetype::ALL.iter().map(|archetype| archetype.name()).collect();
            format!("expected one of: {}", names.join(", "))
        })
}

fn parse_difficulty(name: &str) -> Result<Difficulty, String> {
    Difficulty::ALL
        .into_iter()
        .find(|difficulty| difficulty.name() == name)
        .ok_or_else(|| "expected easy, normal, hard or nightmare".to_owned())
}

fn parse_weapon(id: &str) -> Result<WeaponKind, String> {
    WeaponKind::from_id(id).ok_or_else(|| {
        let ids: Vec<_> = WeaponKind::ALL.iter().map(|kind| kind.id().to_string()).collect();
        format!("expected one of: {}", ids.join(", "))
    })
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_context(balance: Option<&PathBuf>) -> Result<SimulationContext> {
    let builtin = SimulationContext::builtin();
    match balance {
        Some(path) => Ok(builtin.with_balance(balance_file::load(path)?)),
        None => Ok(builtin),
    }
}

fn names_or_all(selected: &[String], all: &[&str]) -> Vec<String> {
    if selected.is_empty() {
        all.iter().map(|name| (*name).to_owned()).collect()
    } else {
        selected.to_vec()
    }
}

fn defence_jobs(
    strategies: &[String],
    scenarios: &[Scenario],
    progression: &Progression,
    batch: &BatchArgs,
) -> Vec<DefenceJob> {
    let mut jobs = Vec::new();
    for strategy in strategies {
        for &scenario in scenarios {
            for seed in batch.seeds() {
                let mut config = DefenceConfig::new(seed, scenario, progression.clone());
                if let Some(max_time) = batch.max_time {
                    config = config.with_max_time(max_time);
                }
                jobs.push(DefenceJob {
                    strategy: strategy.clone(),
                    config,
                });
            }
        }
    }
    jobs
}

fn encounter_jobs(
    strategies: &[String],
    bosses: &[BossArchetype],
    difficulties: &[Difficulty],
    weapon: Option<EquippedWeapon>,
    batch: &BatchArgs,
) -> Vec<EncounterJob> {
    let mut jobs = Vec::new();
    for strategy in strategies {
        for &archetype in bosses {
            for &difficulty in difficulties {
                for seed in batch.seeds() {
                    let mut config =
                        EncounterConfig::new(seed, archetype, difficulty, Progression::fresh());
                    if let Some(weapon) = weapon {
                        config = config.with_weapon(weapon);
                    }
                    if let Some(max_time) = batch.max_time {
                        config = config.with_max_time(max_time);
                    }
                    jobs.push(EncounterJob {
                        strategy: strategy.clone(),
                        config,
                    });
                }
            }
        }
    }
    jobs
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("failed to serialise output")?);
    Ok(())
}

fn run_defence(context: &SimulationContext, args: &DefenceArgs) -> Result<Vec<DefenceBatch>> {
    let strategies = names_or_all(&args.strategies, &DEFENCE_STRATEGIES);
    let scenarios = if args.scenarios.is_empty() {
        vec![Scenario::Standard]
    } else {
        args.scenarios.clone()
    };
    let jobs = defence_jobs(&strategies, &scenarios, &args.profile.progression(), &args.batch);
    info!(runs = jobs.len(), "running defence batch");
    let results = runner::run_defence(context, &jobs, !args.batch.sequential)?;
    Ok(DefenceBatch::group(&results))
}

fn run_encounters(
    context: &SimulationContext,
    args: &EncounterArgs,
) -> Result<Vec<EncounterBatch>> {
    let strategies = names_or_all(&args.strategies, &ENCOUNTER_STRATEGIES);
    let bosses = if args.bosses.is_empty() {
        BossArchetype::ALL.to_vec()
    } else {
        args.bosses.clone()
    };
    let difficulties = if args.difficulties.is_empty() {
        vec![Difficulty::Normal]
    } else {
        args.difficulties.clone()
    };
    let jobs = encounter_jobs(
        &strategies,
        &bosses,
        &difficulties,
        args.weapon.equipped(),
        &args.batch,
    );
    info!(runs = jobs.len(), "running encounter batch");
    let results = runner::run_encounters(context, &jobs, !args.batch.sequential)?;
    Ok(EncounterBatch::group(&results))
}

#[derive(Serialize)]
struct Comparison {
    defence: Vec<DefenceBatch>,
    encounter: Vec<EncounterBatch>,
}

fn compare(context: &SimulationContext, args: &CompareArgs) -> Result<Comparison> {
    let strategies = names_or_all(&[], &DEFENCE_STRATEGIES);
    let jobs = defence_jobs(
        &strategies,
        &Scenario::ALL,
        &args.profile.progression(),
        &args.batch,
    );
    info!(runs = jobs.len(), "running defence comparison");
    let defence = DefenceBatch::group(&runner::run_defence(context, &jobs, !args.batch.sequential)?);

    let strategies = names_or_all(&[], &ENCOUNTER_STRATEGIES);
    let jobs = encounter_jobs(
        &strategies,
        &BossArchetype::ALL,
        &[args.difficulty],
        args.weapon.equipped(),
        &args.batch,
    );
    info!(runs = jobs.len(), "running encounter comparison");
    let encounter =
        EncounterBatch::group(&runner::run_encounters(context, &jobs, !args.batch.sequential)?);

    Ok(Comparison { defence, encounter })
}

fn ticks_for(seconds: f32, tick: f32) -> Result<u64> {
    if !(seconds.is_finite() && seconds >= 0.0) {
        bail!("checkpoint time must be a non-negative number of seconds, got {seconds}");
    }
    Ok((f64::from(seconds) / f64::from(tick)).round() as u64)
}

fn checkpoint(context: &SimulationContext, target: CheckpointTarget) -> Result<SavedRun> {
    match target {
        CheckpointTarget::Defence {
            strategy,
            scenario,
            seed,
            at,
            profile,
        } => {
            let bot = defence_strategy(&strategy)
                .ok_or_else(|| anyhow!("unknown defence strategy '{strategy}'"))?;
            let config = DefenceConfig::new(seed, scenario, profile.progression());
            let ticks = ticks_for(at, config.tick)?;
            let mut simulator = DefenceSimulator::new(context.clone(), config)?;
            simulator.advance(bot.as_ref(), ticks);
            Ok(SavedRun {
                strategy,
                checkpoint: RunCheckpoint::Defence(simulator.checkpoint()),
            })
        }
        CheckpointTarget::Encounter {
            strategy,
            boss,
            difficulty,
            seed,
            at,
            weapon,
        } => {
            let bot = encounter_strategy(&strategy)
                .ok_or_else(|| anyhow!("unknown encounter strategy '{strategy}'"))?;
            let mut config = EncounterConfig::new(seed, boss, difficulty, Progression::fresh());
            if let Some(weapon) = weapon.equipped() {
                config = config.with_weapon(weapon);
            }
            let ticks = ticks_for(at, config.tick)?;
            let mut simulator = EncounterSimulator::new(context, config)?;
            simulator.advance(bot.as_ref(), ticks);
            Ok(SavedRun {
                strategy,
                checkpoint: RunCheckpoint::Encounter(simulator.checkpoint()),
            })
        }
    }
}

fn resume(context: &SimulationContext, transfer: &str, json: bool) -> Result<()> {
    let saved = SavedRun::decode(transfer).context("invalid checkpoint string")?;
    match saved.checkpoint {
        RunCheckpoint::Defence(checkpoint) => {
            let bot = defence_strategy(&saved.strategy)
                .ok_or_else(|| anyhow!("unknown defence strategy '{}'", saved.strategy))?;
            let result = DefenceSimulator::resume(context.clone(), checkpoint)?.run(bot.as_ref());
            if json {
                print_json(&result)
            } else {
                println!("{result:#?}");
                Ok(())
            }
        }
        RunCheckpoint::Encounter(checkpoint) => {
            let bot = encounter_strategy(&saved.strategy)
                .ok_or_else(|| anyhow!("unknown encounter strategy '{}'", saved.strategy))?;
            let result = EncounterSimulator::resume(checkpoint)?.run(bot.as_ref());
            if json {
                print_json(&result)
            } else {
                println!("{result:#?}");
                Ok(())
            }
        }
    }
}

/// Entry point for the Kernel Defence batch harness.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let context = load_context(cli.balance.as_ref())?;

    match cli.command {
        Command::Defence(args) => {
            let batches = run_defence(&context, &args)?;
            if args.batch.json {
                print_json(&batches)?;
            } else {
                print!("{}", defence_table(&batches));
            }
        }
        Command::Encounter(args) => {
            let batches = run_encounters(&context, &args)?;
            if args.batch.json {
                print_json(&batches)?;
            } else {
                print!("{}", encounter_table(&batches));
            }
        }
        Command::Compare(args) => {
            let comparison = compare(&context, &args)?;
            if args.batch.json {
                print_json(&comparison)?;
            } else {
                print!("{}", defence_table(&comparison.defence));
                println!();
                print!("{}", encounter_table(&comparison.encounter));
            }
        }
        Command::ExportBalance { output } => {
            let json = balance_file::export_json(context.balance())?;
            match output {
                Some(path) => fs::write(&path, json + "\n")
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::Checkpoint { target } => {
            println!("{}", checkpoint(&context, target)?.encode()?);
        }
        Command::Resume { transfer, json } => resume(&context, &transfer, json)?,
    }
    Ok(())
}
