use std::collections::BTreeMap;

use kernel_defence_core::{BossArchetype, Difficulty, Scenario};
use kernel_defence_defence_loop::DefenceRunResult;
use kernel_defence_encounter::{EncounterResult, HazardKind};
use serde::{Deserialize, Serialize};

use crate::Summary;

/// Share of runs above which a failure mode is reported as systemic.
const SYSTEMIC_SHARE: f64 = 0.9;

/// Aggregate of defence runs sharing a strategy and a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefenceBatch {
    /// Strategy shared by every run.
    pub strategy: String,
    /// Scenario shared by every run.
    pub scenario: Scenario,
    /// Number of runs aggregated.
    pub runs: usize,
    /// Kills per run.
    pub kills: Summary,
    /// Leaks per run.
    pub leaks: Summary,
    /// Hash earned per run.
    pub hash_earned: Summary,
    /// Freezes per run.
    pub freezes: Summary,
    /// Share of runs that froze at least once.
    pub freeze_rate: f64,
    /// Time of the first freeze, over the runs that froze.
    pub first_freeze_at: Option<Summary>,
    /// Efficiency when the run ended.
    pub final_efficiency: Summary,
    /// Towers standing when the run ended.
    pub towers: Summary,
    /// Highest tower level per run.
    pub peak_tower_level: Summary,
    /// Mean tower level per run.
    pub average_tower_level: Summary,
    /// Zero-day hostiles defeated per run.
    pub zero_days_defeated: Summary,
}

impl DefenceBatch {
    /// Groups results by strategy and scenario and summarises every group.
    ///
    /// Groups are ordered by strategy name, then scenario name.
    #[must_use]
    pub fn group(results: &[DefenceRunResult]) -> Vec<Self> {
        let mut groups: BTreeMap<(&str, &str), Vec<&DefenceRunResult>> = BTreeMap::new();
        for result in results {
            groups
                .entry((result.strategy.as_str(), result.scenario.name()))
                .or_default()
                .push(result);
        }
        groups
            .into_values()
            .filter_map(|group| Self::summarise(&group))
            .collect()
    }

    fn summarise(group: &[&DefenceRunResult]) -> Option<Self> {
        let first = group.first()?;
        let metric = |read: fn(&DefenceRunResult) -> f64| Summary::of(group.iter().map(|run| read(run)));
        let froze = group.iter().filter(|run| run.freezes > 0).count();

        Some(Self {
            strategy: first.strategy.clone(),
            scenario: first.scenario,
            runs: group.len(),
            kills: metric(|run| f64::from(run.kills))?,
            leaks: metric(|run| f64::from(run.leaks))?,
            hash_earned: metric(|run| run.hash_earned)?,
            freezes: metric(|run| f64::from(run.freezes))?,
            freeze_rate: froze as f64 / group.len() as f64,
            first_freeze_at: Summary::of(group.iter().filter_map(|run| run.first_freeze_at)),
            final_efficiency: metric(|run| f64::from(run.final_efficiency))?,
            towers: metric(|run| run.towers as f64)?,
            peak_tower_level: metric(|run| f64::from(run.peak_tower_level))?,
            average_tower_level: metric(|run| f64::from(run.average_tower_level))?,
            zero_days_defeated: metric(|run| f64::from(run.zero_days_defeated))?,
        })
    }

    /// Balance problems visible in the batch, worst first.
    #[must_use]
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.freeze_rate >= SYSTEMIC_SHARE {
            warnings.push("freezes in nearly every run");
        }
        if self.kills.max == 0.0 {
            warnings.push("never kills anything");
        }
        if self.towers.median == 0.0 {
            warnings.push("usually ends with no towers");
        }
        warnings
    }
}

/// Aggregate of encounter runs sharing a strategy, an archetype and a
/// difficulty tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterBatch {
    /// Strategy shared by every run.
    pub strategy: String,
    /// Boss fought.
    pub archetype: BossArchetype,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Number of runs aggregated.
    pub runs: usize,
    /// Share of runs that defeated the boss.
    pub victory_rate: f64,
    /// Elapsed time of the victorious runs.
    pub time_to_kill: Option<Summary>,
    /// Damage per second.
    pub dps: Summary,
    /// Avatar deaths per run.
    pub deaths: Summary,
    /// Damage taken per run.
    pub damage_taken: Summary,
    /// Highest phase reached.
    pub phase_reached: Summary,
    /// Boss health left when the run ended.
    pub boss_health_fraction: Summary,
    /// Mean share of the run spent in each phase.
    pub phase_share: [f64; 4],
    /// Mean hits per run for every hazard that hit at least once.
    pub hazard_hits: BTreeMap<HazardKind, f64>,
}

impl EncounterBatch {
    /// Groups results by strategy, archetype and difficulty and summarises
    /// every group.
    ///
    /// Groups are ordered by strategy name, archetype, then difficulty from
    /// easiest to hardest.
    #[must_use]
    pub fn group(results: &[EncounterResult]) -> Vec<Self> {
        let mut groups: BTreeMap<(&str, BossArchetype, usize), Vec<&EncounterResult>> =
            BTreeMap::new();
        for result in results {
            let tier = Difficulty::ALL
                .iter()
                .position(|difficulty| *difficulty == result.difficulty)
                .unwrap_or(Difficulty::ALL.len());
            groups
                .entry((result.strategy.as_str(), result.archetype, tier))
                .or_default()
                .push(result);
        }
        groups
            .into_values()
            .filter_map(|group| Self::summarise(&group))
            .collect()
    }

    fn summarise(group: &[&EncounterResult]) -> Option<Self> {
        let first = group.first()?;
        let runs = group.len() as f64;
        let metric = |read: fn(&EncounterResult) -> f64| Summary::of(group.iter().map(|run| read(run)));
        let victories = group.iter().filter(|run| run.victory).count();

        let mut phase_share = [0.0; 4];
        let mut hazard_hits = BTreeMap::new();
        for run in group {
            if run.elapsed > 0.0 {
                for (share, duration) in phase_share.iter_mut().zip(run.phase_durations) {
                    *share += duration / run.elapsed / runs;
                }
            }
            for (&kind, &hits) in &run.hazard_hits {
                *hazard_hits.entry(kind).or_insert(0.0) += f64::from(hits) / runs;
            }
        }

        Some(Self {
            strategy: first.strategy.clone(),
            archetype: first.archetype,
            difficulty: first.difficulty,
            runs: group.len(),
            victory_rate: victories as f64 / runs,
            time_to_kill: Summary::of(group.iter().filter(|run| run.victory).map(|run| run.elapsed)),
            dps: metric(|run| run.dps)?,
            deaths: metric(|run| f64::from(run.deaths))?,
            damage_taken: metric(|run| run.damage_taken)?,
            phase_reached: metric(|run| f64::from(run.phase_reached))?,
            boss_health_fraction: metric(|run| f64::from(run.boss_health_fraction))?,
            phase_share,
            hazard_hits,
        })
    }

    /// Hazard that landed the most hits on average, if any landed at all.
    #[must_use]
    pub fn deadliest_hazard(&self) -> Option<(HazardKind, f64)> {
        self.hazard_hits
            .iter()
            .map(|(&kind, &hits)| (kind, hits))
            .fold(None, |best, candidate| match best {
                Some((_, hits)) if hits >= candidate.1 => best,
                _ => Some(candidate),
            })
    }

    /// Balance problems visible in the batch, worst first.
    #[must_use]
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.victory_rate == 0.0 && self.phase_reached.max <= 1.0 {
            warnings.push("never leaves phase 1");
        } else if self.victory_rate == 0.0 {
            warnings.push("never wins");
        }
        if self.deaths.median >= 1.0 {
            warnings.push("avatar dies in most runs");
        }
        if self.victory_rate >= SYSTEMIC_SHARE && self.deaths.max == 0.0 {
            warnings.push("wins without ever dying");
        }
        warnings
    }
}
