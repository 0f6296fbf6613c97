//! Plain-text comparison tables, one row per batch.

use crate::{DefenceBatch, EncounterBatch};

/// Renders defence batches as an aligned table followed by their warnings.
#[must_use]
pub fn defence_table(batches: &[DefenceBatch]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<14} {:<10} {:>5} {:>9} {:>9} {:>11} {:>8} {:>10} {:>9} {:>7} {:>6}\n",
        "strategy", "scenario", "runs", "kills", "leaks", "hash", "freeze%", "1st freeze", "eff", "towers", "peak"
    ));
    for batch in batches {
        let first_freeze = batch
            .first_freeze_at
            .map_or_else(|| "-".to_owned(), |summary| format!("{:.0}s", summary.median));
        out.push_str(&format!(
            "{:<14} {:<10} {:>5} {:>9.1} {:>9.1} {:>11.0} {:>7.0}% {:>10} {:>9.1} {:>7.1} {:>6.0}\n",
            batch.strategy,
            batch.scenario.name(),
            batch.runs,
            batch.kills.mean,
            batch.leaks.mean,
            batch.hash_earned.mean,
            batch.freeze_rate * 100.0,
            first_freeze,
            batch.final_efficiency.mean,
            batch.towers.mean,
            batch.peak_tower_level.max,
        ));
    }
    push_warnings(
        &mut out,
        batches
            .iter()
            .map(|batch| (format!("{}/{}", batch.strategy, batch.scenario), batch.warnings())),
    );
    out
}

/// Renders encounter batches as an aligned table followed by their warnings.
#[must_use]
pub fn encounter_table(batches: &[EncounterBatch]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<14} {:<14} {:<9} {:>5} {:>5} {:>8} {:>8} {:>6} {:>6} {:>8}  {}\n",
        "strategy", "boss", "tier", "runs", "win%", "ttk", "dps", "deaths", "phase", "boss hp", "top hazard"
    ));
    for batch in batches {
        let time_to_kill = batch
            .time_to_kill
            .map_or_else(|| "-".to_owned(), |summary| format!("{:.0}s", summary.median));
        let hazard = batch
            .deadliest_hazard()
            .map_or_else(|| "-".to_owned(), |(kind, hits)| format!("{} ({hits:.1})", kind.name()));
        out.push_str(&format!(
            "{:<14} {:<14} {:<9} {:>5} {:>4.0}% {:>8} {:>8.1} {:>6.2} {:>6.1} {:>7.0}%  {}\n",
            batch.strategy,
            batch.archetype.name(),
            batch.difficulty.name(),
            batch.runs,
            batch.victory_rate * 100.0,
            time_to_kill,
            batch.dps.mean,
            batch.deaths.mean,
            batch.phase_reached.mean,
            batch.boss_health_fraction.mean * 100.0,
            hazard,
        ));
    }
    push_warnings(
        &mut out,
        batches.iter().map(|batch| {
            (
                format!("{}/{}/{}", batch.strategy, batch.archetype, batch.difficulty),
                batch.warnings(),
            )
        }),
    );
    out
}

fn push_warnings<I>(out: &mut String, rows: I)
where
    I: Iterator<Item = (String, Vec<&'static str>)>,
{
    let mut header_written = false;
    for (label, warnings) in rows {
        for warning in warnings {
            if !header_written {
                out.push_str("\nwarnings:\n");
                header_written = true;
            }
            out.push_str(&format!("  {label}: {warning}\n"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Summary;
    use kernel_defence_core::Scenario;

    fn flat(value: f64) -> Summary {
        Summary::of([value]).expect("one sample")
    }

    #[test]
    fn defence_rows_follow_batch_order_and_list_warnings() {
        let batch = |strategy: &str, kills: f64| DefenceBatch {
            strategy: strategy.to_owned(),
            scenario: Scenario::Drought,
            runs: 4,
            kills: flat(kills),
            leaks: flat(3.0),
            hash_earned: flat(kills * 5.0),
            freezes: flat(0.0),
            freeze_rate: 0.0,
            first_freeze_at: None,
            final_efficiency: flat(80.0),
            towers: flat(2.0),
            peak_tower_level: flat(4.0),
            average_tower_level: flat(2.5),
            zero_days_defeated: flat(0.0),
        };
        let table = defence_table(&[batch("greedy", 120.0), batch("spread", 0.0)]);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].starts_with("strategy"));
        assert!(lines[1].starts_with("greedy"));
        assert!(lines[1].contains("drought"));
        assert!(lines[2].starts_with("spread"));
        assert!(table.contains("warnings:\n  spread/drought: never kills anything"));
        assert!(!table.contains("greedy/drought"));
    }

    #[test]
    fn tables_without_problems_have_no_warning_section() {
        assert!(!encounter_table(&[]).contains("warnings"));
    }
}
