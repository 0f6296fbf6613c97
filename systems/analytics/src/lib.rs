#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Aggregation of many simulation result records into per-batch summaries and
//! side-by-side comparison tables.
//!
//! Nothing here runs a simulation. The harness collects result records (in any
//! order, from any number of workers) and hands them over; summaries sort
//! their inputs, so the output does not depend on collection order.

mod batch;
mod table;

pub use batch::{DefenceBatch, EncounterBatch};
pub use table::{defence_table, encounter_table};

use serde::{Deserialize, Serialize};

/// Distribution of one metric across a batch of runs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of samples.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation; zero for a single sample.
    pub std_dev: f64,
    /// Smallest sample.
    pub min: f64,
    /// 10th percentile (nearest rank).
    pub p10: f64,
    /// Median (nearest rank).
    pub median: f64,
    /// 90th percentile (nearest rank).
    pub p90: f64,
    /// Largest sample.
    pub max: f64,
}

impl Summary {
    /// Summarises the samples, or `None` when there are none.
    ///
    /// Non-finite samples are ignored.
    #[must_use]
    pub fn of<I>(samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted: Vec<f64> = samples.into_iter().filter(|value| value.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let mut running = RunningStats::default();
        for &value in &sorted {
            running.add(value);
        }

        Some(Self {
            count: sorted.len(),
            mean: running.mean,
            std_dev: running.std_dev(),
            min: sorted[0],
            p10: nearest_rank(&sorted, 0.10),
            median: nearest_rank(&sorted, 0.50),
            p90: nearest_rank(&sorted, 0.90),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Welford accumulator.
#[derive(Debug, Default)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / f64::from(self.count);
        self.m2 += delta * (value - self.mean);
    }

    fn std_dev(&self) -> f64 {
        if self.count > 1 {
            (self.m2 / f64::from(self.count - 1)).sqrt()
        } else {
            0.0
        }
    }
}

/// `sorted` must be non-empty and ascending.
fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    let rank = (quantile * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_summary() {
        assert_eq!(Summary::of(Vec::new()), None);
        assert_eq!(Summary::of([f64::NAN]), None);
    }

    #[test]
    fn single_sample_collapses_every_statistic() {
        let summary = Summary::of([7.5]).expect("one sample");
        assert_eq!(summary.count, 1);
        assert_eq!(summary.std_dev, 0.0);
        for value in [summary.mean, summary.min, summary.p10, summary.median, summary.p90, summary.max] {
            assert_eq!(value, 7.5);
        }
    }

    #[test]
    fn percentiles_use_nearest_rank() {
        let summary = Summary::of((1..=10).rev().map(f64::from)).expect("ten samples");
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.p10, 1.0);
        assert_eq!(summary.median, 5.0);
        assert_eq!(summary.p90, 9.0);
        assert_eq!(summary.max, 10.0);
        assert!((summary.mean - 5.5).abs() < 1e-12);
    }

    #[test]
    fn standard_deviation_is_the_sample_estimate() {
        let summary = Summary::of([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).expect("samples");
        assert!((summary.mean - 5.0).abs() < 1e-12);
        assert!((summary.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = Summary::of([0.1, 0.7, 0.2, 0.9, 0.3]);
        let backward = Summary::of([0.3, 0.9, 0.2, 0.7, 0.1]);
        assert_eq!(forward, backward);
    }
}
