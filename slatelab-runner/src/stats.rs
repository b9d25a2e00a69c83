//! Per-configuration accumulators and summary statistics.
//!
//! Accumulators merge associatively, so partial results from any number of
//! workers reduce to the same summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use slatelab_core::domain::Lineup;
use slatelab_core::evaluator::ContestOutcome;

/// One successful attempt: the contest result plus the entry that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSample {
    pub slate_id: u64,
    pub attempt: u64,
    pub own_score: f64,
    pub winning_score: f64,
    pub rank: usize,
    pub entrants: usize,
    pub percentile: f64,
    pub payout: f64,
    pub profit: f64,
    pub roi: f64,
    pub top10: bool,
    pub top1: bool,
    pub salary: u32,
    pub projection: f64,
    pub max_stack: usize,
}

impl OutcomeSample {
    pub fn new(
        slate_id: u64,
        attempt: u64,
        lineup: &Lineup,
        own_score: f64,
        winning_score: f64,
        outcome: &ContestOutcome,
    ) -> Self {
        let share = outcome.top_share();
        Self {
            slate_id,
            attempt,
            own_score,
            winning_score,
            rank: outcome.rank,
            entrants: outcome.entrants,
            percentile: outcome.percentile,
            payout: outcome.payout,
            profit: outcome.profit,
            roi: outcome.roi,
            top10: share <= 0.10,
            top1: share <= 0.01,
            salary: lineup.total_salary(),
            projection: lineup.total_projection(),
            max_stack: lineup.max_stack(),
        }
    }
}

/// Raw attempt tallies for one configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigAccumulator {
    pub attempts: usize,
    pub samples: Vec<OutcomeSample>,
    /// Failed attempts keyed by reason.
    pub failures: BTreeMap<String, usize>,
    /// Opponent lineups filled by duplication across all attempts.
    pub padded_lineups: usize,
}

impl ConfigAccumulator {
    pub fn successes(&self) -> usize {
        self.samples.len()
    }

    pub fn record_success(&mut self, sample: OutcomeSample) {
        self.attempts += 1;
        self.samples.push(sample);
    }

    pub fn record_failure(&mut self, reason: &str) {
        self.attempts += 1;
        *self.failures.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: ConfigAccumulator) {
        self.attempts += other.attempts;
        self.samples.extend(other.samples);
        for (reason, n) in other.failures {
            *self.failures.entry(reason).or_insert(0) += n;
        }
        self.padded_lineups += other.padded_lineups;
    }

    pub fn summarize(&self) -> ConfigSummary {
        let n = self.samples.len();
        let share = |pred: fn(&OutcomeSample) -> bool| {
            if n == 0 {
                0.0
            } else {
                self.samples.iter().filter(|s| pred(s)).count() as f64 / n as f64
            }
        };
        let mean_of = |f: fn(&OutcomeSample) -> f64| {
            if n == 0 {
                0.0
            } else {
                self.samples.iter().map(f).sum::<f64>() / n as f64
            }
        };

        ConfigSummary {
            attempts: self.attempts,
            successes: n,
            success_rate: if self.attempts == 0 {
                0.0
            } else {
                n as f64 / self.attempts as f64
            },
            failures: self.failures.clone(),
            roi: Distribution::from_values(self.samples.iter().map(|s| s.roi).collect()),
            score: Distribution::from_values(self.samples.iter().map(|s| s.own_score).collect()),
            win_rate: share(|s| s.profit > 0.0),
            cash_rate: share(|s| s.payout > 0.0),
            top10_rate: share(|s| s.top10),
            top1_rate: share(|s| s.top1),
            avg_percentile: mean_of(|s| s.percentile),
            avg_winning_score: mean_of(|s| s.winning_score),
            avg_salary: mean_of(|s| s.salary as f64),
            avg_projection: mean_of(|s| s.projection),
            avg_max_stack: mean_of(|s| s.max_stack as f64),
            total_profit: self.samples.iter().map(|s| s.profit).sum(),
            padded_lineups: self.padded_lineups,
        }
    }
}

/// Summary of one configuration's samples.
///
/// Best and worst observed ROI and score are the `max`/`min` of their
/// distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub attempts: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub failures: BTreeMap<String, usize>,
    pub roi: Distribution,
    pub score: Distribution,
    /// Share of samples with positive profit.
    pub win_rate: f64,
    pub cash_rate: f64,
    pub top10_rate: f64,
    pub top1_rate: f64,
    pub avg_percentile: f64,
    pub avg_winning_score: f64,
    pub avg_salary: f64,
    pub avg_projection: f64,
    pub avg_max_stack: f64,
    pub total_profit: f64,
    pub padded_lineups: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub max: f64,
}

impl Distribution {
    /// All zeros for an empty input.
    pub fn from_values(mut values: Vec<f64>) -> Self {
        let n = values.len();
        if n == 0 {
            return Self::default();
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let mean = values.iter().sum::<f64>() / n as f64;
        let std_dev = if n > 1 {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        Self {
            count: n,
            mean,
            std_dev,
            min: values[0],
            p10: percentile_sorted(&values, 10.0),
            p25: percentile_sorted(&values, 25.0),
            p50: percentile_sorted(&values, 50.0),
            p75: percentile_sorted(&values, 75.0),
            p90: percentile_sorted(&values, 90.0),
            max: values[n - 1],
        }
    }
}

/// Linear-interpolated percentile of an ascending slice. `p` in [0, 100].
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(attempt: u64, roi: f64, percentile: f64) -> OutcomeSample {
        let payout = if roi > -100.0 { 10.0 * (1.0 + roi / 100.0) } else { 0.0 };
        OutcomeSample {
            slate_id: attempt % 3,
            attempt,
            own_score: 40.0 + attempt as f64,
            winning_score: 90.0,
            rank: 1,
            entrants: 100,
            percentile,
            payout,
            profit: payout - 10.0,
            roi,
            top10: percentile >= 90.0,
            top1: percentile >= 99.0,
            salary: 49_500,
            projection: 85.0,
            max_stack: 4,
        }
    }

    #[test]
    fn percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&v, 50.0), 3.0);
        assert_eq!(percentile_sorted(&v, 0.0), 1.0);
        assert_eq!(percentile_sorted(&v, 100.0), 5.0);
        assert!((percentile_sorted(&v, 10.0) - 1.4).abs() < 1e-12);
        assert_eq!(percentile_sorted(&[], 50.0), 0.0);
    }

    #[test]
    fn distribution_of_known_values() {
        let d = Distribution::from_values(vec![100.0, -100.0, 100.0, -100.0]);
        assert_eq!(d.count, 4);
        assert_eq!(d.mean, 0.0);
        assert_eq!(d.min, -100.0);
        assert_eq!(d.max, 100.0);
        assert_eq!(d.p50, 0.0);
        assert!((d.std_dev - (40_000.0_f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn empty_accumulator_summarizes_to_zeros() {
        let s = ConfigAccumulator::default().summarize();
        assert_eq!(s.attempts, 0);
        assert_eq!(s.success_rate, 0.0);
        assert_eq!(s.roi, Distribution::default());
        assert_eq!(s.win_rate, 0.0);
    }

    #[test]
    fn failures_count_as_attempts() {
        let mut acc = ConfigAccumulator::default();
        acc.record_success(sample(0, 100.0, 80.0));
        acc.record_failure("salary_floor");
        acc.record_failure("salary_floor");
        acc.record_failure("empty_field");
        let s = acc.summarize();
        assert_eq!(s.attempts, 4);
        assert_eq!(s.successes, 1);
        assert_eq!(s.success_rate, 0.25);
        assert_eq!(s.failures["salary_floor"], 2);
        assert_eq!(s.failures["empty_field"], 1);
    }

    #[test]
    fn rates_and_means() {
        let mut acc = ConfigAccumulator::default();
        acc.record_success(sample(0, 100.0, 95.0));
        acc.record_success(sample(1, -100.0, 20.0));
        acc.record_success(sample(2, 100.0, 99.5));
        acc.record_success(sample(3, -100.0, 30.0));
        let s = acc.summarize();
        assert_eq!(s.win_rate, 0.5);
        assert_eq!(s.cash_rate, 0.5);
        assert_eq!(s.top10_rate, 0.5);
        assert_eq!(s.top1_rate, 0.25);
        assert!((s.avg_percentile - 61.125).abs() < 1e-9);
        assert!((s.total_profit).abs() < 1e-9);
        assert_eq!(s.roi.max, 100.0);
        assert_eq!(s.roi.min, -100.0);
    }

    #[test]
    fn merge_is_order_independent() {
        let mut a = ConfigAccumulator::default();
        a.record_success(sample(0, 100.0, 80.0));
        a.record_failure("no_feasible_combination");
        let mut b = ConfigAccumulator::default();
        b.record_success(sample(1, -100.0, 10.0));
        b.record_failure("no_feasible_combination");
        b.padded_lineups = 3;

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);

        let (sa, sb) = (ab.summarize(), ba.summarize());
        assert_eq!(sa.attempts, 4);
        assert_eq!(sa.failures["no_feasible_combination"], 2);
        assert_eq!(sa.padded_lineups, 3);
        assert_eq!(sa.roi, sb.roi);
        assert_eq!(sa.win_rate, sb.win_rate);
    }
}
