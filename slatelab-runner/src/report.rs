//! Aggregate batch report: JSON persistence, ranking and a Markdown table.
//!
//! Persisted reports carry a `schema_version`; unknown versions are rejected
//! on load.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::orchestrator::ConfigKey;
use crate::sampling::SamplingState;
use crate::stats::{ConfigAccumulator, ConfigSummary, OutcomeSample};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One configuration's terminal state, summary and raw samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigReport {
    pub key: ConfigKey,
    pub state: SamplingState,
    pub summary: ConfigSummary,
    pub samples: Vec<OutcomeSample>,
}

impl ConfigReport {
    pub fn new(key: ConfigKey, state: SamplingState, acc: ConfigAccumulator) -> Self {
        let summary = acc.summarize();
        Self {
            key,
            state,
            summary,
            samples: acc.samples,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub master_seed: u64,
    pub elapsed_secs: f64,
    /// Sorted by key.
    pub entries: Vec<ConfigReport>,
}

impl BatchReport {
    pub fn new(master_seed: u64, elapsed_secs: f64, mut entries: Vec<ConfigReport>) -> Self {
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            master_seed,
            elapsed_secs,
            entries,
        }
    }

    pub fn get(&self, key: &ConfigKey) -> Option<&ConfigReport> {
        self.entries
            .binary_search_by(|e| e.key.cmp(key))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Configurations with at least one sample, best first. Ties keep key order.
    pub fn ranked(&self, metric: RankingMetric) -> Vec<&ConfigReport> {
        let mut ranked: Vec<&ConfigReport> = self
            .entries
            .iter()
            .filter(|e| e.summary.successes > 0)
            .collect();
        ranked.sort_by(|a, b| metric.value(&b.summary).total_cmp(&metric.value(&a.summary)));
        ranked
    }

    pub fn state_counts(&self) -> BTreeMap<SamplingState, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.entries {
            *counts.entry(e.state).or_insert(0) += 1;
        }
        counts
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize BatchReport to JSON")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let report: Self =
            serde_json::from_str(json).context("failed to deserialize BatchReport from JSON")?;
        if report.schema_version > SCHEMA_VERSION {
            bail!(
                "unsupported schema version {} (max supported: {})",
                report.schema_version,
                SCHEMA_VERSION
            );
        }
        Ok(report)
    }

    /// Write pretty JSON, creating parent directories as needed.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create report dir: {}", parent.display()))?;
        }
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report: {}", path.display()))
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Markdown leaderboard of the top `limit` configurations by `metric`.
    pub fn to_markdown(&self, metric: RankingMetric, limit: usize) -> String {
        let mut md = String::with_capacity(2048);
        md.push_str("# Slatelab Batch Report\n\n");
        md.push_str(&format!(
            "Seed {} | {} configurations | {:.1}s\n\n",
            self.master_seed,
            self.entries.len(),
            self.elapsed_secs
        ));

        md.push_str("| State | Count |\n| --- | --- |\n");
        for (state, n) in self.state_counts() {
            md.push_str(&format!("| {state} | {n} |\n"));
        }

        md.push_str(&format!("\n## Top {limit} by {metric}\n\n"));
        md.push_str(
            "| # | Configuration | State | Samples | Mean ROI | Median ROI | P10 ROI | Win % | Cash % |\n",
        );
        md.push_str("| --- | --- | --- | --- | --- | --- | --- | --- | --- |\n");
        for (i, e) in self.ranked(metric).into_iter().take(limit).enumerate() {
            let s = &e.summary;
            md.push_str(&format!(
                "| {} | {} | {} | {}/{} | {:.1}% | {:.1}% | {:.1}% | {:.1} | {:.1} |\n",
                i + 1,
                e.key,
                e.state,
                s.successes,
                s.attempts,
                s.roi.mean,
                s.roi.p50,
                s.roi.p10,
                s.win_rate * 100.0,
                s.cash_rate * 100.0,
            ));
        }
        md
    }
}

// ─── Ranking ─────────────────────────────────────────────────────────

/// Which summary statistic orders the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    #[default]
    MeanRoi,
    MedianRoi,
    WinRate,
    /// Downside-aware: the 10th percentile ROI.
    P10Roi,
    CashRate,
}

impl RankingMetric {
    pub const ALL: [RankingMetric; 5] = [
        Self::MeanRoi,
        Self::MedianRoi,
        Self::WinRate,
        Self::P10Roi,
        Self::CashRate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::MeanRoi => "mean_roi",
            Self::MedianRoi => "median_roi",
            Self::WinRate => "win_rate",
            Self::P10Roi => "p10_roi",
            Self::CashRate => "cash_rate",
        }
    }

    pub fn value(&self, summary: &ConfigSummary) -> f64 {
        match self {
            Self::MeanRoi => summary.roi.mean,
            Self::MedianRoi => summary.roi.p50,
            Self::WinRate => summary.win_rate,
            Self::P10Roi => summary.roi.p10,
            Self::CashRate => summary.cash_rate,
        }
    }
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RankingMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.label() == s)
            .ok_or_else(|| format!("unknown ranking metric '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slatelab_core::domain::{ContestFormat, ContestType};
    use slatelab_core::slate::SlateSize;

    fn key(strategy: &str) -> ConfigKey {
        ConfigKey {
            slate_size: SlateSize::Small,
            format: ContestFormat::Classic,
            strategy: strategy.into(),
            contest_type: ContestType::Cash,
        }
    }

    fn sample(attempt: u64, roi: f64) -> OutcomeSample {
        let payout = if roi > 0.0 { 20.0 } else { 0.0 };
        OutcomeSample {
            slate_id: 0,
            attempt,
            own_score: 80.0,
            winning_score: 110.0,
            rank: 10,
            entrants: 100,
            percentile: 90.0,
            payout,
            profit: payout - 10.0,
            roi,
            top10: true,
            top1: false,
            salary: 49_800,
            projection: 82.0,
            max_stack: 3,
        }
    }

    fn entry(strategy: &str, rois: &[f64], state: SamplingState) -> ConfigReport {
        let mut acc = ConfigAccumulator::default();
        for (i, &roi) in rois.iter().enumerate() {
            acc.record_success(sample(i as u64, roi));
        }
        if rois.is_empty() {
            acc.record_failure("salary_floor");
        }
        ConfigReport::new(key(strategy), state, acc)
    }

    fn report() -> BatchReport {
        BatchReport::new(
            1,
            0.5,
            vec![
                entry("value_floor", &[100.0, -100.0, -100.0], SamplingState::Exhausted),
                entry("chalk_plus", &[100.0, 100.0, -100.0], SamplingState::Completed),
                entry("salary_max", &[], SamplingState::AbandonedImpossible),
            ],
        )
    }

    #[test]
    fn entries_are_sorted_and_searchable() {
        let r = report();
        let names: Vec<&str> = r.entries.iter().map(|e| e.key.strategy.as_str()).collect();
        assert_eq!(names, ["chalk_plus", "salary_max", "value_floor"]);
        assert!(r.get(&key("value_floor")).is_some());
        assert!(r.get(&key("five_stack")).is_none());
    }

    #[test]
    fn ranking_skips_empty_configurations() {
        let r = report();
        let ranked: Vec<&str> = r
            .ranked(RankingMetric::MeanRoi)
            .into_iter()
            .map(|e| e.key.strategy.as_str())
            .collect();
        assert_eq!(ranked, ["chalk_plus", "value_floor"]);
    }

    #[test]
    fn state_counts_cover_every_entry() {
        let counts = report().state_counts();
        assert_eq!(counts[&SamplingState::Completed], 1);
        assert_eq!(counts[&SamplingState::Exhausted], 1);
        assert_eq!(counts[&SamplingState::AbandonedImpossible], 1);
    }

    #[test]
    fn json_roundtrip_and_version_guard() {
        let r = report();
        let json = r.to_json().unwrap();
        let back = BatchReport::from_json(&json).unwrap();
        assert_eq!(back, r);

        let mut future = r;
        future.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&future).unwrap();
        assert!(BatchReport::from_json(&json).is_err());
    }

    #[test]
    fn markdown_lists_ranked_rows() {
        let md = report().to_markdown(RankingMetric::WinRate, 5);
        assert!(md.contains("## Top 5 by win_rate"));
        assert!(md.contains("small/classic/chalk_plus/cash"));
        assert!(!md.contains("| 3 |"));
    }

    #[test]
    fn metric_parses_labels() {
        for m in RankingMetric::ALL {
            assert_eq!(m.label().parse::<RankingMetric>().unwrap(), m);
        }
        assert_eq!("Mean_ROI".parse::<RankingMetric>().unwrap(), RankingMetric::MeanRoi);
        assert!("sharpe".parse::<RankingMetric>().is_err());
    }
}
