//! Slatelab Runner — batch orchestration over the core engine.
//!
//! This crate builds on `slatelab-core` to provide:
//! - TOML batch configuration with validation
//! - Adaptive sampling (completed / abandoned / exhausted) per configuration
//! - A rayon worker pool running configurations as independent work units
//! - Per-configuration accumulators, outcome distributions and summaries
//! - The aggregate report: JSON persistence, ranking, Markdown leaderboard

pub mod config;
pub mod orchestrator;
pub mod report;
pub mod sampling;
pub mod stats;

pub use config::{
    BatchConfig, ConfigError, ContestOverride, ContestOverrides, RosterOverride, RosterOverrides,
};
pub use orchestrator::{run_batch, BatchError, BatchProgress, ConfigKey};
pub use report::{BatchReport, ConfigReport, RankingMetric, SCHEMA_VERSION};
pub use sampling::{SamplingPolicy, SamplingPolicyError, SamplingState};
pub use stats::{ConfigAccumulator, ConfigSummary, Distribution, OutcomeSample};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BatchConfig>();
        assert_sync::<BatchConfig>();
        assert_send::<SamplingPolicy>();
        assert_sync::<SamplingPolicy>();
    }

    #[test]
    fn accumulators_are_send_sync() {
        assert_send::<ConfigAccumulator>();
        assert_sync::<ConfigAccumulator>();
        assert_send::<OutcomeSample>();
        assert_sync::<OutcomeSample>();
    }

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<BatchReport>();
        assert_sync::<BatchReport>();
        assert_send::<ConfigKey>();
        assert_sync::<ConfigKey>();
        assert_send::<BatchProgress>();
        assert_sync::<BatchProgress>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<BatchError>();
        assert_sync::<BatchError>();
    }
}
