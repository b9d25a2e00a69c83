//! Batch orchestrator: runs every (slate size, format, strategy, contest type)
//! configuration under the adaptive sampling policy.
//!
//! Each configuration is one work unit. A unit's attempts are a pure function
//! of (master seed, configuration, slate, attempt index), so units run on any
//! worker in any order and the merged report is identical for every thread
//! count.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use slatelab_core::builder::{BuildOutcome, LineupBuilder};
use slatelab_core::domain::{Contest, ContestFormat, ContestType, Lineup, PoolError, RosterSpec};
use slatelab_core::evaluator::evaluate;
use slatelab_core::field::FieldGenerator;
use slatelab_core::rng::RngHierarchy;
use slatelab_core::scoring::ScoringSimulator;
use slatelab_core::slate::{Slate, SlateGenerator, SlateSize};
use slatelab_core::strategy::Strategy;

use crate::config::{BatchConfig, ConfigError};
use crate::report::{BatchReport, ConfigReport};
use crate::sampling::{SamplingPolicy, SamplingState};
use crate::stats::{ConfigAccumulator, OutcomeSample};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("slate {slate_id} ({format}/{size}): {source}")]
    Slate {
        format: ContestFormat,
        size: SlateSize,
        slate_id: u64,
        source: PoolError,
    },
}

// ─── Configuration key ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigKey {
    pub slate_size: SlateSize,
    pub format: ContestFormat,
    pub strategy: String,
    pub contest_type: ContestType,
}

impl ConfigKey {
    /// Stable label, also the RNG scope for the configuration's attempts.
    pub fn label(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.slate_size, self.format, self.strategy, self.contest_type
        )
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Reported once per finished configuration.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub finished: usize,
    pub total: usize,
    pub key: ConfigKey,
    pub state: SamplingState,
    pub attempts: usize,
    pub successes: usize,
}

// ─── Shared read-only context ────────────────────────────────────────

struct BatchContext<'a> {
    policy: &'a SamplingPolicy,
    rng: RngHierarchy,
    builder: LineupBuilder,
    field: FieldGenerator,
    scoring: ScoringSimulator,
}

struct WorkUnit<'a> {
    key: ConfigKey,
    strategy: &'a Strategy,
    slates: &'a [Slate],
    spec: RosterSpec,
    contest: Contest,
}

impl BatchContext<'_> {
    /// Draw attempts for one configuration until the policy stops it.
    fn run_unit(&self, unit: &WorkUnit<'_>) -> (SamplingState, ConfigAccumulator) {
        let target = self.policy.target_for(unit.key.contest_type);
        let scope = unit.key.label();
        // own lineup is a pure function of (slate, strategy): build once per slate
        let mut own: Vec<Option<BuildOutcome>> = vec![None; unit.slates.len()];
        let mut acc = ConfigAccumulator::default();
        let mut state = SamplingState::Sampling;
        let mut attempt: u64 = 0;

        while !state.is_terminal() {
            let idx = (attempt % unit.slates.len() as u64) as usize;
            let slate = &unit.slates[idx];
            let built = own[idx]
                .get_or_insert_with(|| self.builder.build(&slate.pool, &unit.spec, unit.strategy));

            match built {
                BuildOutcome::Infeasible(reason) => acc.record_failure(reason.kind()),
                BuildOutcome::Built(lineup) => {
                    self.play(unit, &scope, slate, attempt, lineup, &mut acc)
                }
            }

            attempt += 1;
            state = self.policy.next_state(acc.attempts, acc.successes(), target);
        }

        match state {
            SamplingState::AbandonedImpossible | SamplingState::AbandonedLowConfidence => warn!(
                config = %unit.key,
                %state,
                attempts = acc.attempts,
                successes = acc.successes(),
                "configuration abandoned"
            ),
            _ => debug!(
                config = %unit.key,
                %state,
                attempts = acc.attempts,
                successes = acc.successes(),
                "configuration finished"
            ),
        }
        (state, acc)
    }

    /// One contest: generate the field, score everyone, evaluate.
    fn play(
        &self,
        unit: &WorkUnit<'_>,
        scope: &str,
        slate: &Slate,
        attempt: u64,
        lineup: &Lineup,
        acc: &mut ConfigAccumulator,
    ) {
        let mut rng = self.rng.rng_for(scope, slate.id, attempt);
        let opponents = unit.contest.opponent_count();
        let field = self.field.generate(
            &slate.pool,
            &unit.spec,
            unit.key.contest_type,
            opponents,
            &mut rng,
        );
        if field.len() < opponents {
            acc.record_failure("empty_field");
            return;
        }
        acc.padded_lineups += field.stats.padded;

        let own_score = self.scoring.simulate(lineup, &mut rng);
        let field_scores: Vec<f64> = field
            .lineups
            .iter()
            .map(|l| self.scoring.simulate(l, &mut rng))
            .collect();
        let winning_score = field_scores.iter().copied().fold(own_score, f64::max);
        let outcome = evaluate(own_score, &field_scores, &unit.contest);

        acc.record_success(OutcomeSample::new(
            slate.id,
            attempt,
            lineup,
            own_score,
            winning_score,
            &outcome,
        ));
    }
}

// ─── Entry point ─────────────────────────────────────────────────────

/// Run every configuration in `config` and merge the results into one report.
///
/// `progress_cb` is invoked from worker threads as each configuration finishes.
pub fn run_batch(
    config: &BatchConfig,
    progress_cb: Option<&(dyn Fn(&BatchProgress) + Sync)>,
) -> Result<BatchReport, BatchError> {
    config.validate()?;
    let started = Instant::now();
    let strategies = config.resolve_strategies()?;

    let slates = generate_slates(config)?;

    let ctx = BatchContext {
        policy: &config.sampling,
        rng: RngHierarchy::new(config.master_seed),
        builder: LineupBuilder::new(config.exact_solver()),
        field: FieldGenerator::new(config.field.clone()),
        scoring: ScoringSimulator::new(config.scoring.clone()).map_err(ConfigError::from)?,
    };

    let mut units = Vec::new();
    for &slate_size in &config.slate_sizes {
        for &format in &config.formats {
            let Some(slates) = slates.get(&(format, slate_size)) else {
                continue;
            };
            for strategy in &strategies {
                for &contest_type in &config.contest_types {
                    units.push(WorkUnit {
                        key: ConfigKey {
                            slate_size,
                            format,
                            strategy: strategy.name.clone(),
                            contest_type,
                        },
                        strategy,
                        slates: slates.as_slice(),
                        spec: config.roster_for(format),
                        contest: config.contest_for(format, contest_type),
                    });
                }
            }
        }
    }

    let total = units.len();
    info!(
        configurations = total,
        strategies = strategies.len(),
        slates_per_config = config.slates_per_config,
        threads = config.threads,
        seed = config.master_seed,
        "batch started"
    );

    let finished = AtomicUsize::new(0);
    let run_one = |unit: &WorkUnit<'_>| {
        let (state, acc) = ctx.run_unit(unit);
        let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(cb) = progress_cb {
            cb(&BatchProgress {
                finished: done,
                total,
                key: unit.key.clone(),
                state,
                attempts: acc.attempts,
                successes: acc.successes(),
            });
        }
        (unit.key.clone(), state, acc)
    };

    let results: Vec<(ConfigKey, SamplingState, ConfigAccumulator)> = if config.threads == 1 {
        units.iter().map(run_one).collect()
    } else {
        let tp = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()?;
        tp.install(|| units.par_iter().map(run_one).collect())
    };

    // Reduce worker accumulators by key.
    let mut merged: BTreeMap<ConfigKey, (SamplingState, ConfigAccumulator)> = BTreeMap::new();
    for (key, state, acc) in results {
        let entry = merged
            .entry(key)
            .or_insert_with(|| (state, ConfigAccumulator::default()));
        entry.0 = state;
        entry.1.merge(acc);
    }

    let entries: Vec<ConfigReport> = merged
        .into_iter()
        .map(|(key, (state, acc))| ConfigReport::new(key, state, acc))
        .collect();

    let report = BatchReport::new(config.master_seed, started.elapsed().as_secs_f64(), entries);
    info!(
        configurations = report.entries.len(),
        elapsed_secs = report.elapsed_secs,
        "batch finished"
    );
    Ok(report)
}

/// Slates for every (format, size) pair, shared by all strategies and contest types.
fn generate_slates(
    config: &BatchConfig,
) -> Result<BTreeMap<(ContestFormat, SlateSize), Vec<Slate>>, BatchError> {
    let generator = SlateGenerator::new(config.master_seed);
    let mut slates = BTreeMap::new();
    for &format in &config.formats {
        for &size in &config.slate_sizes {
            let batch = (0..config.slates_per_config as u64)
                .map(|slate_id| {
                    generator
                        .generate(slate_id, format, size)
                        .map_err(|source| BatchError::Slate {
                            format,
                            size,
                            slate_id,
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            debug!(%format, %size, count = batch.len(), "slates generated");
            slates.insert((format, size), batch);
        }
    }
    Ok(slates)
}
