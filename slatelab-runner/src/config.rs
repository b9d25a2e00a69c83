//! Batch configuration, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) runs the
//! full preset catalogue over every slate size, format and contest type.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use slatelab_core::builder::ExactSolver;
use slatelab_core::domain::{
    CaptainRule, Contest, ContestError, ContestFormat, ContestType, PayoutStructure, RosterSpec,
    RosterSpecError, Slot,
};
use slatelab_core::field::{FieldConfig, FieldConfigError};
use slatelab_core::scoring::{ScoringModel, ScoringModelError};
use slatelab_core::slate::SlateSize;
use slatelab_core::strategy::Strategy;

use crate::sampling::{SamplingPolicy, SamplingPolicyError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown strategy preset '{0}'")]
    UnknownStrategy(String),
    #[error("strategy '{0}' is listed more than once")]
    DuplicateStrategy(String),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("{format} {contest_type} contest: {source}")]
    Contest {
        format: ContestFormat,
        contest_type: ContestType,
        source: ContestError,
    },
    #[error("{format} roster: {source}")]
    Roster {
        format: ContestFormat,
        source: RosterSpecError,
    },
    #[error("field config: {0}")]
    Field(#[from] FieldConfigError),
    #[error("scoring model: {0}")]
    Scoring(#[from] ScoringModelError),
    #[error("sampling policy: {0}")]
    Sampling(#[from] SamplingPolicyError),
}

/// Partial contest settings; unset fields keep the standard contest's values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContestOverride {
    pub field_size: Option<usize>,
    pub entry_fee: Option<f64>,
    pub payout: Option<PayoutStructure>,
}

impl ContestOverride {
    fn apply(&self, mut contest: Contest) -> Contest {
        if let Some(n) = self.field_size {
            contest.field_size = n;
        }
        if let Some(fee) = self.entry_fee {
            contest.entry_fee = fee;
        }
        if let Some(payout) = &self.payout {
            contest.payout = payout.clone();
        }
        contest
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContestOverrides {
    pub cash: ContestOverride,
    pub gpp: ContestOverride,
}

/// Partial roster settings; unset fields keep the format's standard shape.
///
/// `slots` replaces the whole slot table when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterOverride {
    pub salary_cap: Option<u32>,
    pub slots: Option<BTreeMap<Slot, usize>>,
    pub max_per_team: Option<usize>,
    pub min_teams: Option<usize>,
    pub captain_multiplier: Option<f64>,
}

impl RosterOverride {
    fn apply(&self, mut spec: RosterSpec) -> RosterSpec {
        if let Some(cap) = self.salary_cap {
            spec.salary_cap = cap;
        }
        if let Some(slots) = &self.slots {
            spec.slots = slots.clone();
        }
        if let Some(n) = self.max_per_team {
            spec.max_per_team = n;
        }
        if let Some(n) = self.min_teams {
            spec.min_teams = n;
        }
        if let Some(multiplier) = self.captain_multiplier {
            spec.captain = Some(CaptainRule { multiplier });
        }
        spec
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterOverrides {
    pub classic: RosterOverride,
    pub showdown: RosterOverride,
}

/// Everything a batch run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub master_seed: u64,
    pub slate_sizes: Vec<SlateSize>,
    pub formats: Vec<ContestFormat>,
    pub contest_types: Vec<ContestType>,
    /// Preset names. Empty means the whole catalogue.
    pub strategies: Vec<String>,
    /// Strategies defined inline, run alongside the presets.
    pub custom_strategies: Vec<Strategy>,
    /// Distinct slates cycled through by each configuration's attempts.
    pub slates_per_config: usize,
    pub contests: ContestOverrides,
    pub rosters: RosterOverrides,
    pub sampling: SamplingPolicy,
    pub exact_time_limit_ms: u64,
    pub exact_node_limit: u64,
    pub field: FieldConfig,
    pub scoring: ScoringModel,
    /// Worker threads. 0 uses every core, 1 runs on the calling thread.
    pub threads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let exact = ExactSolver::default();
        Self {
            master_seed: 42,
            slate_sizes: SlateSize::ALL.to_vec(),
            formats: vec![ContestFormat::Classic, ContestFormat::Showdown],
            contest_types: vec![ContestType::Cash, ContestType::Gpp],
            strategies: Vec::new(),
            custom_strategies: Vec::new(),
            slates_per_config: 10,
            contests: ContestOverrides::default(),
            rosters: RosterOverrides::default(),
            sampling: SamplingPolicy::default(),
            exact_time_limit_ms: exact.time_limit.as_millis() as u64,
            exact_node_limit: exact.node_limit,
            field: FieldConfig::default(),
            scoring: ScoringModel::default(),
            threads: 0,
        }
    }
}

impl BatchConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slate_sizes.is_empty() {
            return Err(ConfigError::Invalid("no slate sizes".into()));
        }
        if self.formats.is_empty() {
            return Err(ConfigError::Invalid("no contest formats".into()));
        }
        if self.contest_types.is_empty() {
            return Err(ConfigError::Invalid("no contest types".into()));
        }
        if self.slates_per_config == 0 {
            return Err(ConfigError::Invalid(
                "slates_per_config must be at least 1".into(),
            ));
        }
        if self.exact_time_limit_ms == 0 || self.exact_node_limit == 0 {
            return Err(ConfigError::Invalid(
                "exact solver limits must be positive".into(),
            ));
        }

        for &format in &self.formats {
            self.roster_for(format)
                .validate()
                .map_err(|source| ConfigError::Roster { format, source })?;
            for &contest_type in &self.contest_types {
                let contest = self.contest_for(format, contest_type);
                contest.validate().map_err(|source| ConfigError::Contest {
                    format,
                    contest_type,
                    source,
                })?;
                if contest.contest_type() != contest_type {
                    return Err(ConfigError::Invalid(format!(
                        "{contest_type} override carries a {} payout",
                        contest.contest_type()
                    )));
                }
            }
        }

        self.field.validate()?;
        self.scoring.validate()?;
        self.sampling.validate()?;
        self.resolve_strategies()?;
        Ok(())
    }

    /// Standard contest for the pair with this config's overrides applied.
    pub fn contest_for(&self, format: ContestFormat, contest_type: ContestType) -> Contest {
        let base = Contest::default_for(format, contest_type);
        match contest_type {
            ContestType::Cash => self.contests.cash.apply(base),
            ContestType::Gpp => self.contests.gpp.apply(base),
        }
    }

    /// Standard roster for the format with this config's overrides applied.
    pub fn roster_for(&self, format: ContestFormat) -> RosterSpec {
        let base = RosterSpec::for_format(format);
        match format {
            ContestFormat::Classic => self.rosters.classic.apply(base),
            ContestFormat::Showdown => self.rosters.showdown.apply(base),
        }
    }

    /// Presets (or the whole catalogue) followed by the inline strategies.
    pub fn resolve_strategies(&self) -> Result<Vec<Strategy>, ConfigError> {
        let mut resolved = if self.strategies.is_empty() {
            Strategy::presets()
        } else {
            self.strategies
                .iter()
                .map(|name| {
                    Strategy::preset(name).ok_or_else(|| ConfigError::UnknownStrategy(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        resolved.extend(self.custom_strategies.iter().cloned());

        let mut seen = BTreeSet::new();
        for s in &resolved {
            if !seen.insert(s.name.as_str()) {
                return Err(ConfigError::DuplicateStrategy(s.name.clone()));
            }
        }
        if resolved.is_empty() {
            return Err(ConfigError::Invalid("no strategies".into()));
        }
        Ok(resolved)
    }

    pub fn exact_solver(&self) -> ExactSolver {
        ExactSolver {
            time_limit: Duration::from_millis(self.exact_time_limit_ms),
            node_limit: self.exact_node_limit,
        }
    }
}
