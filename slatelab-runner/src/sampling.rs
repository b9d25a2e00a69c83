//! Adaptive sampling: when a configuration stops drawing attempts.
//!
//! ```text
//! Sampling ─┬─> Completed               target successes reached
//!           ├─> AbandonedImpossible     no success after the zero-success budget
//!           ├─> AbandonedLowConfidence  success rate below the floor at the check
//!           └─> Exhausted               attempt ceiling hit with partial success
//! ```
//!
//! Every terminal state keeps the samples gathered so far.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use slatelab_core::domain::ContestType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingState {
    Sampling,
    Completed,
    AbandonedImpossible,
    AbandonedLowConfidence,
    Exhausted,
}

impl SamplingState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Sampling)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sampling => "sampling",
            Self::Completed => "completed",
            Self::AbandonedImpossible => "abandoned_impossible",
            Self::AbandonedLowConfidence => "abandoned_low_confidence",
            Self::Exhausted => "exhausted",
        }
    }
}

impl std::fmt::Display for SamplingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplingPolicyError {
    #[error("success targets must be positive")]
    ZeroTarget,
    #[error("max_attempts must be positive")]
    ZeroCeiling,
    #[error("zero_success_attempts must be in 1..=max_attempts, got {0}")]
    InvalidZeroSuccessBudget(usize),
    #[error("low_confidence_attempts must be in zero_success_attempts..=max_attempts, got {0}")]
    InvalidLowConfidenceBudget(usize),
    #[error("min_success_rate must be in [0, 1], got {0}")]
    InvalidSuccessRate(f64),
}

/// Attempt budgets and exit thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingPolicy {
    pub cash_target: usize,
    pub gpp_target: usize,
    /// Attempts after which a configuration with no success is abandoned.
    pub zero_success_attempts: usize,
    /// Attempts after which the success rate is checked against `min_success_rate`.
    pub low_confidence_attempts: usize,
    pub min_success_rate: f64,
    pub max_attempts: usize,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            cash_target: 30,
            gpp_target: 50,
            zero_success_attempts: 20,
            low_confidence_attempts: 30,
            min_success_rate: 0.15,
            max_attempts: 100,
        }
    }
}

impl SamplingPolicy {
    pub fn target_for(&self, contest_type: ContestType) -> usize {
        match contest_type {
            ContestType::Cash => self.cash_target,
            ContestType::Gpp => self.gpp_target,
        }
    }

    pub fn validate(&self) -> Result<(), SamplingPolicyError> {
        if self.cash_target == 0 || self.gpp_target == 0 {
            return Err(SamplingPolicyError::ZeroTarget);
        }
        if self.max_attempts == 0 {
            return Err(SamplingPolicyError::ZeroCeiling);
        }
        if self.zero_success_attempts == 0 || self.zero_success_attempts > self.max_attempts {
            return Err(SamplingPolicyError::InvalidZeroSuccessBudget(
                self.zero_success_attempts,
            ));
        }
        if self.low_confidence_attempts < self.zero_success_attempts
            || self.low_confidence_attempts > self.max_attempts
        {
            return Err(SamplingPolicyError::InvalidLowConfidenceBudget(
                self.low_confidence_attempts,
            ));
        }
        if !(0.0..=1.0).contains(&self.min_success_rate) {
            return Err(SamplingPolicyError::InvalidSuccessRate(self.min_success_rate));
        }
        Ok(())
    }

    /// State after `attempts` attempts produced `successes` samples.
    pub fn next_state(&self, attempts: usize, successes: usize, target: usize) -> SamplingState {
        if successes >= target {
            return SamplingState::Completed;
        }
        if successes == 0 {
            return if attempts >= self.zero_success_attempts {
                SamplingState::AbandonedImpossible
            } else {
                SamplingState::Sampling
            };
        }
        if attempts >= self.low_confidence_attempts
            && (successes as f64 / attempts as f64) < self.min_success_rate
        {
            return SamplingState::AbandonedLowConfidence;
        }
        if attempts >= self.max_attempts {
            return SamplingState::Exhausted;
        }
        SamplingState::Sampling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SamplingPolicy {
        SamplingPolicy::default()
    }

    #[test]
    fn default_policy_is_valid() {
        assert!(policy().validate().is_ok());
        assert_eq!(policy().target_for(ContestType::Cash), 30);
        assert_eq!(policy().target_for(ContestType::Gpp), 50);
    }

    #[test]
    fn completes_at_target() {
        assert_eq!(policy().next_state(30, 30, 30), SamplingState::Completed);
        assert_eq!(policy().next_state(29, 29, 30), SamplingState::Sampling);
    }

    #[test]
    fn zero_successes_abandon_at_budget() {
        assert_eq!(policy().next_state(19, 0, 30), SamplingState::Sampling);
        assert_eq!(policy().next_state(20, 0, 30), SamplingState::AbandonedImpossible);
    }

    #[test]
    fn low_rate_abandons_only_with_samples() {
        // 4 / 30 = 0.133 < 0.15
        assert_eq!(policy().next_state(29, 4, 50), SamplingState::Sampling);
        assert_eq!(policy().next_state(30, 4, 50), SamplingState::AbandonedLowConfidence);
        // 5 / 30 = 0.167 clears the floor
        assert_eq!(policy().next_state(30, 5, 50), SamplingState::Sampling);
    }

    #[test]
    fn ceiling_exhausts_partial_success() {
        assert_eq!(policy().next_state(100, 40, 50), SamplingState::Exhausted);
        assert_eq!(policy().next_state(99, 40, 50), SamplingState::Sampling);
    }

    #[test]
    fn terminal_states() {
        assert!(!SamplingState::Sampling.is_terminal());
        for s in [
            SamplingState::Completed,
            SamplingState::AbandonedImpossible,
            SamplingState::AbandonedLowConfidence,
            SamplingState::Exhausted,
        ] {
            assert!(s.is_terminal());
        }
    }

    #[test]
    fn rejects_inconsistent_budgets() {
        let p = SamplingPolicy {
            zero_success_attempts: 200,
            ..policy()
        };
        assert_eq!(p.validate(), Err(SamplingPolicyError::InvalidZeroSuccessBudget(200)));

        let p = SamplingPolicy {
            low_confidence_attempts: 10,
            ..policy()
        };
        assert_eq!(p.validate(), Err(SamplingPolicyError::InvalidLowConfidenceBudget(10)));

        let p = SamplingPolicy {
            min_success_rate: 1.5,
            ..policy()
        };
        assert_eq!(p.validate(), Err(SamplingPolicyError::InvalidSuccessRate(1.5)));
    }
}
