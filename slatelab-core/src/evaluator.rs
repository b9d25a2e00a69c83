//! Contest evaluation: rank one score against a field and compute payout.
//!
//! With `N = field_scores.len() + 1` entrants:
//! - rank = 1 + number of field scores strictly greater than own score
//! - percentile = (N - rank) / N * 100
//! - cash pays `multiplier * entry_fee` when percentile >= (1 - threshold) * 100
//! - GPP pays `entry_fee * multiplier` of the first band (ascending) whose
//!   upper bound is >= rank / N
//! - profit = payout - entry_fee, roi = profit / entry_fee * 100

use serde::{Deserialize, Serialize};

use crate::domain::{Contest, PayoutStructure};

/// Tolerance for boundary comparisons on computed fractions.
const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContestOutcome {
    pub rank: usize,
    pub entrants: usize,
    pub percentile: f64,
    pub payout: f64,
    pub profit: f64,
    pub roi: f64,
}

impl ContestOutcome {
    pub fn cashed(&self) -> bool {
        self.payout > 0.0
    }

    /// Finishing position as a fraction of the field, in (0, 1].
    pub fn top_share(&self) -> f64 {
        self.rank as f64 / self.entrants as f64
    }
}

/// Rank of `own_score` among `field_scores` plus itself. Ties share the better rank.
pub fn rank_of(own_score: f64, field_scores: &[f64]) -> usize {
    1 + field_scores.iter().filter(|&&s| s > own_score).count()
}

pub fn evaluate(own_score: f64, field_scores: &[f64], contest: &Contest) -> ContestOutcome {
    let entrants = field_scores.len() + 1;
    let rank = rank_of(own_score, field_scores);
    let percentile = (entrants - rank) as f64 / entrants as f64 * 100.0;
    let fee = contest.entry_fee;

    let payout = match &contest.payout {
        PayoutStructure::Cash {
            threshold,
            multiplier,
        } => {
            if percentile + EPS >= (1.0 - threshold) * 100.0 {
                fee * multiplier
            } else {
                0.0
            }
        }
        PayoutStructure::Gpp { bands } => {
            let share = rank as f64 / entrants as f64;
            bands
                .iter()
                .find(|b| b.upper + EPS >= share)
                .map_or(0.0, |b| fee * b.multiplier)
        }
    };

    let profit = payout - fee;
    ContestOutcome {
        rank,
        entrants,
        percentile,
        payout,
        profit,
        roi: profit / fee * 100.0,
    }
}
