//! Stochastic lineup scoring.
//!
//! One draw per call. Each player's outcome comes from a mixture of outcome
//! bands (bust / poor / normal / good / ceiling) normalized so the expected
//! multiplier is 1.0, widened or narrowed per role. Teammates share one team
//! multiplier per draw, large same-team hitter stacks boom or bust together,
//! and the total is clamped to a multiple of the lineup's projection.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Lineup;

// ─── Model ───────────────────────────────────────────────────────────

/// One outcome band: chosen with probability proportional to `weight`, then
/// a raw multiplier is drawn uniformly from `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeBand {
    pub weight: f64,
    pub low: f64,
    pub high: f64,
}

impl OutcomeBand {
    const fn new(weight: f64, low: f64, high: f64) -> Self {
        Self { weight, low, high }
    }

    fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringModelError {
    #[error("scoring model has no outcome bands")]
    NoBands,

    #[error("outcome band {0} is invalid (weight must be positive, 0 <= low <= high)")]
    InvalidBand(usize),

    #[error("role spread must be positive and finite")]
    InvalidSpread,

    #[error("team multiplier bounds must satisfy 0 < low <= 1 <= high")]
    InvalidTeamBounds,

    #[error("stack boom/bust probabilities must sum to at most 1")]
    InvalidStackOdds,

    #[error("clamp must satisfy 0 <= floor < ceiling")]
    InvalidClamp,
}

/// Parameters of the scoring model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringModel {
    /// Bust / poor / normal / good / ceiling.
    pub bands: Vec<OutcomeBand>,
    /// Deviation from the mean is multiplied by this for pitchers.
    pub pitcher_spread: f64,
    pub hitter_spread: f64,
    /// Standard deviation of the shared per-team multiplier around 1.0.
    pub team_sigma: f64,
    pub team_bounds: (f64, f64),
    /// Same-team hitter count at which the stack adjustment applies.
    pub stack_threshold: usize,
    pub stack_boom_probability: f64,
    pub stack_boom: (f64, f64),
    pub stack_bust_probability: f64,
    pub stack_bust: (f64, f64),
    /// Realized total is clamped to `[floor, ceiling] * projection`.
    pub clamp: (f64, f64),
}

impl Default for ScoringModel {
    fn default() -> Self {
        Self {
            bands: vec![
                OutcomeBand::new(0.08, 0.0, 0.3),
                OutcomeBand::new(0.17, 0.4, 0.8),
                OutcomeBand::new(0.50, 0.8, 1.2),
                OutcomeBand::new(0.17, 1.2, 1.6),
                OutcomeBand::new(0.08, 1.8, 3.0),
            ],
            pitcher_spread: 1.25,
            hitter_spread: 1.0,
            team_sigma: 0.12,
            team_bounds: (0.6, 1.5),
            stack_threshold: 4,
            stack_boom_probability: 0.25,
            stack_boom: (1.15, 1.35),
            stack_bust_probability: 0.25,
            stack_bust: (0.65, 0.85),
            clamp: (0.2, 3.0),
        }
    }
}

impl ScoringModel {
    pub fn validate(&self) -> Result<(), ScoringModelError> {
        if self.bands.is_empty() {
            return Err(ScoringModelError::NoBands);
        }
        for (i, b) in self.bands.iter().enumerate() {
            let ok = b.weight.is_finite() && b.weight > 0.0 && b.low >= 0.0 && b.low <= b.high && b.high.is_finite();
            if !ok {
                return Err(ScoringModelError::InvalidBand(i));
            }
        }
        if self.band_mean() <= 0.0 {
            return Err(ScoringModelError::InvalidBand(0));
        }
        for spread in [self.pitcher_spread, self.hitter_spread] {
            if !spread.is_finite() || spread <= 0.0 {
                return Err(ScoringModelError::InvalidSpread);
            }
        }
        let (lo, hi) = self.team_bounds;
        if !(lo > 0.0 && lo <= 1.0 && hi >= 1.0 && hi.is_finite()) || self.team_sigma < 0.0 {
            return Err(ScoringModelError::InvalidTeamBounds);
        }
        let odds = self.stack_boom_probability + self.stack_bust_probability;
        if self.stack_boom_probability < 0.0 || self.stack_bust_probability < 0.0 || odds > 1.0 {
            return Err(ScoringModelError::InvalidStackOdds);
        }
        let (floor, ceiling) = self.clamp;
        if !(floor >= 0.0 && floor < ceiling && ceiling.is_finite()) {
            return Err(ScoringModelError::InvalidClamp);
        }
        Ok(())
    }

    /// Expected raw band multiplier.
    fn band_mean(&self) -> f64 {
        let total: f64 = self.bands.iter().map(|b| b.weight).sum();
        self.bands.iter().map(|b| b.weight * b.midpoint()).sum::<f64>() / total
    }
}

// ─── Simulator ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ScoringSimulator {
    model: ScoringModel,
    band_mean: f64,
    band_total: f64,
}

impl ScoringSimulator {
    pub fn new(model: ScoringModel) -> Result<Self, ScoringModelError> {
        model.validate()?;
        Ok(Self::from_valid(model))
    }

    fn from_valid(model: ScoringModel) -> Self {
        let band_mean = model.band_mean();
        let band_total = model.bands.iter().map(|b| b.weight).sum();
        Self {
            model,
            band_mean,
            band_total,
        }
    }

    pub fn model(&self) -> &ScoringModel {
        &self.model
    }

    /// Draw one realized score for `lineup`.
    pub fn simulate<R: Rng + ?Sized>(&self, lineup: &Lineup, rng: &mut R) -> f64 {
        let m = &self.model;

        // Team multipliers, drawn in first-appearance order so the stream
        // consumption is fixed for a given lineup.
        let mut team_mult: HashMap<&str, f64> = HashMap::new();
        for e in lineup.entries() {
            team_mult.entry(e.player.team.as_str()).or_insert_with(|| {
                let draw = 1.0 + m.team_sigma * standard_normal(rng);
                draw.clamp(m.team_bounds.0, m.team_bounds.1)
            });
        }

        // Stack adjustment per qualifying team.
        let mut stack_mult: HashMap<&str, f64> = HashMap::new();
        for (team, count) in lineup.hitter_stacks() {
            if count >= m.stack_threshold {
                stack_mult.insert(team, self.draw_stack(rng));
            }
        }

        let mut total = 0.0;
        for e in lineup.entries() {
            let p = &e.player;
            let spread = if p.is_pitcher() {
                m.pitcher_spread
            } else {
                m.hitter_spread
            };
            let raw = self.draw_band(rng);
            let individual = (1.0 + (raw / self.band_mean - 1.0) * spread).max(0.0);
            let team = team_mult.get(p.team.as_str()).copied().unwrap_or(1.0);
            let stack = if p.is_hitter() {
                stack_mult.get(p.team.as_str()).copied().unwrap_or(1.0)
            } else {
                1.0
            };
            total += p.projection * individual * team * stack * lineup.multiplier_for(e);
        }
        total *= lineup.projection_scale();

        let projection = lineup.total_projection();
        total.clamp(m.clamp.0 * projection, m.clamp.1 * projection)
    }

    /// `n` independent draws from one stream.
    pub fn simulate_many<R: Rng + ?Sized>(&self, lineup: &Lineup, n: usize, rng: &mut R) -> Vec<f64> {
        (0..n).map(|_| self.simulate(lineup, rng)).collect()
    }

    fn draw_band<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let mut pick = rng.gen::<f64>() * self.band_total;
        let bands = &self.model.bands;
        let mut chosen = bands[bands.len() - 1];
        for b in bands {
            if pick < b.weight {
                chosen = *b;
                break;
            }
            pick -= b.weight;
        }
        if chosen.high > chosen.low {
            rng.gen_range(chosen.low..chosen.high)
        } else {
            chosen.low
        }
    }

    fn draw_stack<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let m = &self.model;
        let roll: f64 = rng.gen();
        let uniform = |rng: &mut R, (lo, hi): (f64, f64)| {
            if hi > lo {
                rng.gen_range(lo..hi)
            } else {
                lo
            }
        };
        if roll < m.stack_boom_probability {
            uniform(rng, m.stack_boom)
        } else if roll < m.stack_boom_probability + m.stack_bust_probability {
            uniform(rng, m.stack_bust)
        } else {
            1.0
        }
    }
}

impl Default for ScoringSimulator {
    fn default() -> Self {
        Self::from_valid(ScoringModel::default())
    }
}

/// Standard normal draw via Box-Muller.
pub(crate) fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Assignment, Player, PlayerId, Position, RosterEntry, RosterSpec, Slot};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn showdown_lineup() -> Lineup {
        let mk = |id: u32, team: &str, pos: Position, projection: f64| {
            Arc::new(Player {
                id: PlayerId(id),
                name: format!("{id}"),
                positions: vec![pos],
                team: team.into(),
                salary: 6000,
                projection,
                ownership: 10.0,
                ceiling: projection * 2.0,
                floor: projection * 0.3,
                batting_order: if pos == Position::Pitcher { 0 } else { id as u8 },
                game_id: 1,
                team_total: None,
                game_total: None,
            })
        };
        let entries = vec![
            RosterEntry::new(mk(1, "NYY", Position::Outfield, 10.0), Assignment::Captain),
            RosterEntry::new(mk(2, "NYY", Position::FirstBase, 8.0), Assignment::Slot(Slot::Flex)),
            RosterEntry::new(mk(3, "NYY", Position::ShortStop, 7.0), Assignment::Slot(Slot::Flex)),
            RosterEntry::new(mk(4, "NYY", Position::Catcher, 6.0), Assignment::Slot(Slot::Flex)),
            RosterEntry::new(mk(5, "BOS", Position::Pitcher, 18.0), Assignment::Slot(Slot::Flex)),
            RosterEntry::new(mk(6, "BOS", Position::Outfield, 7.5), Assignment::Slot(Slot::Flex)),
        ];
        Lineup::new(entries, &RosterSpec::showdown()).unwrap()
    }

    #[test]
    fn default_model_is_valid_and_unit_mean() {
        let model = ScoringModel::default();
        model.validate().unwrap();
        let sim = ScoringSimulator::new(model).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| sim.draw_band(&mut rng) / sim.band_mean).sum::<f64>() / n as f64;
        assert!((mean - 1.0).abs() < 0.02, "mean multiplier {mean}");
    }

    #[test]
    fn same_seed_same_score() {
        let sim = ScoringSimulator::default();
        let lineup = showdown_lineup();
        let a = sim.simulate(&lineup, &mut StdRng::seed_from_u64(9));
        let b = sim.simulate(&lineup, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn draws_stay_inside_clamp() {
        let sim = ScoringSimulator::default();
        let lineup = showdown_lineup();
        let projection = lineup.total_projection();
        let mut rng = StdRng::seed_from_u64(3);
        for score in sim.simulate_many(&lineup, 2000, &mut rng) {
            assert!(score >= 0.2 * projection - 1e-9);
            assert!(score <= 3.0 * projection + 1e-9);
        }
    }

    #[test]
    fn projection_scale_shifts_scores() {
        let sim = ScoringSimulator::default();
        let lineup = showdown_lineup();
        let boosted = lineup.rescaled(1.5, 1.0);
        let a = sim.simulate(&lineup, &mut StdRng::seed_from_u64(4));
        let b = sim.simulate(&boosted, &mut StdRng::seed_from_u64(4));
        assert!((b - a * 1.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_models() {
        let mut model = ScoringModel::default();
        model.bands.clear();
        assert_eq!(model.validate(), Err(ScoringModelError::NoBands));

        let mut model = ScoringModel::default();
        model.clamp = (2.0, 1.0);
        assert_eq!(model.validate(), Err(ScoringModelError::InvalidClamp));

        let mut model = ScoringModel::default();
        model.stack_boom_probability = 0.8;
        assert_eq!(model.validate(), Err(ScoringModelError::InvalidStackOdds));
    }

    #[test]
    fn normal_draws_are_centered() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.03);
        assert!((var - 1.0).abs() < 0.05);
    }
}
