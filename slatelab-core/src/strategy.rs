//! Named, pure strategy configurations that narrow and rank a player pool.
//!
//! A strategy is a ranking [`Metric`] plus an [`Overlay`] of extra constraints.
//! [`Strategy::narrow_and_rank`] applies the overlay's filters and scores every
//! surviving player; the overlay's stack requirement travels with the result so
//! the builder can enforce it.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{Player, PlayerId, PlayerPool};

/// Weights for a blended metric. Missing weights are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    pub projection: f64,
    pub value: f64,
    pub ceiling: f64,
    pub floor: f64,
    pub leverage: f64,
}

/// What a strategy ranks players by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Metric {
    Projection,
    /// Points per $1,000.
    Value,
    Ceiling,
    Floor,
    /// Raw salary: spends the cap without regard to output.
    Salary,
    /// Ceiling discounted by projected ownership.
    Leverage,
    Blend(BlendWeights),
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Projection => "projection",
            Self::Value => "value",
            Self::Ceiling => "ceiling",
            Self::Floor => "floor",
            Self::Salary => "salary",
            Self::Leverage => "leverage",
            Self::Blend(_) => "blend",
        }
    }

    pub fn score(&self, p: &Player) -> f64 {
        match self {
            Self::Projection => p.projection,
            Self::Value => p.value(),
            Self::Ceiling => p.ceiling,
            Self::Floor => p.floor,
            Self::Salary => p.salary as f64 / 1000.0,
            Self::Leverage => leverage(p),
            Self::Blend(w) => {
                w.projection * p.projection
                    + w.value * p.value()
                    + w.ceiling * p.ceiling
                    + w.floor * p.floor
                    + w.leverage * leverage(p)
            }
        }
    }
}

fn leverage(p: &Player) -> f64 {
    p.ceiling * (1.0 - p.ownership / 100.0)
}

/// Constraints and filters layered on top of the base roster rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overlay {
    /// Minimum hitters from one team.
    pub stack_size: Option<usize>,
    /// Stack hitters must occupy consecutive batting-order spots.
    pub consecutive_batting: bool,
    pub ownership_floor: Option<f64>,
    pub ownership_ceiling: Option<f64>,
    /// Players whose game total is unknown or below this are dropped.
    pub min_game_total: Option<f64>,
}

impl Overlay {
    pub fn admits(&self, p: &Player) -> bool {
        if self.ownership_floor.is_some_and(|floor| p.ownership < floor) {
            return false;
        }
        if self.ownership_ceiling.is_some_and(|ceil| p.ownership > ceil) {
            return false;
        }
        if let Some(min_total) = self.min_game_total {
            if p.game_total.map_or(true, |total| total < min_total) {
                return false;
            }
        }
        true
    }

    pub fn stack(&self) -> Option<StackRequirement> {
        self.stack_size.filter(|&size| size > 1).map(|size| StackRequirement {
            size,
            consecutive: self.consecutive_batting,
        })
    }
}

/// Same-team hitter block a lineup must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRequirement {
    pub size: usize,
    pub consecutive: bool,
}

/// A scored player.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub player: Arc<Player>,
    pub score: f64,
}

/// Output of [`Strategy::narrow_and_rank`]: candidates sorted by score
/// descending (ties broken by player id) plus the stack requirement.
#[derive(Debug, Clone, Default)]
pub struct RankedCandidates {
    pub candidates: Vec<Candidate>,
    pub stack: Option<StackRequirement>,
}

impl RankedCandidates {
    pub fn new(mut candidates: Vec<Candidate>, stack: Option<StackRequirement>) -> Self {
        sort_candidates(&mut candidates);
        Self { candidates, stack }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn score_of(&self, id: PlayerId) -> Option<f64> {
        self.candidates
            .iter()
            .find(|c| c.player.id == id)
            .map(|c| c.score)
    }

    /// Re-rank with multiplicative noise.
    ///
    /// Every score is scaled by `U(1 - noise, 1 + noise)`; a `misread_share`
    /// fraction of players is additionally scaled by `U(0.3, 1.7)`.
    pub fn perturbed(&self, noise: f64, misread_share: f64, rng: &mut (impl Rng + ?Sized)) -> Self {
        let candidates = self
            .candidates
            .iter()
            .map(|c| {
                let mut score = c.score;
                if noise > 0.0 {
                    score *= rng.gen_range(1.0 - noise..=1.0 + noise);
                }
                if misread_share > 0.0 && rng.gen_bool(misread_share.min(1.0)) {
                    score *= rng.gen_range(0.3..=1.7);
                }
                Candidate {
                    player: c.player.clone(),
                    score,
                }
            })
            .collect();
        Self::new(candidates, self.stack)
    }
}

fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.player.id.cmp(&b.player.id))
    });
}

/// A named ranking metric plus overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub metric: Metric,
    #[serde(default)]
    pub overlay: Overlay,
}

impl Strategy {
    pub fn new(name: impl Into<String>, metric: Metric) -> Self {
        Self {
            name: name.into(),
            metric,
            overlay: Overlay::default(),
        }
    }

    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = overlay;
        self
    }

    /// Filter the pool through the overlay and rank survivors by the metric.
    pub fn narrow_and_rank(&self, pool: &PlayerPool) -> RankedCandidates {
        let candidates = pool
            .players()
            .iter()
            .filter(|p| self.overlay.admits(p))
            .map(|p| Candidate {
                player: p.clone(),
                score: self.metric.score(p),
            })
            .collect();
        RankedCandidates::new(candidates, self.overlay.stack())
    }

    /// Names of the built-in presets, in catalogue order.
    pub const PRESET_NAMES: [&str; 11] = [
        "projection_monster",
        "value_floor",
        "balanced_optimal",
        "chalk_plus",
        "salary_max",
        "smart_stack",
        "ceiling_stack",
        "five_stack",
        "game_stack",
        "leverage_theory",
        "contrarian_correlation",
    ];

    /// Look up a built-in preset by name.
    pub fn preset(name: &str) -> Option<Strategy> {
        let stack = |size: usize, consecutive: bool| Overlay {
            stack_size: Some(size),
            consecutive_batting: consecutive,
            ..Overlay::default()
        };

        let strategy = match name {
            "projection_monster" => Self::new(name, Metric::Projection),
            "value_floor" => Self::new(
                name,
                Metric::Blend(BlendWeights {
                    projection: 0.5,
                    value: 2.0,
                    floor: 0.5,
                    ..BlendWeights::default()
                }),
            ),
            "balanced_optimal" => Self::new(
                name,
                Metric::Blend(BlendWeights {
                    projection: 1.0,
                    value: 1.0,
                    floor: 0.25,
                    ..BlendWeights::default()
                }),
            ),
            "chalk_plus" => Self::new(name, Metric::Projection).with_overlay(Overlay {
                ownership_floor: Some(3.0),
                ..Overlay::default()
            }),
            "salary_max" => Self::new(name, Metric::Salary),
            "smart_stack" => Self::new(name, Metric::Projection).with_overlay(stack(4, true)),
            "ceiling_stack" => Self::new(name, Metric::Ceiling).with_overlay(stack(4, false)),
            "five_stack" => Self::new(name, Metric::Projection).with_overlay(stack(5, false)),
            "game_stack" => Self::new(name, Metric::Projection).with_overlay(Overlay {
                min_game_total: Some(9.0),
                ..stack(4, false)
            }),
            "leverage_theory" => Self::new(name, Metric::Leverage).with_overlay(Overlay {
                ownership_ceiling: Some(25.0),
                ..Overlay::default()
            }),
            "contrarian_correlation" => Self::new(name, Metric::Leverage).with_overlay(Overlay {
                ownership_ceiling: Some(20.0),
                ..stack(3, false)
            }),
            _ => return None,
        };
        Some(strategy)
    }

    /// Every built-in preset.
    pub fn presets() -> Vec<Strategy> {
        Self::PRESET_NAMES
            .iter()
            .filter_map(|name| Self::preset(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Position;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn player(id: u32, projection: f64, salary: u32, ownership: f64, game_total: Option<f64>) -> Player {
        Player {
            id: PlayerId(id),
            name: format!("p{id}"),
            positions: vec![Position::Outfield],
            team: "NYY".into(),
            salary,
            projection,
            ownership,
            ceiling: projection * 2.0,
            floor: projection * 0.3,
            batting_order: 1,
            game_id: 1,
            team_total: None,
            game_total,
        }
    }

    fn pool() -> PlayerPool {
        PlayerPool::new(vec![
            player(1, 10.0, 5000, 30.0, Some(10.0)),
            player(2, 8.0, 2500, 5.0, Some(8.0)),
            player(3, 6.0, 3000, 15.0, None),
        ])
        .unwrap()
    }

    #[test]
    fn projection_ranks_descending() {
        let ranked = Strategy::new("p", Metric::Projection).narrow_and_rank(&pool());
        let ids: Vec<u32> = ranked.iter().map(|c| c.player.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(ranked.stack.is_none());
    }

    #[test]
    fn value_prefers_cheap_production() {
        let ranked = Strategy::new("v", Metric::Value).narrow_and_rank(&pool());
        assert_eq!(ranked.candidates[0].player.id, PlayerId(2));
    }

    #[test]
    fn ownership_filters_apply() {
        let overlay = Overlay {
            ownership_floor: Some(10.0),
            ownership_ceiling: Some(20.0),
            ..Overlay::default()
        };
        let ranked = Strategy::new("o", Metric::Projection)
            .with_overlay(overlay)
            .narrow_and_rank(&pool());
        let ids: Vec<u32> = ranked.iter().map(|c| c.player.id.0).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn game_total_filter_drops_unknown_totals() {
        let overlay = Overlay {
            min_game_total: Some(7.5),
            ..Overlay::default()
        };
        let ranked = Strategy::new("g", Metric::Projection)
            .with_overlay(overlay)
            .narrow_and_rank(&pool());
        let ids: Vec<u32> = ranked.iter().map(|c| c.player.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn blend_combines_weights() {
        let p = player(1, 10.0, 5000, 0.0, None);
        let m = Metric::Blend(BlendWeights {
            projection: 1.0,
            value: 1.0,
            ..BlendWeights::default()
        });
        assert!((m.score(&p) - 12.0).abs() < 1e-12);
        assert!((Metric::Leverage.score(&p) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn stack_requirement_ignores_trivial_sizes() {
        let overlay = Overlay {
            stack_size: Some(1),
            ..Overlay::default()
        };
        assert!(overlay.stack().is_none());
        let overlay = Overlay {
            stack_size: Some(4),
            consecutive_batting: true,
            ..Overlay::default()
        };
        assert_eq!(
            overlay.stack(),
            Some(StackRequirement {
                size: 4,
                consecutive: true
            })
        );
    }

    #[test]
    fn every_preset_resolves() {
        let presets = Strategy::presets();
        assert_eq!(presets.len(), Strategy::PRESET_NAMES.len());
        for (preset, name) in presets.iter().zip(Strategy::PRESET_NAMES) {
            assert_eq!(preset.name, name);
        }
        assert!(Strategy::preset("moonshot").is_none());
    }

    #[test]
    fn perturbed_is_reproducible_and_resorted() {
        let ranked = Strategy::new("p", Metric::Projection).narrow_and_rank(&pool());
        let a = ranked.perturbed(0.3, 0.3, &mut StdRng::seed_from_u64(5));
        let b = ranked.perturbed(0.3, 0.3, &mut StdRng::seed_from_u64(5));
        let ids_a: Vec<PlayerId> = a.iter().map(|c| c.player.id).collect();
        let ids_b: Vec<PlayerId> = b.iter().map(|c| c.player.id).collect();
        assert_eq!(ids_a, ids_b);
        assert!(a.candidates.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn strategy_deserializes_from_json() {
        let json = r#"{"name":"mix","metric":{"type":"blend","projection":1.0,"ceiling":0.5},
                       "overlay":{"stack_size":4}}"#;
        let s: Strategy = serde_json::from_str(json).unwrap();
        assert_eq!(s.overlay.stack_size, Some(4));
        match s.metric {
            Metric::Blend(w) => {
                assert_eq!(w.ceiling, 0.5);
                assert_eq!(w.value, 0.0);
            }
            other => panic!("unexpected metric {other:?}"),
        }
    }
}
