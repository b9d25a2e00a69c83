//! Synthetic opponent fields.
//!
//! Each opponent lineup comes from a skill-tier mixture: draw a tier, draw a
//! strategy from that tier's menu for the contest type, perturb the ranking by
//! the tier's noise, and build. Built lineups carry a tier projection factor
//! (sharper players read the slate better). When the attempt budget runs out
//! before the field is full, the remainder is padded with jittered copies of
//! lineups already built.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::builder::{BuildOutcome, LineupBuilder};
use crate::domain::{ContestType, Lineup, PlayerPool, RosterSpec};
use crate::strategy::{RankedCandidates, Strategy};

// ─── Skill tiers ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillTier {
    Sharp,
    Good,
    Average,
    Weak,
}

impl SkillTier {
    pub const ALL: [SkillTier; 4] = [Self::Sharp, Self::Good, Self::Average, Self::Weak];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sharp => "sharp",
            Self::Good => "good",
            Self::Average => "average",
            Self::Weak => "weak",
        }
    }

    /// Range of the multiplicative projection factor applied to this tier's lineups.
    pub fn projection_range(&self) -> (f64, f64) {
        match self {
            Self::Sharp => (1.02, 1.08),
            Self::Good => (0.98, 1.02),
            Self::Average => (0.92, 0.98),
            Self::Weak => (0.75, 0.90),
        }
    }

    /// Half-width of the uniform score noise applied before ranking.
    pub fn ranking_noise(&self) -> f64 {
        match self {
            Self::Sharp => 0.03,
            Self::Good => 0.05,
            Self::Average => 0.20,
            Self::Weak => 0.35,
        }
    }

    /// Share of players this tier badly mis-evaluates.
    pub fn misread_share(&self) -> f64 {
        match self {
            Self::Weak => 0.30,
            _ => 0.0,
        }
    }

    /// Strategy menu (preset name, weight) for a contest type.
    ///
    /// Skilled tiers play value and stacks in cash, correlation and leverage
    /// in GPPs; weak tiers chase salary or raw projection everywhere.
    pub fn strategy_menu(&self, contest_type: ContestType) -> &'static [(&'static str, f64)] {
        match (self, contest_type) {
            (Self::Sharp, ContestType::Cash) => &[
                ("balanced_optimal", 0.4),
                ("value_floor", 0.4),
                ("smart_stack", 0.2),
            ],
            (Self::Sharp, ContestType::Gpp) => &[
                ("smart_stack", 0.35),
                ("ceiling_stack", 0.35),
                ("leverage_theory", 0.30),
            ],
            (Self::Good, ContestType::Cash) => &[("value_floor", 0.5), ("projection_monster", 0.5)],
            (Self::Good, ContestType::Gpp) => &[("ceiling_stack", 0.5), ("projection_monster", 0.5)],
            (Self::Average, _) => &[("projection_monster", 0.6), ("chalk_plus", 0.4)],
            (Self::Weak, _) => &[("salary_max", 0.5), ("projection_monster", 0.5)],
        }
    }
}

/// Mixture weights over skill tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierMix {
    pub sharp: f64,
    pub good: f64,
    pub average: f64,
    pub weak: f64,
}

impl TierMix {
    pub fn cash() -> Self {
        Self {
            sharp: 0.08,
            good: 0.27,
            average: 0.45,
            weak: 0.20,
        }
    }

    pub fn gpp() -> Self {
        Self {
            sharp: 0.05,
            good: 0.15,
            average: 0.50,
            weak: 0.30,
        }
    }

    pub fn weight(&self, tier: SkillTier) -> f64 {
        match tier {
            SkillTier::Sharp => self.sharp,
            SkillTier::Good => self.good,
            SkillTier::Average => self.average,
            SkillTier::Weak => self.weak,
        }
    }

    fn is_valid(&self) -> bool {
        let weights = SkillTier::ALL.map(|t| self.weight(t));
        weights.iter().all(|w| w.is_finite() && *w >= 0.0) && weights.iter().sum::<f64>() > 0.0
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> SkillTier {
        let menu = SkillTier::ALL.map(|t| (t, self.weight(t)));
        *weighted_select(rng, &menu)
    }
}

fn weighted_select<'a, T, R: Rng + ?Sized>(rng: &mut R, menu: &'a [(T, f64)]) -> &'a T {
    let total: f64 = menu.iter().map(|(_, w)| w).sum();
    let mut pick = rng.gen::<f64>() * total;
    for (item, w) in menu {
        pick -= w;
        if pick <= 0.0 {
            return item;
        }
    }
    &menu[menu.len() - 1].0
}

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldConfigError {
    #[error("attempt factor must be at least 1")]
    ZeroAttemptFactor,

    #[error("duplicate jitter must be in [0, 1), got {0}")]
    InvalidJitter(f64),

    #[error("{0} tier mix must have non-negative weights with a positive sum")]
    InvalidMix(ContestType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Build attempts allowed per requested lineup before padding.
    pub attempt_factor: usize,
    /// Half-width of the multiplicative jitter on padded duplicates.
    pub duplicate_jitter: f64,
    pub cash_mix: TierMix,
    pub gpp_mix: TierMix,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            attempt_factor: 3,
            duplicate_jitter: 0.05,
            cash_mix: TierMix::cash(),
            gpp_mix: TierMix::gpp(),
        }
    }
}

impl FieldConfig {
    pub fn mix_for(&self, contest_type: ContestType) -> &TierMix {
        match contest_type {
            ContestType::Cash => &self.cash_mix,
            ContestType::Gpp => &self.gpp_mix,
        }
    }

    pub fn validate(&self) -> Result<(), FieldConfigError> {
        if self.attempt_factor == 0 {
            return Err(FieldConfigError::ZeroAttemptFactor);
        }
        if !(0.0..1.0).contains(&self.duplicate_jitter) {
            return Err(FieldConfigError::InvalidJitter(self.duplicate_jitter));
        }
        for ct in [ContestType::Cash, ContestType::Gpp] {
            if !self.mix_for(ct).is_valid() {
                return Err(FieldConfigError::InvalidMix(ct));
            }
        }
        Ok(())
    }
}

// ─── Generator ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStats {
    pub built: usize,
    pub retries: usize,
    pub padded: usize,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub lineups: Vec<Lineup>,
    pub stats: FieldStats,
}

impl Field {
    pub fn len(&self) -> usize {
        self.lineups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lineups.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FieldGenerator {
    config: FieldConfig,
    builder: LineupBuilder,
    strategies: HashMap<&'static str, Strategy>,
}

impl Default for FieldGenerator {
    fn default() -> Self {
        Self::new(FieldConfig::default())
    }
}

impl FieldGenerator {
    pub fn new(config: FieldConfig) -> Self {
        let strategies = Strategy::PRESET_NAMES
            .iter()
            .filter_map(|&name| Strategy::preset(name).map(|s| (name, s)))
            .collect();
        Self {
            config,
            builder: LineupBuilder::heuristic_only(),
            strategies,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Generate `count` opponent lineups. Best effort: the field is exactly
    /// `count` long unless nothing at all could be built.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        pool: &PlayerPool,
        spec: &RosterSpec,
        contest_type: ContestType,
        count: usize,
        rng: &mut R,
    ) -> Field {
        let mut lineups = Vec::with_capacity(count);
        let mut stats = FieldStats::default();
        let mix = self.config.mix_for(contest_type);
        let budget = count.saturating_mul(self.config.attempt_factor);
        let mut rankings: HashMap<&'static str, RankedCandidates> = HashMap::new();

        let mut attempts = 0;
        while lineups.len() < count && attempts < budget {
            attempts += 1;
            let tier = mix.draw(rng);
            let name = *weighted_select(rng, tier.strategy_menu(contest_type));
            let Some(strategy) = self.strategies.get(name) else {
                stats.retries += 1;
                continue;
            };
            let base = rankings
                .entry(name)
                .or_insert_with(|| strategy.narrow_and_rank(pool));
            let ranked = base.perturbed(tier.ranking_noise(), tier.misread_share(), rng);

            match self.builder.build_ranked(spec, &ranked) {
                BuildOutcome::Built(lineup) => {
                    let (lo, hi) = tier.projection_range();
                    let factor = rng.gen_range(lo..=hi);
                    lineups.push(lineup.rescaled(factor, 1.0));
                    stats.built += 1;
                }
                BuildOutcome::Infeasible(reason) => {
                    debug!(tier = tier.label(), strategy = name, %reason, "field lineup infeasible");
                    stats.retries += 1;
                }
            }
        }

        if lineups.len() < count {
            if lineups.is_empty() {
                warn!(requested = count, attempts, "no field lineup could be built");
            } else {
                let built = lineups.len();
                warn!(requested = count, built, "padding field with jittered duplicates");
                let j = self.config.duplicate_jitter;
                while lineups.len() < count {
                    let source = &lineups[rng.gen_range(0..built)];
                    let (proj, own) = if j > 0.0 {
                        (rng.gen_range(1.0 - j..=1.0 + j), rng.gen_range(1.0 - j..=1.0 + j))
                    } else {
                        (1.0, 1.0)
                    };
                    let copy = source.rescaled(proj, own);
                    lineups.push(copy);
                    stats.padded += 1;
                }
            }
        }

        Field { lineups, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContestFormat, PlayerId};
    use crate::slate::{SlateGenerator, SlateSize};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_tier_menu_names_a_preset() {
        for tier in SkillTier::ALL {
            for ct in [ContestType::Cash, ContestType::Gpp] {
                let menu = tier.strategy_menu(ct);
                let total: f64 = menu.iter().map(|(_, w)| w).sum();
                assert!((total - 1.0).abs() < 1e-9);
                for (name, _) in menu {
                    assert!(Strategy::preset(name).is_some(), "{name}");
                }
            }
        }
    }

    #[test]
    fn tier_mix_respects_weights() {
        let mix = TierMix {
            sharp: 0.0,
            good: 0.0,
            average: 1.0,
            weak: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!((0..200).all(|_| mix.draw(&mut rng) == SkillTier::Average));
    }

    #[test]
    fn generates_requested_size() {
        let slate = SlateGenerator::new(7)
            .generate(1, ContestFormat::Classic, SlateSize::Medium)
            .unwrap();
        let spec = RosterSpec::classic();
        let field = FieldGenerator::default().generate(
            &slate.pool,
            &spec,
            ContestType::Gpp,
            40,
            &mut StdRng::seed_from_u64(2),
        );
        assert_eq!(field.len(), 40);
        assert_eq!(field.stats.built + field.stats.padded, 40);
        for lineup in &field.lineups {
            assert!(lineup.total_salary() <= spec.salary_cap);
            assert_eq!(lineup.len(), spec.roster_size());
        }
    }

    #[test]
    fn attempt_budget_accounting_adds_up() {
        let slate = SlateGenerator::new(7)
            .generate(2, ContestFormat::Classic, SlateSize::Small)
            .unwrap();
        let config = FieldConfig {
            attempt_factor: 1,
            ..FieldConfig::default()
        };
        // one attempt per lineup, so every retry becomes a padded copy
        let mut rng = StdRng::seed_from_u64(3);
        let field = FieldGenerator::new(config).generate(&slate.pool, &RosterSpec::classic(), ContestType::Cash, 25, &mut rng);
        assert_eq!(field.len(), 25);
        assert_eq!(field.stats.built + field.stats.padded, 25);
        assert_eq!(field.stats.built + field.stats.retries, 25);
    }

    #[test]
    fn unbuildable_spec_yields_empty_field() {
        let slate = SlateGenerator::new(7)
            .generate(3, ContestFormat::Classic, SlateSize::Small)
            .unwrap();
        let mut spec = RosterSpec::classic();
        spec.salary_cap = 1_000;
        let field = FieldGenerator::default().generate(
            &slate.pool,
            &spec,
            ContestType::Cash,
            10,
            &mut StdRng::seed_from_u64(4),
        );
        assert!(field.is_empty());
        assert_eq!(field.stats.retries, 30);
    }

    #[test]
    fn same_seed_same_field() {
        let slate = SlateGenerator::new(9)
            .generate(4, ContestFormat::Showdown, SlateSize::Small)
            .unwrap();
        let spec = RosterSpec::showdown();
        let generator = FieldGenerator::default();
        let ids = |seed: u64| -> Vec<Vec<PlayerId>> {
            generator
                .generate(&slate.pool, &spec, ContestType::Gpp, 15, &mut StdRng::seed_from_u64(seed))
                .lineups
                .iter()
                .map(|l| l.player_ids())
                .collect()
        };
        assert_eq!(ids(5), ids(5));
    }

    #[test]
    fn rejects_bad_config() {
        let config = FieldConfig {
            attempt_factor: 0,
            ..FieldConfig::default()
        };
        assert_eq!(config.validate(), Err(FieldConfigError::ZeroAttemptFactor));
        let config = FieldConfig {
            duplicate_jitter: 1.5,
            ..FieldConfig::default()
        };
        assert!(matches!(config.validate(), Err(FieldConfigError::InvalidJitter(_))));
    }
}
