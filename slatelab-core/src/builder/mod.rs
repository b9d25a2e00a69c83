//! Lineup builder: pre-flight feasibility check, exact branch-and-bound
//! solver with a hard time limit, and the scarcity-first heuristic.
//!
//! Infeasibility is a value ([`BuildOutcome::Infeasible`]), never an error.
//! An exact-solver timeout is handled here by falling back to the heuristic.

pub mod exact;
pub mod heuristic;
pub mod preflight;
pub mod stack;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Lineup, PlayerPool, RosterSpec, Slot};
use crate::strategy::{RankedCandidates, Strategy};

pub use exact::ExactSolver;
pub use heuristic::HeuristicBuilder;

/// Why no lineup could be built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InfeasibleReason {
    InvalidRoster { message: String },
    TooFewCandidates { available: usize, required: usize },
    PositionShortage {
        slot: Slot,
        available: usize,
        required: usize,
    },
    SalaryFloor { minimum: u64, cap: u32 },
    TooFewTeams { available: usize, required: usize },
    TeamCapacity { capacity: usize, required: usize },
    StackExceedsTeamLimit { size: usize, limit: usize },
    NoStackableTeam { size: usize, consecutive: bool },
    NoFeasibleCombination,
}

impl InfeasibleReason {
    /// Short stable key, used to bucket failure counts.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRoster { .. } => "invalid_roster",
            Self::TooFewCandidates { .. } => "too_few_candidates",
            Self::PositionShortage { .. } => "position_shortage",
            Self::SalaryFloor { .. } => "salary_floor",
            Self::TooFewTeams { .. } => "too_few_teams",
            Self::TeamCapacity { .. } => "team_capacity",
            Self::StackExceedsTeamLimit { .. } => "stack_exceeds_team_limit",
            Self::NoStackableTeam { .. } => "no_stackable_team",
            Self::NoFeasibleCombination => "no_feasible_combination",
        }
    }
}

impl fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRoster { message } => write!(f, "invalid roster spec: {message}"),
            Self::TooFewCandidates {
                available,
                required,
            } => write!(f, "{available} candidates for a {required}-player roster"),
            Self::PositionShortage {
                slot,
                available,
                required,
            } => write!(f, "{available} candidates for {required} {slot} slot(s)"),
            Self::SalaryFloor { minimum, cap } => {
                write!(f, "cheapest roster costs {minimum}, cap is {cap}")
            }
            Self::TooFewTeams {
                available,
                required,
            } => write!(f, "{available} teams available, {required} required"),
            Self::TeamCapacity { capacity, required } => write!(
                f,
                "team limits allow {capacity} players, roster needs {required}"
            ),
            Self::StackExceedsTeamLimit { size, limit } => {
                write!(f, "stack of {size} exceeds per-team limit {limit}")
            }
            Self::NoStackableTeam { size, consecutive } => {
                if *consecutive {
                    write!(f, "no team has {size} consecutive eligible hitters")
                } else {
                    write!(f, "no team has {size} eligible hitters")
                }
            }
            Self::NoFeasibleCombination => f.write_str("no feasible combination found"),
        }
    }
}

/// Result of a build.
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    Built(Lineup),
    Infeasible(InfeasibleReason),
}

impl BuildOutcome {
    pub fn is_built(&self) -> bool {
        matches!(self, Self::Built(_))
    }

    pub fn lineup(&self) -> Option<&Lineup> {
        match self {
            Self::Built(l) => Some(l),
            Self::Infeasible(_) => None,
        }
    }

    pub fn into_lineup(self) -> Option<Lineup> {
        match self {
            Self::Built(l) => Some(l),
            Self::Infeasible(_) => None,
        }
    }
}

/// Outcome of a single solver run.
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Solved(Lineup),
    /// The solver proved (exact) or concluded (heuristic) there is no lineup.
    NoSolution,
    /// The search hit its budget. `incumbent` is the best lineup seen so far.
    TimedOut { incumbent: Option<Lineup> },
}

/// A roster-assignment solver. Both implementations satisfy the same
/// contract: any returned lineup meets every roster and stack constraint.
pub trait LineupSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, spec: &RosterSpec, ranked: &RankedCandidates) -> SolveOutcome;
}

/// Builds one lineup per call: pre-flight, exact search, heuristic fallback.
#[derive(Debug, Clone)]
pub struct LineupBuilder {
    exact: Option<ExactSolver>,
    heuristic: HeuristicBuilder,
}

impl Default for LineupBuilder {
    fn default() -> Self {
        Self::new(ExactSolver::default())
    }
}

impl LineupBuilder {
    pub fn new(exact: ExactSolver) -> Self {
        Self {
            exact: Some(exact),
            heuristic: HeuristicBuilder::default(),
        }
    }

    /// Heuristic only. Used for opponent fields, where throughput matters more
    /// than optimality.
    pub fn heuristic_only() -> Self {
        Self {
            exact: None,
            heuristic: HeuristicBuilder::default(),
        }
    }

    pub fn build(&self, pool: &PlayerPool, spec: &RosterSpec, strategy: &Strategy) -> BuildOutcome {
        let ranked = strategy.narrow_and_rank(pool);
        self.build_ranked(spec, &ranked)
    }

    /// Build from an already-ranked candidate list.
    pub fn build_ranked(&self, spec: &RosterSpec, ranked: &RankedCandidates) -> BuildOutcome {
        if let Err(reason) = preflight::check(spec, ranked) {
            return BuildOutcome::Infeasible(reason);
        }

        let mut incumbent = None;
        if let Some(exact) = &self.exact {
            match exact.solve(spec, ranked) {
                SolveOutcome::Solved(lineup) => return BuildOutcome::Built(lineup),
                SolveOutcome::NoSolution => {
                    return BuildOutcome::Infeasible(InfeasibleReason::NoFeasibleCombination)
                }
                SolveOutcome::TimedOut { incumbent: best } => {
                    debug!(
                        candidates = ranked.len(),
                        has_incumbent = best.is_some(),
                        "exact solver hit its budget, falling back to heuristic"
                    );
                    incumbent = best;
                }
            }
        }

        let heuristic = match self.heuristic.solve(spec, ranked) {
            SolveOutcome::Solved(lineup) => Some(lineup),
            SolveOutcome::NoSolution | SolveOutcome::TimedOut { .. } => None,
        };

        match (heuristic, incumbent) {
            (Some(h), Some(i)) => {
                let scores = score_index(ranked);
                if lineup_score(&i, &scores) > lineup_score(&h, &scores) {
                    BuildOutcome::Built(i)
                } else {
                    BuildOutcome::Built(h)
                }
            }
            (Some(lineup), None) | (None, Some(lineup)) => BuildOutcome::Built(lineup),
            (None, None) => BuildOutcome::Infeasible(InfeasibleReason::NoFeasibleCombination),
        }
    }
}

fn score_index(ranked: &RankedCandidates) -> HashMap<crate::domain::PlayerId, f64> {
    ranked.iter().map(|c| (c.player.id, c.score)).collect()
}

/// Objective value of a lineup under a ranking (captain multiplier applied).
pub fn lineup_score(lineup: &Lineup, scores: &HashMap<crate::domain::PlayerId, f64>) -> f64 {
    lineup
        .entries()
        .iter()
        .map(|e| scores.get(&e.player.id).copied().unwrap_or(0.0) * lineup.multiplier_for(e))
        .sum()
}
