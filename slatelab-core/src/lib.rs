//! Slatelab Core — lineup construction and contest simulation.
//!
//! This crate contains the engine:
//! - Domain types (players, pools, roster specs, lineups, contests)
//! - Strategy catalogue: ranking metrics plus constraint overlays
//! - Lineup builder: pre-flight check, exact branch-and-bound, scarcity-first heuristic
//! - Opponent field generation from a skill-tier mixture
//! - Stochastic scoring with team correlation and stack boom/bust
//! - Contest evaluation (rank, percentile, payout, ROI)
//! - Synthetic slate generation and the deterministic RNG hierarchy

pub mod builder;
pub mod domain;
pub mod evaluator;
pub mod field;
pub mod rng;
pub mod scoring;
pub mod slate;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything handed to worker threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Player>();
        require_sync::<domain::Player>();
        require_send::<domain::PlayerPool>();
        require_sync::<domain::PlayerPool>();
        require_send::<domain::RosterSpec>();
        require_sync::<domain::RosterSpec>();
        require_send::<domain::Lineup>();
        require_sync::<domain::Lineup>();
        require_send::<domain::Contest>();
        require_sync::<domain::Contest>();

        // Strategy
        require_send::<strategy::Strategy>();
        require_sync::<strategy::Strategy>();
        require_send::<strategy::RankedCandidates>();
        require_sync::<strategy::RankedCandidates>();

        // Builder
        require_send::<builder::LineupBuilder>();
        require_sync::<builder::LineupBuilder>();
        require_send::<builder::BuildOutcome>();
        require_sync::<builder::BuildOutcome>();

        // Simulation
        require_send::<field::FieldGenerator>();
        require_sync::<field::FieldGenerator>();
        require_send::<scoring::ScoringSimulator>();
        require_sync::<scoring::ScoringSimulator>();
        require_send::<evaluator::ContestOutcome>();
        require_sync::<evaluator::ContestOutcome>();
        require_send::<slate::Slate>();
        require_sync::<slate::Slate>();

        // RNG
        require_send::<rng::RngHierarchy>();
        require_sync::<rng::RngHierarchy>();
    }

    /// Both solvers sit behind one trait object type.
    #[test]
    fn solvers_are_interchangeable() {
        let solvers: Vec<Box<dyn builder::LineupSolver>> = vec![
            Box::new(builder::ExactSolver::default()),
            Box::new(builder::HeuristicBuilder::default()),
        ];
        let names: Vec<&str> = solvers.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["exact", "heuristic"]);
    }
}
