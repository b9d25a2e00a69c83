//! Exact solver: depth-first branch-and-bound over ranked candidates.
//!
//! Maximizes the summed strategy score subject to exact slot counts, the salary
//! cap, per-team limits, minimum distinct teams, the optional captain choice and
//! the optional stack requirement. Branches include a candidate before
//! excluding it, so the first leaves reached are greedy-quality incumbents.
//!
//! Two budgets bound the search: a node limit (deterministic) and a wall-clock
//! deadline (hard stop). Hitting either yields [`SolveOutcome::TimedOut`].

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::domain::{captain_salary, Assignment, Lineup, RosterEntry, RosterSpec, Slot};
use crate::strategy::{Candidate, RankedCandidates, StackRequirement};

use super::stack::satisfies;
use super::{LineupSolver, SolveOutcome};

/// Fractions of the pool's score-per-dollar used as Lagrange multipliers on
/// the salary constraint when bounding.
const PRICE_FACTORS: [f64; 3] = [0.5, 1.0, 1.5];

/// Deadline is polled every this many nodes.
const CLOCK_POLL_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExactSolver {
    pub time_limit: Duration,
    pub node_limit: u64,
}

impl Default for ExactSolver {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_millis(250),
            node_limit: 400_000,
        }
    }
}

impl LineupSolver for ExactSolver {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn solve(&self, spec: &RosterSpec, ranked: &RankedCandidates) -> SolveOutcome {
        let mut search = Search::new(spec, ranked, self);
        search.dfs(0);

        let best = search
            .best
            .take()
            .and_then(|(_, chosen)| materialize(spec, &ranked.candidates, &chosen));
        if search.aborted {
            SolveOutcome::TimedOut { incumbent: best }
        } else {
            match best {
                Some(lineup) => SolveOutcome::Solved(lineup),
                None => SolveOutcome::NoSolution,
            }
        }
    }
}

fn materialize(
    spec: &RosterSpec,
    cands: &[Candidate],
    chosen: &[(usize, Assignment)],
) -> Option<Lineup> {
    let entries = chosen
        .iter()
        .map(|&(i, a)| RosterEntry::new(cands[i].player.clone(), a))
        .collect();
    Lineup::new(entries, spec).ok()
}

struct Search<'a> {
    spec: &'a RosterSpec,
    cands: &'a [Candidate],
    stack: Option<StackRequirement>,
    multiplier: f64,

    // ── Precomputed ──
    slots: Vec<Slot>,
    eligible: Vec<Vec<usize>>,
    team_of: Vec<usize>,
    prefix_scores: Vec<f64>,
    suffix_min_salary: Vec<u32>,
    suffix_eligible: Vec<Vec<usize>>,
    price_orders: Vec<(f64, Vec<usize>)>,

    // ── Current branch ──
    remaining: Vec<usize>,
    captain_open: bool,
    salary: u32,
    team_counts: Vec<usize>,
    hitters_per_team: Vec<usize>,
    distinct_teams: usize,
    score: f64,
    chosen: Vec<(usize, Assignment)>,

    // ── Result & budget ──
    best: Option<(f64, Vec<(usize, Assignment)>)>,
    nodes: u64,
    node_limit: u64,
    deadline: Instant,
    aborted: bool,
}

impl<'a> Search<'a> {
    fn new(spec: &'a RosterSpec, ranked: &'a RankedCandidates, solver: &ExactSolver) -> Self {
        let cands = ranked.candidates.as_slice();
        let n = cands.len();

        let slots: Vec<Slot> = spec
            .slots
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(slot, _)| *slot)
            .collect();
        let remaining: Vec<usize> = slots.iter().map(|s| spec.required(*s)).collect();

        let eligible: Vec<Vec<usize>> = cands
            .iter()
            .map(|c| {
                (0..slots.len())
                    .filter(|&k| slots[k].accepts(&c.player))
                    .collect()
            })
            .collect();

        let mut team_ids: BTreeMap<&str, usize> = BTreeMap::new();
        let team_of: Vec<usize> = cands
            .iter()
            .map(|c| {
                let next = team_ids.len();
                *team_ids.entry(c.player.team.as_str()).or_insert(next)
            })
            .collect();
        let team_total = team_ids.len();

        let mut prefix_scores = vec![0.0; n + 1];
        for i in 0..n {
            prefix_scores[i + 1] = prefix_scores[i] + cands[i].score;
        }

        let mut suffix_min_salary = vec![u32::MAX; n + 1];
        let mut suffix_eligible = vec![vec![0usize; slots.len()]; n + 1];
        for i in (0..n).rev() {
            suffix_min_salary[i] = suffix_min_salary[i + 1].min(cands[i].player.salary);
            suffix_eligible[i] = suffix_eligible[i + 1].clone();
            for &k in &eligible[i] {
                suffix_eligible[i][k] += 1;
            }
        }

        let total_score: f64 = cands.iter().map(|c| c.score.max(0.0)).sum();
        let total_salary: f64 = cands.iter().map(|c| c.player.salary as f64).sum();
        let price = if total_salary > 0.0 {
            total_score / total_salary
        } else {
            0.0
        };
        let price_orders = PRICE_FACTORS
            .iter()
            .map(|f| {
                let lambda = price * f;
                let mut order: Vec<usize> = (0..n).collect();
                order.sort_by(|&a, &b| {
                    reduced(&cands[b], lambda).total_cmp(&reduced(&cands[a], lambda))
                });
                (lambda, order)
            })
            .collect();

        Self {
            spec,
            cands,
            stack: ranked.stack,
            multiplier: spec.captain_multiplier(),
            slots,
            eligible,
            team_of,
            prefix_scores,
            suffix_min_salary,
            suffix_eligible,
            price_orders,
            remaining,
            captain_open: spec.captain.is_some(),
            salary: 0,
            team_counts: vec![0; team_total],
            hitters_per_team: vec![0; team_total],
            distinct_teams: 0,
            score: 0.0,
            chosen: Vec::with_capacity(spec.roster_size()),
            best: None,
            nodes: 0,
            node_limit: solver.node_limit,
            deadline: Instant::now() + solver.time_limit,
            aborted: false,
        }
    }

    fn open(&self) -> usize {
        self.remaining.iter().sum::<usize>() + usize::from(self.captain_open)
    }

    fn dfs(&mut self, i: usize) {
        if self.aborted {
            return;
        }
        self.nodes += 1;
        if self.nodes >= self.node_limit
            || (self.nodes % CLOCK_POLL_INTERVAL == 0 && Instant::now() >= self.deadline)
        {
            self.aborted = true;
            return;
        }

        let open = self.open();
        if open == 0 {
            self.consider_leaf();
            return;
        }
        if i >= self.cands.len() || !self.promising(i, open) {
            return;
        }

        let cands = self.cands;
        let cand = &cands[i];
        let team = self.team_of[i];
        if self.team_counts[team] < self.spec.max_per_team {
            if self.captain_open {
                let cost = captain_salary(cand.player.salary, self.multiplier);
                if self.fits(cost) {
                    self.take(i, Assignment::Captain, cost, cand.score * self.multiplier);
                    self.dfs(i + 1);
                    self.untake(i, cost, cand.score * self.multiplier);
                }
            }
            for e in 0..self.eligible[i].len() {
                let k = self.eligible[i][e];
                let cost = cand.player.salary;
                if self.remaining[k] > 0 && self.fits(cost) {
                    self.take(i, Assignment::Slot(self.slots[k]), cost, cand.score);
                    self.dfs(i + 1);
                    self.untake(i, cost, cand.score);
                }
            }
        }
        self.dfs(i + 1);
    }

    fn fits(&self, cost: u32) -> bool {
        u64::from(self.salary) + u64::from(cost) <= u64::from(self.spec.salary_cap)
    }

    fn take(&mut self, i: usize, assignment: Assignment, cost: u32, gain: f64) {
        match assignment {
            Assignment::Captain => self.captain_open = false,
            Assignment::Slot(slot) => {
                if let Some(k) = self.slots.iter().position(|s| *s == slot) {
                    self.remaining[k] -= 1;
                }
            }
        }
        let team = self.team_of[i];
        if self.team_counts[team] == 0 {
            self.distinct_teams += 1;
        }
        self.team_counts[team] += 1;
        if self.cands[i].player.is_hitter() {
            self.hitters_per_team[team] += 1;
        }
        self.salary += cost;
        self.score += gain;
        self.chosen.push((i, assignment));
    }

    fn untake(&mut self, i: usize, cost: u32, gain: f64) {
        if let Some((_, assignment)) = self.chosen.pop() {
            match assignment {
                Assignment::Captain => self.captain_open = true,
                Assignment::Slot(slot) => {
                    if let Some(k) = self.slots.iter().position(|s| *s == slot) {
                        self.remaining[k] += 1;
                    }
                }
            }
        }
        let team = self.team_of[i];
        self.team_counts[team] -= 1;
        if self.team_counts[team] == 0 {
            self.distinct_teams -= 1;
        }
        if self.cands[i].player.is_hitter() {
            self.hitters_per_team[team] -= 1;
        }
        self.salary -= cost;
        self.score -= gain;
    }

    /// Necessary conditions for the subtree rooted at candidate `i` to hold a
    /// lineup better than the incumbent.
    fn promising(&self, i: usize, open: usize) -> bool {
        let n = self.cands.len();
        if n - i < open {
            return false;
        }
        for (k, &need) in self.remaining.iter().enumerate() {
            if need > self.suffix_eligible[i][k] {
                return false;
            }
        }
        if self.distinct_teams + open < self.spec.min_teams {
            return false;
        }
        if let Some(req) = self.stack {
            let best_team = self.hitters_per_team.iter().copied().max().unwrap_or(0);
            if best_team + open < req.size {
                return false;
            }
        }

        let cheapest = self.suffix_min_salary[i];
        let mut floor = u64::from(self.salary) + open as u64 * u64::from(cheapest);
        if self.captain_open {
            floor += u64::from(captain_salary(cheapest, self.multiplier).saturating_sub(cheapest));
        }
        if floor > u64::from(self.spec.salary_cap) {
            return false;
        }

        match &self.best {
            Some((best, _)) => self.upper_bound(i, open) > best + 1e-9,
            None => true,
        }
    }

    /// Minimum over several Lagrangian relaxations of the salary constraint.
    /// With `lambda = 0` this is simply the sum of the top `open` scores.
    fn upper_bound(&self, i: usize, open: usize) -> f64 {
        let captain_bonus = if self.captain_open {
            (self.multiplier - 1.0) * self.cands[i].score.max(0.0)
        } else {
            0.0
        };
        let plain = self.prefix_scores[i + open] - self.prefix_scores[i];
        let budget = f64::from(self.spec.salary_cap - self.salary);

        let mut bound = plain;
        for (lambda, order) in &self.price_orders {
            let top: f64 = order
                .iter()
                .filter(|&&j| j >= i)
                .take(open)
                .map(|&j| reduced(&self.cands[j], *lambda))
                .sum();
            bound = bound.min(top + lambda * budget);
        }
        self.score + bound + captain_bonus
    }

    fn consider_leaf(&mut self) {
        if self.distinct_teams < self.spec.min_teams {
            return;
        }
        if let Some(req) = self.stack {
            let players = self.chosen.iter().map(|&(i, _)| self.cands[i].player.as_ref());
            if !satisfies(players, req) {
                return;
            }
        }
        let improves = match &self.best {
            Some((best, _)) => self.score > *best + 1e-12,
            None => true,
        };
        if improves {
            self.best = Some((self.score, self.chosen.clone()));
        }
    }
}

fn reduced(c: &Candidate, lambda: f64) -> f64 {
    c.score - lambda * c.player.salary as f64
}
