//! Scarcity-first greedy builder.
//!
//! Slots are filled in ascending order of `available candidates / required
//! count`, taking the best-ranked candidate that still leaves enough salary
//! for the cheapest possible completion. A second pass fills whatever is still
//! open with the cheapest feasible candidates. When a stack is required, the
//! stack is placed first and the rest of the roster is filled around it.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{captain_salary, Assignment, Lineup, RosterEntry, RosterSpec, Slot};
use crate::strategy::{Candidate, RankedCandidates};

use super::stack::{stack_groups, StackGroup};
use super::{LineupSolver, SolveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicBuilder {
    /// How many candidate stacks to try, best first.
    pub max_stack_attempts: usize,
}

impl Default for HeuristicBuilder {
    fn default() -> Self {
        Self {
            max_stack_attempts: 8,
        }
    }
}

impl LineupSolver for HeuristicBuilder {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn solve(&self, spec: &RosterSpec, ranked: &RankedCandidates) -> SolveOutcome {
        let Some(req) = ranked.stack else {
            return match Fill::new(spec, ranked).complete() {
                Some((lineup, _)) => SolveOutcome::Solved(lineup),
                None => SolveOutcome::NoSolution,
            };
        };

        let mut best: Option<(Lineup, f64)> = None;
        for group in stack_groups(ranked, req)
            .into_iter()
            .take(self.max_stack_attempts)
        {
            let mut fill = Fill::new(spec, ranked);
            if !fill.place_group(&group) {
                continue;
            }
            if let Some((lineup, score)) = fill.complete() {
                if best.as_ref().map_or(true, |(_, s)| score > *s) {
                    best = Some((lineup, score));
                }
            }
        }
        match best {
            Some((lineup, _)) => SolveOutcome::Solved(lineup),
            None => SolveOutcome::NoSolution,
        }
    }
}

struct Fill<'a> {
    spec: &'a RosterSpec,
    cands: &'a [Candidate],
    multiplier: f64,
    remaining: BTreeMap<Slot, usize>,
    captain_open: bool,
    used: Vec<bool>,
    salary: u32,
    team_counts: HashMap<&'a str, usize>,
    chosen: Vec<(usize, Assignment)>,
    score: f64,
}

impl<'a> Fill<'a> {
    fn new(spec: &'a RosterSpec, ranked: &'a RankedCandidates) -> Self {
        Self {
            spec,
            cands: &ranked.candidates,
            multiplier: spec.captain_multiplier(),
            remaining: spec
                .slots
                .iter()
                .filter(|(_, &n)| n > 0)
                .map(|(s, n)| (*s, *n))
                .collect(),
            captain_open: spec.captain.is_some(),
            used: vec![false; ranked.len()],
            salary: 0,
            team_counts: HashMap::new(),
            chosen: Vec::with_capacity(spec.roster_size()),
            score: 0.0,
        }
    }

    fn open(&self) -> usize {
        self.remaining.values().sum::<usize>() + usize::from(self.captain_open)
    }

    fn cost(&self, i: usize, assignment: Assignment) -> u32 {
        let salary = self.cands[i].player.salary;
        match assignment {
            Assignment::Captain => captain_salary(salary, self.multiplier),
            Assignment::Slot(_) => salary,
        }
    }

    /// Unused candidates a slot could still take.
    fn available(&self, slot: Slot) -> usize {
        self.cands
            .iter()
            .enumerate()
            .filter(|(i, c)| !self.used[*i] && slot.accepts(&c.player))
            .count()
    }

    /// Lower bound on the salary still needed after `i` takes `assignment`.
    fn reserve_after(&self, i: usize, assignment: Assignment) -> Option<u64> {
        let cheapest = |accepts: &dyn Fn(&Candidate) -> bool| {
            self.cands
                .iter()
                .enumerate()
                .filter(|(j, c)| *j != i && !self.used[*j] && accepts(c))
                .map(|(_, c)| c.player.salary)
                .min()
        };

        let mut total: u64 = 0;
        for (&slot, &need) in &self.remaining {
            let need = need - usize::from(assignment == Assignment::Slot(slot));
            if need == 0 {
                continue;
            }
            let floor = cheapest(&|c| slot.accepts(&c.player))?;
            total += need as u64 * u64::from(floor);
        }
        if self.captain_open && assignment != Assignment::Captain {
            let floor = cheapest(&|_| true)?;
            total += u64::from(captain_salary(floor, self.multiplier));
        }
        Some(total)
    }

    fn can_take(&self, i: usize, assignment: Assignment) -> bool {
        if self.used[i] {
            return false;
        }
        let player = &self.cands[i].player;
        match assignment {
            Assignment::Captain if !self.captain_open => return false,
            Assignment::Slot(slot) => {
                if self.remaining.get(&slot).copied().unwrap_or(0) == 0 || !slot.accepts(player) {
                    return false;
                }
            }
            Assignment::Captain => {}
        }

        let on_team = self.team_counts.get(player.team.as_str()).copied().unwrap_or(0);
        if on_team >= self.spec.max_per_team {
            return false;
        }

        let distinct_after = self.team_counts.len() + usize::from(on_team == 0);
        let open_after = self.open() - 1;
        if self.spec.min_teams.saturating_sub(distinct_after) > open_after {
            return false;
        }

        let Some(reserve) = self.reserve_after(i, assignment) else {
            return false;
        };
        u64::from(self.salary) + u64::from(self.cost(i, assignment)) + reserve
            <= u64::from(self.spec.salary_cap)
    }

    fn take(&mut self, i: usize, assignment: Assignment) {
        match assignment {
            Assignment::Captain => self.captain_open = false,
            Assignment::Slot(slot) => {
                if let Some(n) = self.remaining.get_mut(&slot) {
                    *n -= 1;
                }
            }
        }
        let gain = match assignment {
            Assignment::Captain => self.cands[i].score * self.multiplier,
            Assignment::Slot(_) => self.cands[i].score,
        };
        self.salary += self.cost(i, assignment);
        self.score += gain;
        self.used[i] = true;
        *self
            .team_counts
            .entry(self.cands[i].player.team.as_str())
            .or_insert(0) += 1;
        self.chosen.push((i, assignment));
    }

    /// Place every stack member, each into its scarcest accepting slot.
    fn place_group(&mut self, group: &StackGroup) -> bool {
        for &i in &group.members {
            let slot = self
                .remaining
                .iter()
                .filter(|(s, &n)| n > 0 && s.accepts(&self.cands[i].player))
                .map(|(s, _)| *s)
                .min_by_key(|s| self.available(*s));
            match slot {
                Some(slot) if self.can_take(i, Assignment::Slot(slot)) => {
                    self.take(i, Assignment::Slot(slot));
                }
                _ => return false,
            }
        }
        true
    }

    fn complete(mut self) -> Option<(Lineup, f64)> {
        let n = self.cands.len();

        if self.captain_open {
            let pick = (0..n).find(|&i| self.can_take(i, Assignment::Captain))?;
            self.take(pick, Assignment::Captain);
        }

        // ── Scarcity-first pass ──
        let mut order: Vec<Slot> = self
            .remaining
            .iter()
            .filter(|(_, &need)| need > 0)
            .map(|(s, _)| *s)
            .collect();
        let ratio = |fill: &Self, slot: Slot| {
            fill.available(slot) as f64 / fill.remaining[&slot].max(1) as f64
        };
        order.sort_by(|a, b| {
            ratio(&self, *a)
                .total_cmp(&ratio(&self, *b))
                .then_with(|| a.cmp(b))
        });
        for slot in order {
            while self.remaining[&slot] > 0 {
                match (0..n).find(|&i| self.can_take(i, Assignment::Slot(slot))) {
                    Some(i) => self.take(i, Assignment::Slot(slot)),
                    None => break,
                }
            }
        }

        // ── Cheapest-fill pass ──
        if self.open() > 0 {
            let mut by_salary: Vec<usize> = (0..n).collect();
            by_salary.sort_by_key(|&i| (self.cands[i].player.salary, i));
            let open_slots: Vec<Slot> = self
                .remaining
                .iter()
                .filter(|(_, &need)| need > 0)
                .map(|(s, _)| *s)
                .collect();
            for slot in open_slots {
                while self.remaining[&slot] > 0 {
                    let i = by_salary
                        .iter()
                        .copied()
                        .find(|&i| self.can_take(i, Assignment::Slot(slot)))?;
                    self.take(i, Assignment::Slot(slot));
                }
            }
        }

        let entries = self
            .chosen
            .iter()
            .map(|&(i, a)| RosterEntry::new(self.cands[i].player.clone(), a))
            .collect();
        let lineup = Lineup::new(entries, self.spec).ok()?;
        Some((lineup, self.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Player, PlayerId, PlayerPool, Position};
    use crate::strategy::{Metric, Overlay, Strategy};

    fn player(id: u32, pos: Position, team: &str, salary: u32, projection: f64, order: u8) -> Player {
        Player {
            id: PlayerId(id),
            name: format!("{team}-{id}"),
            positions: vec![pos],
            team: team.into(),
            salary,
            projection,
            ownership: 10.0,
            ceiling: projection * 2.0,
            floor: projection * 0.3,
            batting_order: order,
            game_id: 1,
            team_total: None,
            game_total: None,
        }
    }

    /// Expensive, high-projection outfielders tempt a naive greedy into
    /// spending the cap before the single cheap catcher is placed.
    fn scarce_catcher_pool() -> PlayerPool {
        use Position::*;
        let mut players = vec![
            player(1, Pitcher, "NYY", 9000, 20.0, 0),
            player(2, Pitcher, "BOS", 8800, 19.0, 0),
            player(3, Catcher, "BOS", 2500, 4.0, 8),
            player(4, FirstBase, "NYY", 3000, 7.0, 4),
            player(5, SecondBase, "BOS", 3000, 6.0, 2),
            player(6, ThirdBase, "TOR", 3000, 6.5, 5),
            player(7, ShortStop, "TOR", 3000, 6.0, 1),
        ];
        for (k, team) in ["NYY", "BOS", "TOR", "TOR", "NYY"].iter().enumerate() {
            players.push(player(10 + k as u32, Outfield, team, 6000 - k as u32 * 500, 12.0 - k as f64, k as u8 + 1));
        }
        players.push(player(20, Outfield, "TOR", 2200, 3.0, 9));
        PlayerPool::new(players).unwrap()
    }

    #[test]
    fn fills_scarce_position_under_cap() {
        let ranked = Strategy::new("p", Metric::Projection).narrow_and_rank(&scarce_catcher_pool());
        let spec = RosterSpec::classic();
        let lineup = match HeuristicBuilder::default().solve(&spec, &ranked) {
            SolveOutcome::Solved(l) => l,
            other => panic!("{other:?}"),
        };
        assert!(lineup.contains(PlayerId(3)));
        assert!(lineup.total_salary() <= spec.salary_cap);
    }

    #[test]
    fn places_stack_first() {
        let overlay = Overlay {
            stack_size: Some(3),
            ..Overlay::default()
        };
        let ranked = Strategy::new("p", Metric::Projection)
            .with_overlay(overlay)
            .narrow_and_rank(&scarce_catcher_pool());
        let lineup = match HeuristicBuilder::default().solve(&RosterSpec::classic(), &ranked) {
            SolveOutcome::Solved(l) => l,
            other => panic!("{other:?}"),
        };
        assert!(lineup.max_stack() >= 3);
    }

    #[test]
    fn reports_no_solution_when_cap_is_too_tight() {
        let mut spec = RosterSpec::classic();
        spec.salary_cap = 30_000;
        let ranked = Strategy::new("p", Metric::Projection).narrow_and_rank(&scarce_catcher_pool());
        assert!(matches!(
            HeuristicBuilder::default().solve(&spec, &ranked),
            SolveOutcome::NoSolution
        ));
    }
}
