//! Same-team stack helpers shared by the pre-flight check and both solvers.

use std::collections::BTreeMap;

use crate::domain::Player;
use crate::strategy::{RankedCandidates, StackRequirement};

/// One way to satisfy a stack requirement: candidate indices into
/// `RankedCandidates::candidates`, all hitters from `team`.
#[derive(Debug, Clone)]
pub struct StackGroup {
    pub team: String,
    pub members: Vec<usize>,
    pub score: f64,
}

/// Every candidate stack for `req`, best summed score first.
///
/// Without the consecutive rule each team contributes its top `size` hitters.
/// With it, each window of `size` consecutive batting-order spots that the
/// team can fill contributes one group (best-ranked hitter per spot).
pub fn stack_groups(ranked: &RankedCandidates, req: StackRequirement) -> Vec<StackGroup> {
    let mut by_team: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, c) in ranked.candidates.iter().enumerate() {
        if c.player.is_hitter() {
            by_team.entry(c.player.team.as_str()).or_default().push(i);
        }
    }

    let mut groups = Vec::new();
    for (team, hitters) in by_team {
        if req.consecutive {
            if req.size > 9 {
                continue;
            }
            let mut by_order: [Option<usize>; 10] = [None; 10];
            for &i in &hitters {
                let order = ranked.candidates[i].player.batting_order as usize;
                if (1..=9).contains(&order) && by_order[order].is_none() {
                    by_order[order] = Some(i);
                }
            }
            for start in 1..=(10 - req.size) {
                let window: Option<Vec<usize>> =
                    (start..start + req.size).map(|o| by_order[o]).collect();
                if let Some(members) = window {
                    groups.push(group(ranked, team, members));
                }
            }
        } else if hitters.len() >= req.size {
            groups.push(group(ranked, team, hitters[..req.size].to_vec()));
        }
    }

    groups.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.team.cmp(&b.team)));
    groups
}

fn group(ranked: &RankedCandidates, team: &str, members: Vec<usize>) -> StackGroup {
    let score = members.iter().map(|&i| ranked.candidates[i].score).sum();
    StackGroup {
        team: team.to_string(),
        members,
        score,
    }
}

/// Whether a set of rostered players contains the required stack.
pub fn satisfies<'a>(players: impl IntoIterator<Item = &'a Player>, req: StackRequirement) -> bool {
    let mut orders: BTreeMap<&str, Vec<u8>> = BTreeMap::new();
    for p in players.into_iter().filter(|p| p.is_hitter()) {
        orders.entry(p.team.as_str()).or_default().push(p.batting_order);
    }

    orders.into_values().any(|mut team_orders| {
        if !req.consecutive {
            return team_orders.len() >= req.size;
        }
        team_orders.retain(|o| (1..=9).contains(o));
        team_orders.sort_unstable();
        team_orders.dedup();
        longest_run(&team_orders) >= req.size
    })
}

fn longest_run(sorted: &[u8]) -> usize {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<u8> = None;
    for &o in sorted {
        run = match prev {
            Some(p) if o == p + 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(o);
    }
    best
}
