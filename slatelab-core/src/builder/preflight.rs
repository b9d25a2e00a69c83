//! Pre-flight feasibility check.
//!
//! Cheap necessary conditions evaluated before any search. Passing does not
//! guarantee a lineup exists; failing proves none does.

use std::collections::BTreeMap;

use crate::domain::{captain_salary, RosterSpec, Slot};
use crate::strategy::RankedCandidates;

use super::stack::stack_groups;
use super::InfeasibleReason;

pub fn check(spec: &RosterSpec, ranked: &RankedCandidates) -> Result<(), InfeasibleReason> {
    spec.validate()
        .map_err(|e| InfeasibleReason::InvalidRoster {
            message: e.to_string(),
        })?;

    let size = spec.roster_size();
    if ranked.len() < size {
        return Err(InfeasibleReason::TooFewCandidates {
            available: ranked.len(),
            required: size,
        });
    }

    // ── Positions ──
    for (&slot, &required) in spec.slots.iter().filter(|(_, &n)| n > 0) {
        let available = ranked.iter().filter(|c| slot.accepts(&c.player)).count();
        if available < required {
            return Err(InfeasibleReason::PositionShortage {
                slot,
                available,
                required,
            });
        }
    }
    let positional: Vec<Slot> = spec
        .slots
        .iter()
        .filter(|(slot, &n)| n > 0 && **slot != Slot::Flex)
        .map(|(slot, _)| *slot)
        .collect();
    let positional_required: usize = positional.iter().map(|s| spec.required(*s)).sum();
    let positional_available = ranked
        .iter()
        .filter(|c| positional.iter().any(|s| s.accepts(&c.player)))
        .count();
    if positional_available < positional_required {
        return Err(InfeasibleReason::TooFewCandidates {
            available: positional_available,
            required: positional_required,
        });
    }

    // ── Salary ──
    let mut salaries: Vec<u32> = ranked.iter().map(|c| c.player.salary).collect();
    salaries.sort_unstable();
    let mut minimum: u64 = salaries[..size].iter().map(|&s| u64::from(s)).sum();
    if let Some(rule) = spec.captain {
        let cheapest = salaries[0];
        minimum += u64::from(captain_salary(cheapest, rule.multiplier).saturating_sub(cheapest));
    }
    if minimum > u64::from(spec.salary_cap) {
        return Err(InfeasibleReason::SalaryFloor {
            minimum,
            cap: spec.salary_cap,
        });
    }

    // ── Teams ──
    let mut teams: BTreeMap<&str, usize> = BTreeMap::new();
    for c in ranked.iter() {
        *teams.entry(c.player.team.as_str()).or_insert(0) += 1;
    }
    if teams.len() < spec.min_teams {
        return Err(InfeasibleReason::TooFewTeams {
            available: teams.len(),
            required: spec.min_teams,
        });
    }
    let capacity: usize = teams.values().map(|&n| n.min(spec.max_per_team)).sum();
    if capacity < size {
        return Err(InfeasibleReason::TeamCapacity {
            capacity,
            required: size,
        });
    }

    // ── Stack ──
    if let Some(req) = ranked.stack {
        if req.size > spec.max_per_team {
            return Err(InfeasibleReason::StackExceedsTeamLimit {
                size: req.size,
                limit: spec.max_per_team,
            });
        }
        if stack_groups(ranked, req).is_empty() {
            return Err(InfeasibleReason::NoStackableTeam {
                size: req.size,
                consecutive: req.consecutive,
            });
        }
    }

    Ok(())
}
