//! A complete roster that satisfies its RosterSpec.
//!
//! The only constructor is [`Lineup::new`], which checks every roster
//! invariant. An invalid combination never exists as a `Lineup` value.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::contest::ContestFormat;
use super::player::{Player, PlayerId};
use super::roster::{captain_salary, RosterSpec, Slot};

/// Where a rostered player sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Assignment {
    Captain,
    Slot(Slot),
}

impl Assignment {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Captain => "CPT",
            Self::Slot(slot) => slot.label(),
        }
    }
}

/// A player plus the slot they fill.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub player: Arc<Player>,
    pub assignment: Assignment,
}

impl RosterEntry {
    pub fn new(player: Arc<Player>, assignment: Assignment) -> Self {
        Self { player, assignment }
    }

    pub fn is_captain(&self) -> bool {
        self.assignment == Assignment::Captain
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineupViolation {
    #[error("lineup has {actual} players, roster requires {expected}")]
    WrongSize { expected: usize, actual: usize },
    #[error("player {0} appears more than once")]
    DuplicatePlayer(PlayerId),
    #[error("{name} is not eligible for slot {slot}")]
    IneligibleSlot { name: String, slot: Slot },
    #[error("slot {slot} filled {actual} times, requires exactly {required}")]
    SlotCount {
        slot: Slot,
        required: usize,
        actual: usize,
    },
    #[error("captain slot filled {actual} times, requires exactly {expected}")]
    CaptainCount { expected: usize, actual: usize },
    #[error("salary {salary} exceeds cap {cap}")]
    OverCap { salary: u32, cap: u32 },
    #[error("{count} players from {team}, limit is {limit}")]
    TeamLimit {
        team: String,
        count: usize,
        limit: usize,
    },
    #[error("{teams} distinct teams, at least {min} required")]
    TooFewTeams { teams: usize, min: usize },
}

/// A valid lineup.
///
/// `projection_scale` and `ownership_scale` default to 1.0. Field generation
/// uses them to express opponent skill and to jitter padded duplicates; they
/// never affect roster validity.
#[derive(Debug, Clone)]
pub struct Lineup {
    entries: Vec<RosterEntry>,
    format: ContestFormat,
    captain_multiplier: f64,
    total_salary: u32,
    projection_scale: f64,
    ownership_scale: f64,
}

impl Lineup {
    /// Validate `entries` against `spec` and build the lineup.
    pub fn new(entries: Vec<RosterEntry>, spec: &RosterSpec) -> Result<Self, LineupViolation> {
        let expected = spec.roster_size();
        if entries.len() != expected {
            return Err(LineupViolation::WrongSize {
                expected,
                actual: entries.len(),
            });
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for e in &entries {
            if !seen.insert(e.player.id) {
                return Err(LineupViolation::DuplicatePlayer(e.player.id));
            }
        }

        let mut slot_counts: BTreeMap<Slot, usize> = BTreeMap::new();
        let mut captains = 0;
        for e in &entries {
            match e.assignment {
                Assignment::Captain => captains += 1,
                Assignment::Slot(slot) => {
                    if !slot.accepts(&e.player) {
                        return Err(LineupViolation::IneligibleSlot {
                            name: e.player.name.clone(),
                            slot,
                        });
                    }
                    *slot_counts.entry(slot).or_insert(0) += 1;
                }
            }
        }

        let expected_captains = usize::from(spec.captain.is_some());
        if captains != expected_captains {
            return Err(LineupViolation::CaptainCount {
                expected: expected_captains,
                actual: captains,
            });
        }
        for (&slot, &required) in &spec.slots {
            let actual = slot_counts.get(&slot).copied().unwrap_or(0);
            if actual != required {
                return Err(LineupViolation::SlotCount {
                    slot,
                    required,
                    actual,
                });
            }
        }
        if let Some((&slot, &actual)) = slot_counts
            .iter()
            .find(|(slot, _)| !spec.slots.contains_key(slot))
        {
            return Err(LineupViolation::SlotCount {
                slot,
                required: 0,
                actual,
            });
        }

        let multiplier = spec.captain_multiplier();
        let total_salary: u32 = entries
            .iter()
            .map(|e| entry_salary(e, multiplier))
            .sum();
        if total_salary > spec.salary_cap {
            return Err(LineupViolation::OverCap {
                salary: total_salary,
                cap: spec.salary_cap,
            });
        }

        let mut teams: BTreeMap<&str, usize> = BTreeMap::new();
        for e in &entries {
            *teams.entry(e.player.team.as_str()).or_insert(0) += 1;
        }
        if let Some((team, &count)) = teams.iter().find(|(_, &c)| c > spec.max_per_team) {
            return Err(LineupViolation::TeamLimit {
                team: team.to_string(),
                count,
                limit: spec.max_per_team,
            });
        }
        if teams.len() < spec.min_teams {
            return Err(LineupViolation::TooFewTeams {
                teams: teams.len(),
                min: spec.min_teams,
            });
        }

        Ok(Self {
            entries,
            format: spec.format,
            captain_multiplier: multiplier,
            total_salary,
            projection_scale: 1.0,
            ownership_scale: 1.0,
        })
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn format(&self) -> ContestFormat {
        self.format
    }

    pub fn captain(&self) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.is_captain())
    }

    pub fn captain_multiplier(&self) -> f64 {
        self.captain_multiplier
    }

    /// Score/salary multiplier for one entry (the captain rule, or 1.0).
    pub fn multiplier_for(&self, entry: &RosterEntry) -> f64 {
        if entry.is_captain() {
            self.captain_multiplier
        } else {
            1.0
        }
    }

    pub fn total_salary(&self) -> u32 {
        self.total_salary
    }

    /// Projection with the captain multiplier and projection scale applied.
    pub fn total_projection(&self) -> f64 {
        self.raw_projection() * self.projection_scale
    }

    /// Projection with the captain multiplier but without any scale.
    pub fn raw_projection(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.player.projection * self.multiplier_for(e))
            .sum()
    }

    pub fn average_ownership(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.entries.iter().map(|e| e.player.ownership).sum();
        sum / self.entries.len() as f64 * self.ownership_scale
    }

    pub fn projection_scale(&self) -> f64 {
        self.projection_scale
    }

    pub fn ownership_scale(&self) -> f64 {
        self.ownership_scale
    }

    /// Players per real-world team.
    pub fn team_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.entries {
            *counts.entry(e.player.team.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Hitters per real-world team.
    pub fn hitter_stacks(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for e in self.entries.iter().filter(|e| e.player.is_hitter()) {
            *counts.entry(e.player.team.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Largest same-team hitter block.
    pub fn max_stack(&self) -> usize {
        self.hitter_stacks().values().copied().max().unwrap_or(0)
    }

    pub fn distinct_teams(&self) -> usize {
        self.team_counts().len()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.entries.iter().any(|e| e.player.id == id)
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.entries.iter().map(|e| e.player.id).collect()
    }

    /// Copy of this lineup with its scales multiplied by the given factors.
    pub fn rescaled(&self, projection_factor: f64, ownership_factor: f64) -> Lineup {
        let mut copy = self.clone();
        copy.projection_scale *= projection_factor;
        copy.ownership_scale *= ownership_factor;
        copy
    }

    pub fn summary(&self) -> LineupSummary {
        LineupSummary {
            format: self.format,
            total_salary: self.total_salary,
            total_projection: self.total_projection(),
            average_ownership: self.average_ownership(),
            max_stack: self.max_stack(),
            players: self
                .entries
                .iter()
                .map(|e| SummaryRow {
                    slot: e.assignment.label().to_string(),
                    id: e.player.id,
                    name: e.player.name.clone(),
                    team: e.player.team.clone(),
                    positions: e.player.position_label(),
                    salary: entry_salary(e, self.captain_multiplier),
                    projection: e.player.projection * self.multiplier_for(e),
                })
                .collect(),
        }
    }
}

fn entry_salary(entry: &RosterEntry, multiplier: f64) -> u32 {
    if entry.is_captain() {
        captain_salary(entry.player.salary, multiplier)
    } else {
        entry.player.salary
    }
}

/// Serializable view of a lineup, used for display and reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupSummary {
    pub format: ContestFormat,
    pub total_salary: u32,
    pub total_projection: f64,
    pub average_ownership: f64,
    pub max_stack: usize,
    pub players: Vec<SummaryRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub slot: String,
    pub id: PlayerId,
    pub name: String,
    pub team: String,
    pub positions: String,
    pub salary: u32,
    pub projection: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Position;

    fn player(id: u32, pos: Position, team: &str, salary: u32, projection: f64) -> Arc<Player> {
        Arc::new(Player {
            id: PlayerId(id),
            name: format!("{team}-{id}"),
            positions: vec![pos],
            team: team.into(),
            salary,
            projection,
            ownership: 10.0,
            ceiling: projection * 2.0,
            floor: projection * 0.3,
            batting_order: if pos.is_pitcher() { 0 } else { (id % 9 + 1) as u8 },
            game_id: 1,
            team_total: None,
            game_total: None,
        })
    }

    fn classic_entries() -> Vec<RosterEntry> {
        use Position::*;
        let layout = [
            (Pitcher, "NYY"),
            (Pitcher, "BOS"),
            (Catcher, "BOS"),
            (FirstBase, "NYY"),
            (SecondBase, "NYY"),
            (ThirdBase, "NYY"),
            (ShortStop, "BOS"),
            (Outfield, "TOR"),
            (Outfield, "TOR"),
            (Outfield, "NYY"),
        ];
        layout
            .iter()
            .enumerate()
            .map(|(i, (pos, team))| {
                RosterEntry::new(
                    player(i as u32 + 1, *pos, team, 4500, 9.0),
                    Assignment::Slot(Slot::from(*pos)),
                )
            })
            .collect()
    }

    #[test]
    fn valid_classic_lineup() {
        let lineup = Lineup::new(classic_entries(), &RosterSpec::classic()).unwrap();
        assert_eq!(lineup.len(), 10);
        assert_eq!(lineup.total_salary(), 45_000);
        assert!((lineup.total_projection() - 90.0).abs() < 1e-9);
        assert_eq!(lineup.distinct_teams(), 3);
        assert_eq!(lineup.max_stack(), 4);
        assert!(lineup.captain().is_none());
    }

    #[test]
    fn rejects_over_cap() {
        let mut entries = classic_entries();
        entries[0] = RosterEntry::new(
            player(1, Position::Pitcher, "NYY", 10_000, 20.0),
            Assignment::Slot(Slot::Pitcher),
        );
        entries[1] = RosterEntry::new(
            player(2, Position::Pitcher, "BOS", 10_000, 20.0),
            Assignment::Slot(Slot::Pitcher),
        );
        assert!(matches!(
            Lineup::new(entries, &RosterSpec::classic()),
            Err(LineupViolation::OverCap { .. })
        ));
    }

    #[test]
    fn rejects_wrong_slot_counts_and_eligibility() {
        let mut entries = classic_entries();
        entries[9].assignment = Assignment::Slot(Slot::Catcher);
        assert!(matches!(
            Lineup::new(entries, &RosterSpec::classic()),
            Err(LineupViolation::IneligibleSlot { .. })
        ));

        let mut entries = classic_entries();
        entries.pop();
        assert!(matches!(
            Lineup::new(entries, &RosterSpec::classic()),
            Err(LineupViolation::WrongSize { .. })
        ));
    }

    #[test]
    fn rejects_team_limit() {
        let mut entries = classic_entries();
        for e in entries.iter_mut().skip(6) {
            let mut p = (*e.player).clone();
            p.team = "NYY".into();
            e.player = Arc::new(p);
        }
        assert!(matches!(
            Lineup::new(entries, &RosterSpec::classic()),
            Err(LineupViolation::TeamLimit { .. })
        ));
    }

    #[test]
    fn rejects_duplicates() {
        let mut entries = classic_entries();
        entries[8] = RosterEntry::new(entries[7].player.clone(), Assignment::Slot(Slot::Outfield));
        assert!(matches!(
            Lineup::new(entries, &RosterSpec::classic()),
            Err(LineupViolation::DuplicatePlayer(_))
        ));
    }

    #[test]
    fn showdown_captain_scales_salary_and_projection() {
        let spec = RosterSpec::showdown();
        let mut entries = vec![RosterEntry::new(
            player(1, Position::Pitcher, "NYY", 10_000, 20.0),
            Assignment::Captain,
        )];
        for i in 2..=6 {
            let team = if i % 2 == 0 { "BOS" } else { "NYY" };
            entries.push(RosterEntry::new(
                player(i, Position::Outfield, team, 6000, 8.0),
                Assignment::Slot(Slot::Flex),
            ));
        }
        let lineup = Lineup::new(entries, &spec).unwrap();
        assert_eq!(lineup.total_salary(), 15_000 + 30_000);
        assert!((lineup.total_projection() - (30.0 + 40.0)).abs() < 1e-9);
        assert_eq!(lineup.captain().unwrap().player.id, PlayerId(1));
    }

    #[test]
    fn showdown_requires_exactly_one_captain() {
        let spec = RosterSpec::showdown();
        let entries: Vec<RosterEntry> = (1..=6)
            .map(|i| {
                let team = if i % 2 == 0 { "BOS" } else { "NYY" };
                RosterEntry::new(
                    player(i, Position::Outfield, team, 5000, 8.0),
                    Assignment::Slot(Slot::Flex),
                )
            })
            .collect();
        assert!(matches!(
            Lineup::new(entries, &spec),
            Err(LineupViolation::CaptainCount { expected: 1, actual: 0 })
                | Err(LineupViolation::SlotCount { .. })
        ));
    }

    #[test]
    fn rescaled_keeps_roster() {
        let lineup = Lineup::new(classic_entries(), &RosterSpec::classic()).unwrap();
        let copy = lineup.rescaled(1.1, 0.9);
        assert_eq!(copy.player_ids(), lineup.player_ids());
        assert!((copy.total_projection() - 99.0).abs() < 1e-9);
        assert!((copy.average_ownership() - 9.0).abs() < 1e-9);
    }
}
