//! The declarative shape a lineup must match.
//!
//! Format differences (classic vs showdown) are data here, not separate code
//! paths: the builder reads slot counts, team limits and the optional captain
//! rule from this struct.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::contest::ContestFormat;
use super::player::{Player, Position};

/// A roster slot. Positional slots accept players eligible at that position;
/// `Flex` accepts anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "P")]
    Pitcher,
    #[serde(rename = "C")]
    Catcher,
    #[serde(rename = "1B")]
    FirstBase,
    #[serde(rename = "2B")]
    SecondBase,
    #[serde(rename = "3B")]
    ThirdBase,
    #[serde(rename = "SS")]
    ShortStop,
    #[serde(rename = "OF")]
    Outfield,
    #[serde(rename = "FLEX")]
    Flex,
}

impl Slot {
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Pitcher => Some(Position::Pitcher),
            Self::Catcher => Some(Position::Catcher),
            Self::FirstBase => Some(Position::FirstBase),
            Self::SecondBase => Some(Position::SecondBase),
            Self::ThirdBase => Some(Position::ThirdBase),
            Self::ShortStop => Some(Position::ShortStop),
            Self::Outfield => Some(Position::Outfield),
            Self::Flex => None,
        }
    }

    pub fn accepts(&self, player: &Player) -> bool {
        match self.position() {
            Some(pos) => player.eligible_for(pos),
            None => true,
        }
    }

    pub fn label(&self) -> &'static str {
        match self.position() {
            Some(pos) => pos.label(),
            None => "FLEX",
        }
    }
}

impl From<Position> for Slot {
    fn from(pos: Position) -> Self {
        match pos {
            Position::Pitcher => Self::Pitcher,
            Position::Catcher => Self::Catcher,
            Position::FirstBase => Self::FirstBase,
            Position::SecondBase => Self::SecondBase,
            Position::ThirdBase => Self::ThirdBase,
            Position::ShortStop => Self::ShortStop,
            Position::Outfield => Self::Outfield,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One roster spot scales both salary and score by `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptainRule {
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RosterSpecError {
    #[error("roster has no slots")]
    EmptyRoster,
    #[error("salary cap must be positive")]
    ZeroSalaryCap,
    #[error("max players per team must be at least 1")]
    ZeroTeamLimit,
    #[error("minimum distinct teams {min_teams} exceeds roster size {roster_size}")]
    MinTeamsExceedsRoster { min_teams: usize, roster_size: usize },
    #[error("captain multiplier must be finite and at least 1.0, got {0}")]
    InvalidCaptainMultiplier(f64),
}

/// Declarative roster shape. Slot counts are matched exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSpec {
    pub format: ContestFormat,
    pub salary_cap: u32,
    pub slots: BTreeMap<Slot, usize>,
    pub max_per_team: usize,
    pub min_teams: usize,
    #[serde(default)]
    pub captain: Option<CaptainRule>,
}

impl RosterSpec {
    /// 2 P / 1 C / 1 1B / 1 2B / 1 3B / 1 SS / 3 OF, $50,000 cap.
    pub fn classic() -> Self {
        let slots = [
            (Slot::Pitcher, 2),
            (Slot::Catcher, 1),
            (Slot::FirstBase, 1),
            (Slot::SecondBase, 1),
            (Slot::ThirdBase, 1),
            (Slot::ShortStop, 1),
            (Slot::Outfield, 3),
        ]
        .into_iter()
        .collect();
        Self {
            format: ContestFormat::Classic,
            salary_cap: 50_000,
            slots,
            max_per_team: 5,
            min_teams: 2,
            captain: None,
        }
    }

    /// One 1.5× captain plus five flex spots, $50,000 cap.
    pub fn showdown() -> Self {
        Self {
            format: ContestFormat::Showdown,
            salary_cap: 50_000,
            slots: [(Slot::Flex, 5)].into_iter().collect(),
            max_per_team: 5,
            min_teams: 2,
            captain: Some(CaptainRule { multiplier: 1.5 }),
        }
    }

    pub fn for_format(format: ContestFormat) -> Self {
        match format {
            ContestFormat::Classic => Self::classic(),
            ContestFormat::Showdown => Self::showdown(),
        }
    }

    /// Total players in a lineup, captain included.
    pub fn roster_size(&self) -> usize {
        self.slots.values().sum::<usize>() + usize::from(self.captain.is_some())
    }

    pub fn required(&self, slot: Slot) -> usize {
        self.slots.get(&slot).copied().unwrap_or(0)
    }

    pub fn captain_multiplier(&self) -> f64 {
        self.captain.map_or(1.0, |c| c.multiplier)
    }

    pub fn validate(&self) -> Result<(), RosterSpecError> {
        let size = self.roster_size();
        if size == 0 {
            return Err(RosterSpecError::EmptyRoster);
        }
        if self.salary_cap == 0 {
            return Err(RosterSpecError::ZeroSalaryCap);
        }
        if self.max_per_team == 0 {
            return Err(RosterSpecError::ZeroTeamLimit);
        }
        if self.min_teams > size {
            return Err(RosterSpecError::MinTeamsExceedsRoster {
                min_teams: self.min_teams,
                roster_size: size,
            });
        }
        if let Some(rule) = self.captain {
            if !rule.multiplier.is_finite() || rule.multiplier < 1.0 {
                return Err(RosterSpecError::InvalidCaptainMultiplier(rule.multiplier));
            }
        }
        Ok(())
    }
}

/// Salary of a player in the captain slot, rounded to the dollar.
pub fn captain_salary(salary: u32, multiplier: f64) -> u32 {
    (salary as f64 * multiplier).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_shape() {
        let spec = RosterSpec::classic();
        assert_eq!(spec.roster_size(), 10);
        assert_eq!(spec.required(Slot::Outfield), 3);
        assert_eq!(spec.required(Slot::Flex), 0);
        assert_eq!(spec.captain_multiplier(), 1.0);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn showdown_shape() {
        let spec = RosterSpec::showdown();
        assert_eq!(spec.roster_size(), 6);
        assert_eq!(spec.captain_multiplier(), 1.5);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn captain_salary_rounds() {
        assert_eq!(captain_salary(9100, 1.5), 13_650);
        assert_eq!(captain_salary(3333, 1.5), 5000);
    }

    #[test]
    fn validation_errors() {
        let mut spec = RosterSpec::classic();
        spec.min_teams = 11;
        assert!(matches!(
            spec.validate(),
            Err(RosterSpecError::MinTeamsExceedsRoster { .. })
        ));

        let mut spec = RosterSpec::showdown();
        spec.captain = Some(CaptainRule { multiplier: 0.5 });
        assert_eq!(
            spec.validate(),
            Err(RosterSpecError::InvalidCaptainMultiplier(0.5))
        );

        let mut spec = RosterSpec::classic();
        spec.slots.clear();
        assert_eq!(spec.validate(), Err(RosterSpecError::EmptyRoster));
    }

    #[test]
    fn flex_accepts_everyone() {
        let p = Player {
            id: crate::domain::PlayerId(1),
            name: "x".into(),
            positions: vec![Position::Catcher],
            team: "BOS".into(),
            salary: 3000,
            projection: 6.0,
            ownership: 4.0,
            ceiling: 15.0,
            floor: 1.0,
            batting_order: 8,
            game_id: 1,
            team_total: None,
            game_total: None,
        };
        assert!(Slot::Flex.accepts(&p));
        assert!(Slot::Catcher.accepts(&p));
        assert!(!Slot::Outfield.accepts(&p));
    }

    #[test]
    fn roster_spec_serde_keys_use_site_labels() {
        let spec = RosterSpec::classic();
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"1B\":1"));
        let back: RosterSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
