//! Player records: the per-slate value object every other component reads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical baseball roster positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
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
}

impl Position {
    pub const ALL: [Position; 7] = [
        Position::Pitcher,
        Position::Catcher,
        Position::FirstBase,
        Position::SecondBase,
        Position::ThirdBase,
        Position::ShortStop,
        Position::Outfield,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pitcher => "P",
            Self::Catcher => "C",
            Self::FirstBase => "1B",
            Self::SecondBase => "2B",
            Self::ThirdBase => "3B",
            Self::ShortStop => "SS",
            Self::Outfield => "OF",
        }
    }

    pub fn is_pitcher(&self) -> bool {
        matches!(self, Self::Pitcher)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Position {
    type Err = String;

    /// Accepts site spellings: `SP`/`RP` map to pitcher, `LF`/`CF`/`RF` to outfield.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P" | "SP" | "RP" => Ok(Self::Pitcher),
            "C" => Ok(Self::Catcher),
            "1B" => Ok(Self::FirstBase),
            "2B" => Ok(Self::SecondBase),
            "3B" => Ok(Self::ThirdBase),
            "SS" => Ok(Self::ShortStop),
            "OF" | "LF" | "CF" | "RF" => Ok(Self::Outfield),
            other => Err(format!("unknown position '{other}'")),
        }
    }
}

/// Stable player identifier within a slate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One player available on a slate.
///
/// Enrichment that may be missing upstream (implied run totals) is an explicit
/// `Option`. Records are validated once by [`PlayerPool::new`](super::PlayerPool::new)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub positions: Vec<Position>,
    pub team: String,
    pub salary: u32,
    pub projection: f64,
    /// Projected ownership in percent (0–100).
    pub ownership: f64,
    pub ceiling: f64,
    pub floor: f64,
    /// Batting-order slot 1–9; 0 means bench or unknown.
    pub batting_order: u8,
    pub game_id: u32,
    #[serde(default)]
    pub team_total: Option<f64>,
    #[serde(default)]
    pub game_total: Option<f64>,
}

impl Player {
    /// Projected points per $1,000 of salary.
    pub fn value(&self) -> f64 {
        if self.salary == 0 {
            return 0.0;
        }
        self.projection / (self.salary as f64 / 1000.0)
    }

    pub fn is_pitcher(&self) -> bool {
        self.positions.iter().any(Position::is_pitcher)
    }

    /// Hitters are players with at least one non-pitcher position.
    pub fn is_hitter(&self) -> bool {
        self.positions.iter().any(|p| !p.is_pitcher())
    }

    pub fn eligible_for(&self, position: Position) -> bool {
        self.positions.contains(&position)
    }

    pub fn has_batting_slot(&self) -> bool {
        (1..=9).contains(&self.batting_order)
    }

    pub fn position_label(&self) -> String {
        self.positions
            .iter()
            .map(Position::label)
            .collect::<Vec<_>>()
            .join("/")
    }
}
