//! Synthetic slate generation.
//!
//! A slate is a set of games and the player pool drawn from them. Generation
//! is a pure function of `(master seed, slate id, format, size)`: each team
//! gets one starting pitcher and nine hitters, game totals set the run
//! environment, and salary/ownership/ceiling/floor follow from projection.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{ContestFormat, Player, PlayerId, PlayerPool, PoolError, Position};
use crate::rng::RngHierarchy;
use crate::scoring::standard_normal;

const TEAMS: [&str; 30] = [
    "ARI", "ATL", "BAL", "BOS", "CHC", "CWS", "CIN", "CLE", "COL", "DET", "HOU", "KC", "LAA", "LAD",
    "MIA", "MIL", "MIN", "NYM", "NYY", "OAK", "PHI", "PIT", "SD", "SF", "SEA", "STL", "TB", "TEX",
    "TOR", "WSH",
];

/// League-average implied runs per team.
const AVERAGE_TEAM_TOTAL: f64 = 4.25;

/// Base hitter projection by batting-order spot (1-9).
const ORDER_PROJECTION: [f64; 9] = [9.5, 10.0, 10.5, 10.5, 9.5, 8.5, 7.5, 7.0, 6.5];

/// Positional batting templates, spot 1 first.
const LINEUP_TEMPLATES: [[Position; 9]; 2] = {
    use Position::*;
    [
        [ShortStop, Outfield, FirstBase, ThirdBase, Outfield, SecondBase, Catcher, Outfield, Outfield],
        [Outfield, SecondBase, Outfield, FirstBase, ThirdBase, Outfield, ShortStop, Catcher, Outfield],
    ]
};

const HITTER_POSITIONS: [Position; 6] = [
    Position::Catcher,
    Position::FirstBase,
    Position::SecondBase,
    Position::ThirdBase,
    Position::ShortStop,
    Position::Outfield,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlateSize {
    Small,
    Medium,
    Large,
}

impl SlateSize {
    pub const ALL: [SlateSize; 3] = [Self::Small, Self::Medium, Self::Large];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Games on the slate. Showdown is always a single game.
    pub fn games(&self, format: ContestFormat) -> usize {
        match (format, self) {
            (ContestFormat::Showdown, _) => 1,
            (ContestFormat::Classic, Self::Small) => 3,
            (ContestFormat::Classic, Self::Medium) => 7,
            (ContestFormat::Classic, Self::Large) => 12,
        }
    }
}

impl fmt::Display for SlateSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SlateSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(format!("unknown slate size '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: u32,
    pub away: String,
    pub home: String,
    pub total: f64,
    pub away_total: f64,
    pub home_total: f64,
}

#[derive(Debug, Clone)]
pub struct Slate {
    pub id: u64,
    pub format: ContestFormat,
    pub size: SlateSize,
    pub games: Vec<Game>,
    pub pool: PlayerPool,
}

/// Deterministic slate factory.
#[derive(Debug, Clone)]
pub struct SlateGenerator {
    rng: RngHierarchy,
}

impl SlateGenerator {
    pub fn new(master_seed: u64) -> Self {
        Self {
            rng: RngHierarchy::new(master_seed),
        }
    }

    pub fn generate(&self, slate_id: u64, format: ContestFormat, size: SlateSize) -> Result<Slate, PoolError> {
        let scope = format!("slate/{format}/{size}");
        let mut rng = self.rng.rng_for(&scope, slate_id, 0);

        let n_games = size.games(format);
        let mut teams = TEAMS.to_vec();
        teams.shuffle(&mut rng);

        let mut games = Vec::with_capacity(n_games);
        let mut players = Vec::with_capacity(n_games * 20);
        let mut next_id = 1u32;

        for (g, pair) in teams.chunks(2).take(n_games).enumerate() {
            let game_id = g as u32 + 1;
            let total = (8.5 + 1.2 * standard_normal(&mut rng)).clamp(6.0, 13.0);
            let home_share = rng.gen_range(0.42..=0.58);
            let game = Game {
                id: game_id,
                away: pair[0].to_string(),
                home: pair[1].to_string(),
                total,
                away_total: total * (1.0 - home_share),
                home_total: total * home_share,
            };

            for (team, team_total, opp_total) in [
                (&game.away, game.away_total, game.home_total),
                (&game.home, game.home_total, game.away_total),
            ] {
                let ctx = TeamContext {
                    team,
                    game_id,
                    game_total: total,
                    team_total,
                    opp_total,
                };
                players.push(ctx.pitcher(PlayerId(next_id), &mut rng));
                next_id += 1;
                let template = &LINEUP_TEMPLATES[rng.gen_range(0..LINEUP_TEMPLATES.len())];
                for (spot, &position) in template.iter().enumerate() {
                    players.push(ctx.hitter(PlayerId(next_id), spot as u8 + 1, position, &mut rng));
                    next_id += 1;
                }
            }
            games.push(game);
        }

        Ok(Slate {
            id: slate_id,
            format,
            size,
            games,
            pool: PlayerPool::new(players)?,
        })
    }
}

struct TeamContext<'a> {
    team: &'a str,
    game_id: u32,
    game_total: f64,
    team_total: f64,
    opp_total: f64,
}

impl TeamContext<'_> {
    fn pitcher(&self, id: PlayerId, rng: &mut StdRng) -> Player {
        // (weight, salary range, projection range): ace, solid, average, value
        const TIERS: [(f64, (u32, u32), (f64, f64)); 4] = [
            (0.2, (9500, 11000), (18.0, 24.0)),
            (0.3, (7500, 9400), (14.0, 18.0)),
            (0.3, (6000, 7400), (10.0, 14.0)),
            (0.2, (4500, 5900), (7.0, 10.0)),
        ];
        let mut pick = rng.gen::<f64>();
        let mut tier = TIERS[TIERS.len() - 1];
        for t in TIERS {
            pick -= t.0;
            if pick <= 0.0 {
                tier = t;
                break;
            }
        }
        let (_, (lo_sal, hi_sal), (lo_proj, hi_proj)) = tier;

        let salary = round_salary(rng.gen_range(lo_sal..=hi_sal));
        // a weak opposing offense helps
        let matchup = (1.0 + (AVERAGE_TEAM_TOTAL - self.opp_total) * 0.06).clamp(0.8, 1.2);
        let projection = rng.gen_range(lo_proj..=hi_proj) * matchup;
        let ownership = (4.0 + (projection - 7.0) * 1.6 + rng.gen_range(-3.0..=3.0)).clamp(1.0, 55.0);

        Player {
            id,
            name: format!("{} SP", self.team),
            positions: vec![Position::Pitcher],
            team: self.team.to_string(),
            salary,
            projection,
            ownership,
            ceiling: projection * rng.gen_range(1.6..=2.0),
            floor: projection * rng.gen_range(0.3..=0.5),
            batting_order: 0,
            game_id: self.game_id,
            team_total: Some(self.team_total),
            game_total: Some(self.game_total),
        }
    }

    fn hitter(&self, id: PlayerId, spot: u8, position: Position, rng: &mut StdRng) -> Player {
        let mut projection = ORDER_PROJECTION[spot as usize - 1]
            * rng.gen_range(0.8..=1.25)
            * (self.team_total / AVERAGE_TEAM_TOTAL);
        let mut ownership_boost = 1.0;
        if self.game_total >= 10.0 {
            projection *= 1.08;
            ownership_boost = 1.2;
        } else if self.game_total <= 7.0 {
            projection *= 0.92;
            ownership_boost = 0.8;
        }

        let salary_raw = 2000.0 + (projection - 5.0).max(0.0) * 650.0 + 300.0 * standard_normal(rng);
        let salary = round_salary(salary_raw.clamp(2000.0, 6500.0) as u32);

        let value = projection / (salary as f64 / 1000.0);
        let ownership =
            ((2.0 + value * 2.5 + (projection - 6.0) * 0.8 + rng.gen_range(-2.0..=2.0)) * ownership_boost)
                .clamp(0.5, 45.0);

        let mut positions = vec![position];
        if rng.gen_bool(0.15) {
            let others: Vec<Position> = HITTER_POSITIONS.iter().copied().filter(|p| *p != position).collect();
            if let Some(second) = others.choose(rng) {
                positions.push(*second);
            }
        }

        Player {
            id,
            name: format!("{} {}{}", self.team, position.label(), spot),
            positions,
            team: self.team.to_string(),
            salary,
            projection,
            ownership,
            ceiling: projection * rng.gen_range(2.2..=2.8),
            floor: projection * rng.gen_range(0.15..=0.3),
            batting_order: spot,
            game_id: self.game_id,
            team_total: Some(self.team_total),
            game_total: Some(self.game_total),
        }
    }
}

fn round_salary(salary: u32) -> u32 {
    ((salary + 50) / 100) * 100
}
