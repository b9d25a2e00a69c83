//! Validated, read-only set of players for one slate.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use super::player::{Player, PlayerId, Position};

/// Reasons a player record is rejected at pool construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolError {
    #[error("player pool is empty")]
    Empty,
    #[error("player {id} ({name}) has no eligible positions")]
    NoPositions { id: PlayerId, name: String },
    #[error("player {id} ({name}) has no salary")]
    MissingSalary { id: PlayerId, name: String },
    #[error("player {id} ({name}) has non-positive projection {projection}")]
    InvalidProjection {
        id: PlayerId,
        name: String,
        projection: f64,
    },
    #[error("player {id} ({name}) has ownership {ownership} outside [0, 100]")]
    InvalidOwnership {
        id: PlayerId,
        name: String,
        ownership: f64,
    },
    #[error("player {id} ({name}) has no team")]
    MissingTeam { id: PlayerId, name: String },
    #[error("duplicate player id {0}")]
    DuplicateId(PlayerId),
}

/// Immutable player pool. Players are shared behind `Arc` so lineups can
/// reference them without copying.
#[derive(Debug, Clone)]
pub struct PlayerPool {
    players: Vec<Arc<Player>>,
    index: HashMap<PlayerId, usize>,
}

impl PlayerPool {
    /// Validate every record and build the pool.
    pub fn new(players: Vec<Player>) -> Result<Self, PoolError> {
        if players.is_empty() {
            return Err(PoolError::Empty);
        }

        let mut seen = HashSet::with_capacity(players.len());
        for p in &players {
            validate_player(p)?;
            if !seen.insert(p.id) {
                return Err(PoolError::DuplicateId(p.id));
            }
        }

        let index = players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        let players = players.into_iter().map(Arc::new).collect();
        Ok(Self { players, index })
    }

    pub fn players(&self) -> &[Arc<Player>] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&Arc<Player>> {
        self.index.get(&id).map(|&i| &self.players[i])
    }

    pub fn teams(&self) -> BTreeSet<&str> {
        self.players.iter().map(|p| p.team.as_str()).collect()
    }

    /// Number of players eligible at `position`.
    pub fn eligible_count(&self, position: Position) -> usize {
        self.players
            .iter()
            .filter(|p| p.eligible_for(position))
            .count()
    }
}

fn validate_player(p: &Player) -> Result<(), PoolError> {
    if p.positions.is_empty() {
        return Err(PoolError::NoPositions {
            id: p.id,
            name: p.name.clone(),
        });
    }
    if p.salary == 0 {
        return Err(PoolError::MissingSalary {
            id: p.id,
            name: p.name.clone(),
        });
    }
    if !p.projection.is_finite() || p.projection <= 0.0 {
        return Err(PoolError::InvalidProjection {
            id: p.id,
            name: p.name.clone(),
            projection: p.projection,
        });
    }
    if !(0.0..=100.0).contains(&p.ownership) {
        return Err(PoolError::InvalidOwnership {
            id: p.id,
            name: p.name.clone(),
            ownership: p.ownership,
        });
    }
    if p.team.trim().is_empty() {
        return Err(PoolError::MissingTeam {
            id: p.id,
            name: p.name.clone(),
        });
    }
    Ok(())
}
