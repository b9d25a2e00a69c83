//! Domain types for slatelab

pub mod contest;
pub mod lineup;
pub mod player;
pub mod pool;
pub mod roster;

pub use contest::{Contest, ContestError, ContestFormat, ContestType, PayoutBand, PayoutStructure};
pub use lineup::{Assignment, Lineup, LineupSummary, LineupViolation, RosterEntry, SummaryRow};
pub use player::{Player, PlayerId, Position};
pub use pool::{PlayerPool, PoolError};
pub use roster::{captain_salary, CaptainRule, RosterSpec, RosterSpecError, Slot};
