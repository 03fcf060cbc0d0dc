//! The schedule data model: a fixed 7-day × 6-block grid shared by the team
//! week and by each player's availability.

pub mod grid;
pub mod player;
pub mod week;

pub use grid::{BLOCKS, DAYS, Grid};
pub use player::{Player, RosterEntry, role_availability, roster_entries};
pub use week::Week;
