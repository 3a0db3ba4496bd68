pub mod prelude;

pub mod common;
pub mod matches;
pub mod player_match_stats;
pub mod player_stats;
pub mod players;
pub mod team_stats;
pub mod teams;
