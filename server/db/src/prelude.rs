pub use super::matches::Entity as Matches;
pub use super::player_match_stats::Entity as PlayerMatchStats;
pub use super::player_stats::Entity as PlayerStats;
pub use super::players::Entity as Players;
pub use super::team_stats::Entity as TeamStats;
pub use super::teams::Entity as Teams;
