mod prelude;
mod tmpl_data;

pub mod get_admin;
pub mod get_admin_data;
pub mod get_index;
pub mod get_matches;
pub mod get_players;
pub mod get_teams;
pub mod post_generate_tournament;
pub mod post_process_stats_csv;
pub mod post_refresh_data;
pub mod post_reset_all_stats;
pub mod post_roster;
