use crate::handlers::prelude::*;

const TOP_TEAMS: usize = 8;
const TOP_PLAYERS: usize = 10;
const MATCHES_SHOWN: usize = 5;

#[derive(Serialize)]
struct IndexTmplData {
    teams: Vec<read_model::TeamSummary>,
    players: Vec<read_model::PlayerSummary>,
    upcoming: Vec<read_model::MatchSummary>,
    recent: Vec<read_model::MatchSummary>,
}

#[get("/")]
pub async fn get_index(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    let teams = read_model::teams(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    let players = read_model::players(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    let matches = read_model::matches(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    render_page(
        state,
        "index",
        "Leaderboards",
        IndexTmplData {
            teams: teams.iter().take(TOP_TEAMS).cloned().collect(),
            players: players.iter().take(TOP_PLAYERS).cloned().collect(),
            upcoming: read_model::upcoming(&matches, MATCHES_SHOWN),
            recent: read_model::recent(&matches, MATCHES_SHOWN),
        },
    )
}
