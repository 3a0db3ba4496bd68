use crate::handlers::prelude::*;

#[derive(Serialize)]
struct TeamsTmplData<'a> {
    teams: &'a [read_model::TeamSummary],
}

#[get("/teams")]
pub async fn get_teams(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    let teams = read_model::teams(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    render_page(state, "teams", "Teams", TeamsTmplData { teams: &teams })
}

#[derive(Serialize)]
struct TeamTmplData<'a> {
    team: &'a read_model::TeamSummary,
    // 1-based position in the standings.
    position: usize,
    players: Vec<&'a read_model::PlayerSummary>,
    matches: Vec<&'a read_model::MatchSummary>,
}

#[get("/teams/{id}")]
pub async fn get_team(req: HttpRequest, path: web::Path<(i64,)>) -> HttpResult {
    let state = server_state(&req)?;
    let (team_id,) = path.into_inner();
    let teams = read_model::teams(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    let Some((position, team)) = teams.iter().enumerate().find(|(_, t)| t.id == team_id) else {
        return Err(AppHttpError::NotFound(format!("Team {team_id} not found.")));
    };
    let players = read_model::players(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    let matches = read_model::matches(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    render_page(
        state,
        "team",
        &team.name,
        TeamTmplData {
            team,
            position: position + 1,
            players: players
                .iter()
                .filter(|p| p.team_id == Some(team_id))
                .collect(),
            matches: matches.iter().filter(|m| m.involves(team_id)).collect(),
        },
    )
}
