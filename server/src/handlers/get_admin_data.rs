use crate::handlers::prelude::*;

#[get("/api/admin/get-teams")]
pub async fn get_admin_teams(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    let teams = read_model::teams(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    Ok(HttpResponse::Ok().json(&*teams))
}

#[get("/api/admin/get-players")]
pub async fn get_admin_players(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    let players = read_model::players(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    Ok(HttpResponse::Ok().json(&*players))
}

#[get("/api/admin/get-unassigned-players")]
pub async fn get_unassigned_players(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    let players = read_model::players(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    let unassigned: Vec<&read_model::PlayerSummary> =
        players.iter().filter(|p| p.team_id.is_none()).collect();
    Ok(HttpResponse::Ok().json(unassigned))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchesExistResponse {
    matches_exist: bool,
}

// Read live: the admin page decides whether to offer fixture generation.
#[get("/api/admin/check-matches-exist")]
pub async fn get_check_matches_exist(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    let matches_exist = engine::matches_exist(&state.db)
        .await
        .map_err(engine_error_to_http)?;
    Ok(HttpResponse::Ok().json(MatchesExistResponse { matches_exist }))
}
