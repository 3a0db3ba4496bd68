use crate::handlers::prelude::*;

#[derive(Deserialize)]
pub struct CreateTeamRequest {
    name: String,
    founded: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct CreateTeamResponse {
    message: String,
    team: TeamJson,
}

#[post("/api/admin/create-team")]
pub async fn post_create_team(req: HttpRequest, body: web::Json<CreateTeamRequest>) -> HttpResult {
    let state = server_state(&req)?;
    check_password(body.password.as_deref(), &state.admin.api_password)?;
    let body = body.into_inner();
    let team = engine::create_team(&state.db, &body.name, body.founded)
        .await
        .map_err(engine_error_to_http)?;
    state.cache.invalidate();
    Ok(HttpResponse::Ok().json(CreateTeamResponse {
        message: format!("Team '{}' created successfully.", team.name),
        team: team.into(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlayerRequest {
    player_name: String,
    team_id: Option<i64>,
    password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlayerResponse {
    message: String,
    new_player: PlayerJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

#[post("/api/admin/create-player-and-assign")]
pub async fn post_create_player_and_assign(
    req: HttpRequest,
    body: web::Json<CreatePlayerRequest>,
) -> HttpResult {
    let state = server_state(&req)?;
    check_password(body.password.as_deref(), &state.admin.api_password)?;
    let created = engine::create_player_and_assign(&state.db, &body.player_name, body.team_id)
        .await
        .map_err(engine_error_to_http)?;
    state.cache.invalidate();
    let player = created.value;
    let message = match created.warning {
        None => format!("Player '{}' created and assigned successfully.", player.name),
        Some(_) => format!(
            "Player '{}' created successfully, but failed to initialize player_stats.",
            player.name
        ),
    };
    Ok(HttpResponse::Ok().json(CreatePlayerResponse {
        message,
        new_player: player.into(),
        warning: created.warning,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerTeamRequest {
    player_id: i64,
    new_team_id: Option<i64>,
    password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePlayerTeamResponse {
    message: String,
    updated_player: PlayerJson,
}

#[post("/api/admin/update-player-team")]
pub async fn post_update_player_team(
    req: HttpRequest,
    body: web::Json<UpdatePlayerTeamRequest>,
) -> HttpResult {
    let state = server_state(&req)?;
    check_password(body.password.as_deref(), &state.admin.api_password)?;
    let player = engine::update_player_team(&state.db, body.player_id, body.new_team_id)
        .await
        .map_err(engine_error_to_http)?;
    state.cache.invalidate();
    Ok(HttpResponse::Ok().json(UpdatePlayerTeamResponse {
        message: format!(
            "Player {} team assignment updated successfully.",
            player.name
        ),
        updated_player: player.into(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamNameRequest {
    team_id: i64,
    new_name: String,
    password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTeamNameResponse {
    message: String,
    updated_team: TeamJson,
}

#[post("/api/admin/update-team-name")]
pub async fn post_update_team_name(
    req: HttpRequest,
    body: web::Json<UpdateTeamNameRequest>,
) -> HttpResult {
    let state = server_state(&req)?;
    check_password(body.password.as_deref(), &state.admin.api_password)?;
    let team = engine::update_team_name(&state.db, body.team_id, &body.new_name)
        .await
        .map_err(engine_error_to_http)?;
    state.cache.invalidate();
    Ok(HttpResponse::Ok().json(UpdateTeamNameResponse {
        message: format!("Team name updated successfully to '{}'.", team.name),
        updated_team: team.into(),
    }))
}
