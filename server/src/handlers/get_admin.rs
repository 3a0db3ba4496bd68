use crate::handlers::prelude::*;

#[derive(Serialize)]
struct AdminTmplData<'a> {
    teams: &'a [read_model::TeamSummary],
    players: &'a [read_model::PlayerSummary],
    matches_exist: bool,
}

// The page itself is public; every action it offers checks a password.
#[get("/admin")]
pub async fn get_admin(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    let teams = read_model::teams(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    let players = read_model::players(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    let matches_exist = engine::matches_exist(&state.db)
        .await
        .map_err(engine_error_to_http)?;
    render_page(
        state,
        "admin",
        "Admin",
        AdminTmplData {
            teams: &teams,
            players: &players,
            matches_exist,
        },
    )
}
