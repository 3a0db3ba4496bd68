use crate::handlers::prelude::*;

#[derive(Serialize)]
struct PlayersTmplData<'a> {
    players: &'a [read_model::PlayerSummary],
}

#[get("/players")]
pub async fn get_players(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    let players = read_model::players(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    render_page(
        state,
        "players",
        "Players",
        PlayersTmplData { players: &players },
    )
}

#[derive(Serialize)]
struct PlayerTmplData<'a> {
    player: &'a read_model::PlayerSummary,
    rank: usize,
}

#[get("/players/{id}")]
pub async fn get_player(req: HttpRequest, path: web::Path<(i64,)>) -> HttpResult {
    let state = server_state(&req)?;
    let (player_id,) = path.into_inner();
    let players = read_model::players(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    let Some((rank, player)) = players
        .iter()
        .enumerate()
        .find(|(_, p)| p.id == player_id)
    else {
        return Err(AppHttpError::NotFound(format!(
            "Player {player_id} not found."
        )));
    };
    render_page(
        state,
        "player",
        &player.name,
        PlayerTmplData {
            player,
            rank: rank + 1,
        },
    )
}
