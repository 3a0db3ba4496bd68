use crate::handlers::prelude::*;

#[derive(Serialize)]
struct StageTmplData<'a> {
    stage: &'static str,
    matches: Vec<&'a read_model::MatchSummary>,
}

#[derive(Serialize)]
struct MatchesTmplData<'a> {
    stages: Vec<StageTmplData<'a>>,
}

#[get("/matches")]
pub async fn get_matches(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    let matches = read_model::matches(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    let stages = [
        db::common::Stage::Group,
        db::common::Stage::SemiFinal,
        db::common::Stage::Final,
    ]
    .into_iter()
    .map(|stage| StageTmplData {
        stage: stage.as_str(),
        matches: matches
            .iter()
            .filter(|m| m.stage == stage.as_str())
            .collect(),
    })
    .filter(|s| !s.matches.is_empty())
    .collect();
    render_page(state, "matches", "Matches", MatchesTmplData { stages })
}

#[derive(Serialize)]
struct MatchTmplData<'a> {
    #[serde(rename = "match")]
    m: &'a read_model::MatchSummary,
    sides: read_model::MatchSides,
}

#[get("/matches/{id}")]
pub async fn get_match(req: HttpRequest, path: web::Path<(i64,)>) -> HttpResult {
    let state = server_state(&req)?;
    let (match_id,) = path.into_inner();
    let matches = read_model::matches(&state.cache, &state.db)
        .await
        .map_err(engine_error_to_http)?;
    let Some(m) = matches.iter().find(|m| m.id == match_id) else {
        return Err(AppHttpError::NotFound(format!("Match {match_id} not found.")));
    };
    let sides = read_model::match_sides(&state.db, m)
        .await
        .map_err(engine_error_to_http)?;
    render_page(state, "match", &m.round, MatchTmplData { m, sides })
}
