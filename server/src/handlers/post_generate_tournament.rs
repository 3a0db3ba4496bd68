use rand::{rngs::StdRng, SeedableRng};

use crate::fixtures::{self, Fixture};
use crate::handlers::prelude::*;

#[derive(Serialize)]
struct FixtureJson {
    order: i32,
    round: String,
    stage: &'static str,
    team_a_id: Option<i64>,
    team_b_id: Option<i64>,
    team_a_name: Option<String>,
    team_b_name: Option<String>,
    is_completed: bool,
}

impl From<Fixture> for FixtureJson {
    fn from(f: Fixture) -> Self {
        let (team_a_id, team_a_name) = f.team_a.map(|t| (t.id, t.name)).unzip();
        let (team_b_id, team_b_name) = f.team_b.map(|t| (t.id, t.name)).unzip();
        Self {
            order: f.order,
            round: f.round,
            stage: f.stage.as_str(),
            team_a_id,
            team_b_id,
            team_a_name,
            team_b_name,
            is_completed: false,
        }
    }
}

#[derive(Serialize)]
struct FixturesResponse {
    fixtures: Vec<FixtureJson>,
}

#[post("/api/admin/generate-tournament")]
pub async fn post_generate_tournament(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    let mut rng = StdRng::from_entropy();
    let fixtures = fixtures::generate_tournament(&state.db, &mut rng)
        .await
        .map_err(engine_error_to_http)?;
    state.cache.invalidate();
    Ok(HttpResponse::Ok().json(FixturesResponse {
        fixtures: fixtures.into_iter().map(FixtureJson::from).collect(),
    }))
}
