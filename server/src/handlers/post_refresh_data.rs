use crate::handlers::prelude::*;

#[derive(Serialize)]
struct RefreshResponse {
    success: bool,
    message: &'static str,
}

#[post("/api/refresh-data")]
pub async fn post_refresh_data(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    state.cache.invalidate();
    Ok(HttpResponse::Ok().json(RefreshResponse {
        success: true,
        message: "Data cache cleared successfully",
    }))
}
