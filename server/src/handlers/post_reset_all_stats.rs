use crate::handlers::prelude::*;

#[derive(Deserialize)]
pub struct ResetRequest {
    password: Option<String>,
}

#[post("/api/admin/reset-all-stats")]
pub async fn post_reset_all_stats(req: HttpRequest, body: web::Json<ResetRequest>) -> HttpResult {
    let state = server_state(&req)?;
    check_password(body.password.as_deref(), &state.admin.reset_password)?;
    let result = engine::reset_all_stats(&state.db).await;
    // Stages before a failed one are already applied.
    state.cache.invalidate();
    result.map_err(engine_error_to_http)?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "All stats reset successfully".to_owned(),
    }))
}
