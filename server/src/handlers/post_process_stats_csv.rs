use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};

use crate::ingest::{self, UploadError};

use crate::handlers::prelude::*;

#[derive(Debug, MultipartForm)]
pub struct StatsUploadForm {
    #[multipart(limit = "4MB")]
    file: Option<TempFile>,
    #[multipart(limit = "1KB")]
    password: Option<Text<String>>,
}

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    match_id: i64,
    players_processed: usize,
}

#[post("/api/process-player-stats-csv")]
pub async fn post_process_stats_csv(
    req: HttpRequest,
    MultipartForm(form): MultipartForm<StatsUploadForm>,
) -> HttpResult {
    let state = server_state(&req)?;
    check_password(
        form.password.as_ref().map(|p| p.as_str()),
        &state.admin.upload_password,
    )?;
    let Some(file) = form.file else {
        return Err(AppHttpError::BadClientData(
            "No CSV file provided.".to_owned(),
        ));
    };
    if file.content_type.as_ref().map(|m| m.essence_str()) != Some("text/csv") {
        return Err(AppHttpError::BadClientData(
            "Invalid file type. Please upload a CSV.".to_owned(),
        ));
    }
    let content = tokio::fs::read(file.file.path()).await.map_err(|e| {
        log::error!("Failed to read uploaded file {:?}: {e}", file.file.path());
        AppHttpError::Internal
    })?;
    let content = String::from_utf8(content).map_err(|_| {
        AppHttpError::BadClientData("CSV file must be UTF-8 encoded.".to_owned())
    })?;

    let players = engine::player_ids_by_name(&state.db)
        .await
        .map_err(engine_error_to_http)?;
    let upload = ingest::parse_and_validate(&content, &players).map_err(|e| match e {
        UploadError::Parse(details) => AppHttpError::InvalidUpload {
            error: "Failed to parse CSV file.".to_owned(),
            details,
            missing_players: vec![],
        },
        UploadError::Invalid(report) => AppHttpError::InvalidUpload {
            error: "CSV validation failed.".to_owned(),
            details: report.details,
            missing_players: report.missing_players,
        },
    })?;
    let summary = engine::ingest_match_stats(&state.db, upload)
        .await
        .map_err(engine_error_to_http)?;
    state.cache.invalidate();
    Ok(HttpResponse::Ok().json(UploadResponse {
        message: format!(
            "Successfully processed stats of {} players for match {}.",
            summary.players_processed, summary.match_id
        ),
        match_id: summary.match_id,
        players_processed: summary.players_processed,
    }))
}
