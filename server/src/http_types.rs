use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use derive_more::Display;
use serde::Serialize;

pub type HttpResult = Result<HttpResponse, AppHttpError>;

#[derive(Debug, Display)]
pub enum AppHttpError {
    #[display(fmt = "Internal server error.")]
    Internal,

    #[display(fmt = "Internal error: {_0}")]
    DetailedInternal(String),

    #[display(fmt = "{_0}")]
    BadClientData(String),

    #[display(fmt = "{_0}")]
    NotFound(String),

    #[display(fmt = "Unauthorized: Invalid password.")]
    Unauthorized,

    #[display(fmt = "{_0}")]
    AlreadyExists(String),

    #[display(fmt = "{error}")]
    InvalidUpload {
        error: String,
        details: Vec<String>,
        missing_players: Vec<String>,
    },
}

impl std::error::Error for AppHttpError {}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing_players: Vec<String>,
}

impl actix_web::error::ResponseError for AppHttpError {
    fn error_response(&self) -> HttpResponse {
        let (details, missing_players) = match self {
            AppHttpError::InvalidUpload {
                details,
                missing_players,
                ..
            } => (details.clone(), missing_players.clone()),
            _ => (vec![], vec![]),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            details,
            missing_players,
        })
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppHttpError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            AppHttpError::DetailedInternal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppHttpError::BadClientData(_) => StatusCode::BAD_REQUEST,
            AppHttpError::NotFound(_) => StatusCode::NOT_FOUND,
            AppHttpError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppHttpError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppHttpError::InvalidUpload { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

pub fn check_password(given: Option<&str>, expected: &str) -> Result<(), AppHttpError> {
    match given {
        Some(p) if p == expected => Ok(()),
        _ => Err(AppHttpError::Unauthorized),
    }
}

/// Maps engine failures onto the HTTP error taxonomy. Store failures are logged
/// here and reach the client only as a generic message.
pub fn engine_error_to_http(e: crate::engine::Error) -> AppHttpError {
    use crate::engine::Error;
    match e {
        Error::Db(e) => {
            log::error!("{e}");
            AppHttpError::Internal
        }
        Error::Reset { stage, db_error } => {
            log::error!("Stats reset failed at stage '{stage}': {db_error}");
            AppHttpError::DetailedInternal(format!("Failed to {stage}."))
        }
        Error::NotFound(msg) => AppHttpError::NotFound(msg),
        Error::InvalidArgument(msg) => AppHttpError::BadClientData(msg),
        Error::Conflict(msg) => AppHttpError::BadClientData(msg),
        Error::AlreadyExists(msg) => AppHttpError::AlreadyExists(msg),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::{Error, ResetStage};
    use actix_web::ResponseError;

    #[test]
    fn test_reset_failure_names_stage() {
        let e = engine_error_to_http(Error::Reset {
            stage: ResetStage::ZeroTeamStats,
            db_error: sea_orm::DbErr::Custom("no such table: team_stats".to_owned()),
        });
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "Internal error: Failed to reset team stats.");
    }

    #[test]
    fn test_overflow_is_client_error() {
        let e = engine_error_to_http(Error::InvalidArgument(
            "Total of overall_kills is out of range.".to_owned(),
        ));
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
    }
}
