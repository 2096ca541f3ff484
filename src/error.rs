use ntex::http::StatusCode;
use ntex::web::{HttpResponse, WebResponseError};
use std::fmt;
use thiserror::Error;

/// Errors raised by the ranking core and its file storage.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("invalid score {0}: scores cannot be negative")]
    InvalidScore(i64),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("player not found: {0}")]
    NotFound(String),
    #[error("malformed ranking index: {0}")]
    MalformedIndex(String),
    #[error("ranking storage unavailable: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for RankingError {
    fn from(e: serde_json::Error) -> Self {
        RankingError::MalformedIndex(e.to_string())
    }
}

#[derive(Debug)]
pub enum AppError {
    Storage(RankingError),
    NotFound(String),
    BadRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl WebResponseError for AppError {
    fn error_response(&self, _: &ntex::web::HttpRequest) -> HttpResponse {
        let (status, message) = match self {
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Ranking unavailable"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Player not found"),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
        };
        HttpResponse::build(status).json(&serde_json::json!({ "error": message }))
    }
}

impl From<RankingError> for AppError {
    fn from(e: RankingError) -> Self {
        match e {
            RankingError::InvalidScore(_) | RankingError::InvalidArgument(_) => {
                AppError::BadRequest(e.to_string())
            }
            RankingError::NotFound(name) => AppError::NotFound(name),
            RankingError::MalformedIndex(_) | RankingError::Io(_) => AppError::Storage(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_error_maps_to_app_error() {
        assert!(matches!(
            AppError::from(RankingError::InvalidScore(-1)),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(RankingError::NotFound("Ana".into())),
            AppError::NotFound(name) if name == "Ana"
        ));
        assert!(matches!(
            AppError::from(RankingError::MalformedIndex("bad".into())),
            AppError::Storage(_)
        ));
    }

    #[test]
    fn test_json_error_is_malformed_index() {
        let err = serde_json::from_str::<u64>("-3").unwrap_err();
        assert!(matches!(RankingError::from(err), RankingError::MalformedIndex(_)));
    }
}
