use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use jobmatch_matcher::MatchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing user identity")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("File too large (limit {0} bytes)")]
    PayloadTooLarge(usize),

    #[error(transparent)]
    Match(#[from] MatchError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Match(e) => match e {
                MatchError::Validation(_) => StatusCode::BAD_REQUEST,
                MatchError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                MatchError::ExtractionFailure(_) | MatchError::EmbeddingFailure(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                MatchError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                MatchError::Persistence(_) | MatchError::Retrieval(_) | MatchError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// `{"status": "fail" | "error", "message": ...}`; "error" marks 5xx.
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let label = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "error"
        } else {
            "fail"
        };

        HttpResponse::build(status).json(serde_json::json!({
            "status": label,
            "message": self.to_string(),
        }))
    }
}
