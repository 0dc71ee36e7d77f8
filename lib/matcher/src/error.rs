use jobmatch_extract::ExtractError;
use thiserror::Error;

use crate::embedding::EmbeddingError;

/// Failures surfaced by the public matching operations.
///
/// The first five are client-facing; `Persistence`, `Retrieval` and `Store`
/// are server-side.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    ExtractionFailure(String),

    #[error("{0}")]
    EmbeddingFailure(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Failed to save CV profile: {0}")]
    Persistence(String),

    #[error("Vector retrieval failed: {0}")]
    Retrieval(String),

    #[error("Store error: {0}")]
    Store(#[from] jobmatch_core::Error),
}

impl MatchError {
    /// True for failures caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MatchError::Validation(_)
                | MatchError::UnsupportedMediaType(_)
                | MatchError::ExtractionFailure(_)
                | MatchError::EmbeddingFailure(_)
                | MatchError::PayloadTooLarge { .. }
        )
    }
}

impl From<ExtractError> for MatchError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UnsupportedMediaType(_) => MatchError::UnsupportedMediaType(e.to_string()),
            ExtractError::ExtractionFailure(msg) => MatchError::ExtractionFailure(msg),
            ExtractError::InvalidInput(msg) => MatchError::Validation(msg),
        }
    }
}

impl From<EmbeddingError> for MatchError {
    fn from(e: EmbeddingError) -> Self {
        MatchError::EmbeddingFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
