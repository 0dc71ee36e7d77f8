use crate::{ExtractError, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Raw text of every page. pdf-extract panics on some malformed files, so the
/// call is isolated and a panic reported as an extraction failure.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            tracing::warn!("PDF extraction failed: {}", e);
            Err(ExtractError::ExtractionFailure(format!("Failed to read PDF: {e}")))
        }
        Err(_) => {
            tracing::warn!("PDF extraction panicked");
            Err(ExtractError::ExtractionFailure("Failed to read PDF".into()))
        }
    }
}
