//! # jobmatch Extract
//!
//! Turns an uploaded CV (PDF or Word) into cleaned plain text.
//!
//! ```rust
//! use jobmatch_extract::{DocumentExtractor, ExtractError, FileTextExtractor};
//!
//! let extractor = FileTextExtractor::default();
//! let err = extractor.extract(b"hello", "image/png").unwrap_err();
//! assert!(matches!(err, ExtractError::UnsupportedMediaType(_)));
//! ```

pub mod clean;
pub mod docx;
pub mod pdf;

use thiserror::Error;

pub use clean::clean_text;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_DOC: &str = "application/msword";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}. Only PDF and DOCX are allowed.")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    ExtractionFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Docx,
    /// Legacy Word. Read with the DOCX reader, which only succeeds for
    /// OOXML files that were mislabelled.
    Doc,
}

impl MediaType {
    /// Parse a MIME type, ignoring parameters and case.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            MIME_PDF => Some(MediaType::Pdf),
            MIME_DOCX => Some(MediaType::Docx),
            MIME_DOC => Some(MediaType::Doc),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Pdf => MIME_PDF,
            MediaType::Docx => MIME_DOCX,
            MediaType::Doc => MIME_DOC,
        }
    }
}

/// Buffer plus media type to normalized text.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], media_type: &str) -> Result<String>;
}

/// Extractor for PDF and Word uploads.
#[derive(Debug, Clone)]
pub struct FileTextExtractor {
    /// Shorter cleaned text is rejected as unreadable
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for FileTextExtractor {
    fn default() -> Self {
        Self {
            min_chars: 50,
            max_chars: 30_000,
        }
    }
}

impl DocumentExtractor for FileTextExtractor {
    fn extract(&self, bytes: &[u8], media_type: &str) -> Result<String> {
        let kind = MediaType::from_mime(media_type)
            .ok_or_else(|| ExtractError::UnsupportedMediaType(media_type.to_string()))?;

        if bytes.is_empty() {
            return Err(ExtractError::InvalidInput("empty file buffer".into()));
        }

        let raw = match kind {
            MediaType::Pdf => pdf::extract_pdf_text(bytes)?,
            MediaType::Docx | MediaType::Doc => docx::extract_docx_text(bytes)?,
        };

        let text = clean_text(&raw, self.max_chars);
        let chars = text.chars().count();
        tracing::debug!("Extracted {} chars from {} upload", chars, kind.mime());

        if chars < self.min_chars {
            return Err(ExtractError::ExtractionFailure(
                "Could not extract enough text from CV. Please ensure the file is not scanned or image-based."
                    .into(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mime() {
        assert_eq!(MediaType::from_mime("application/pdf"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_mime("Application/PDF; charset=binary"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_mime(MIME_DOCX), Some(MediaType::Docx));
        assert_eq!(MediaType::from_mime(MIME_DOC), Some(MediaType::Doc));
        assert_eq!(MediaType::from_mime("text/plain"), None);
        assert_eq!(MediaType::Docx.mime(), MIME_DOCX);
    }

    #[test]
    fn test_empty_buffer_is_invalid_input() {
        let err = FileTextExtractor::default().extract(&[], MIME_PDF).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidInput(_)));
    }

    #[test]
    fn test_unsupported_type_checked_first() {
        let err = FileTextExtractor::default().extract(&[], "text/plain").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedMediaType(ref m) if m == "text/plain"));
    }

    #[test]
    fn test_short_docx_text_is_extraction_failure() {
        let bytes = docx::tests::docx_with_paragraphs(&["Too short"]);
        let err = FileTextExtractor::default().extract(&bytes, MIME_DOCX).unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailure(_)));
    }

    #[test]
    fn test_docx_extraction_cleans_and_caps() {
        let long = "Senior data engineer with Python, SQL and   Kubernetes experience";
        let bytes = docx::tests::docx_with_paragraphs(&[long, "Based in Casablanca"]);

        let text = FileTextExtractor::default().extract(&bytes, MIME_DOCX).unwrap();
        assert_eq!(
            text,
            "Senior data engineer with Python, SQL and Kubernetes experience Based in Casablanca"
        );

        let capped = FileTextExtractor { min_chars: 10, max_chars: 20 }
            .extract(&bytes, MIME_DOCX)
            .unwrap();
        assert_eq!(capped.chars().count(), 20);
    }

    #[test]
    fn test_legacy_doc_is_extraction_failure() {
        // OLE compound file magic, not a zip archive
        let bytes = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0, 0, 0];
        let err = FileTextExtractor::default().extract(&bytes, MIME_DOC).unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailure(_)));
    }

    #[test]
    fn test_garbage_pdf_is_extraction_failure() {
        let err = FileTextExtractor::default()
            .extract(b"definitely not a pdf", MIME_PDF)
            .unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailure(_)));
    }
}
