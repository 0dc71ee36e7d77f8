use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::truncate_chars;
use crate::vector::Vector;

pub const MAX_PROFILE_TEXT_CHARS: usize = 30_000;
pub const MAX_FILENAME_CHARS: usize = 255;
pub const MAX_SKILL_CHARS: usize = 100;
pub const MAX_PROFILE_SKILLS: usize = 30;

/// CV-derived matching state for one user.
///
/// There is exactly one logical profile per user; every upload replaces the
/// whole record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryProfile {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    pub extracted_text: String,
    pub embedding: Vector,
    #[serde(default)]
    pub extracted_skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl QueryProfile {
    /// Build a profile, applying the storage caps on text, skills and filename.
    pub fn new(
        user_id: impl Into<String>,
        extracted_text: &str,
        embedding: Vector,
        extracted_skills: Vec<String>,
    ) -> Self {
        let extracted_skills = extracted_skills
            .into_iter()
            .take(MAX_PROFILE_SKILLS)
            .map(|s| truncate_chars(s.trim(), MAX_SKILL_CHARS).to_string())
            .collect();

        Self {
            user_id: user_id.into(),
            original_filename: None,
            extracted_text: truncate_chars(extracted_text.trim(), MAX_PROFILE_TEXT_CHARS).to_string(),
            embedding,
            extracted_skills,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_original_filename(mut self, filename: Option<&str>) -> Self {
        self.original_filename = filename
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(|f| truncate_chars(f, MAX_FILENAME_CHARS).to_string());
        self
    }

    #[inline]
    pub fn has_embedding(&self) -> bool {
        !self.embedding.is_empty()
    }
}
