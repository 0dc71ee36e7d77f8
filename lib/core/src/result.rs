use serde::Serialize;

use crate::document::CandidateDocument;
use crate::normalize::to_percentage;

/// Score carried by padded entries: no similarity was computed.
pub const PADDING_SCORE: f32 = 0.0;

/// A retrieved document paired with its raw score, before presentation.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: CandidateDocument,
    pub score: f32,
}

impl ScoredDocument {
    #[inline]
    pub fn new(document: CandidateDocument, score: f32) -> Self {
        Self { document, score }
    }

    /// A recency filler entry.
    #[inline]
    pub fn padding(document: CandidateDocument) -> Self {
        Self::new(document, PADDING_SCORE)
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.document.id
    }
}

/// One entry of a response: the posting (embedding stripped), its raw and
/// normalized score, and the posting's skills found in the source text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    #[serde(flatten)]
    pub document: CandidateDocument,
    pub score: f32,
    pub normalized_score: u8,
    pub matching_skills: Vec<String>,
}

impl MatchResult {
    pub fn new(scored: ScoredDocument, matching_skills: Vec<String>) -> Self {
        Self {
            document: scored.document.without_embedding(),
            normalized_score: to_percentage(scored.score),
            score: scored.score,
            matching_skills,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.document.id
    }
}

/// Result of the profile-based operations.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub matches: Vec<MatchResult>,
    pub total: usize,
    /// Entries that came from genuine similarity retrieval.
    pub semantic_count: usize,
    /// Set when recency padding was appended.
    #[serde(skip_serializing_if = "is_false")]
    pub fallback: bool,
    #[serde(skip)]
    pub message: String,
}

impl MatchResponse {
    pub fn new(matches: Vec<MatchResult>, semantic_count: usize, fallback: bool, message: impl Into<String>) -> Self {
        Self {
            total: matches.len(),
            matches,
            semantic_count,
            fallback,
            message: message.into(),
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::new(Vec::new(), 0, false, message)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}
