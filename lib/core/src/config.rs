use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tuning knobs for the matching pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Embedding dimension of the deployment (all-MiniLM-L6-v2 produces 384).
    pub embedding_dim: usize,
    /// Minimum raw score for ad-hoc text search results.
    pub relevance_floor: f32,
    /// Candidates requested from the native index before filtering.
    pub candidate_pool: usize,
    pub default_limit: usize,
    pub max_limit: usize,
    /// Profile matches are padded up to `min(min_results, limit)`.
    pub min_results: usize,
    /// Result count for ad-hoc text search.
    pub search_limit: usize,
    /// Result cap for the lexical fallback.
    pub lexical_cap: usize,
    pub max_upload_bytes: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 384,
            relevance_floor: 0.3,
            candidate_pool: 200,
            default_limit: 20,
            max_limit: 50,
            min_results: 10,
            search_limit: 20,
            lexical_cap: 50,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(Error::InvalidConfig("embedding_dim must be positive".into()));
        }
        if !(-1.0..=1.0).contains(&self.relevance_floor) {
            return Err(Error::InvalidConfig(format!(
                "relevance_floor must lie in [-1, 1], got {}",
                self.relevance_floor
            )));
        }
        if self.max_limit == 0 {
            return Err(Error::InvalidConfig("max_limit must be positive".into()));
        }
        if self.default_limit > self.max_limit {
            return Err(Error::InvalidConfig(format!(
                "default_limit ({}) exceeds max_limit ({})",
                self.default_limit, self.max_limit
            )));
        }
        Ok(())
    }

    /// Missing or zero limits fall back to the default; large ones are capped.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(0) | None => self.default_limit,
            Some(n) => n.min(self.max_limit),
        }
    }

    #[inline]
    pub fn min_results_for(&self, limit: usize) -> usize {
        self.min_results.min(limit)
    }

    /// Over-fetch for recall: never fewer candidates than results.
    #[inline]
    pub fn pool_for(&self, limit: usize) -> usize {
        self.candidate_pool.max(limit)
    }
}
