use crate::error::Result;
use ahash::AHashSet;
use jobmatch_core::{CandidateDocument, ScoredDocument};
use jobmatch_storage::DocumentStore;
use std::sync::Arc;

/// Retrieval hits after dedupe and padding.
#[derive(Debug, Clone, Default)]
pub struct Augmented {
    pub hits: Vec<ScoredDocument>,
    /// Leading entries that came from similarity retrieval.
    pub semantic_count: usize,
    /// Recency filler was appended.
    pub padded: bool,
}

/// Pads short result sets with the most recent active postings.
pub struct ResultAugmenter {
    store: Arc<dyn DocumentStore>,
}

impl ResultAugmenter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Dedupe `hits`, cap them at `limit`, and pad with recent postings when
    /// fewer than `min_results` remain. The store is only queried when
    /// padding is needed.
    pub async fn pad(&self, hits: Vec<ScoredDocument>, min_results: usize, limit: usize) -> Result<Augmented> {
        let mut hits = dedupe(hits);
        hits.truncate(limit);

        if hits.len() >= min_results {
            return Ok(Augmented {
                semantic_count: hits.len(),
                hits,
                padded: false,
            });
        }

        let recent = self.store.find_recent_active(limit).await?;
        Ok(pad_with(hits, min_results, limit, recent))
    }
}

/// Keep the first occurrence of every id.
pub fn dedupe(hits: Vec<ScoredDocument>) -> Vec<ScoredDocument> {
    let mut seen = AHashSet::with_capacity(hits.len());
    hits.into_iter()
        .filter(|hit| seen.insert(hit.document.id.clone()))
        .collect()
}

/// Append `recent` postings not already present, scored zero, until `limit`
/// entries are reached. Does nothing when `hits` already has `min_results`.
pub fn pad_with(
    hits: Vec<ScoredDocument>,
    min_results: usize,
    limit: usize,
    recent: Vec<CandidateDocument>,
) -> Augmented {
    let mut hits = dedupe(hits);
    hits.truncate(limit);
    let semantic_count = hits.len();

    if semantic_count >= min_results {
        return Augmented {
            hits,
            semantic_count,
            padded: false,
        };
    }

    let mut seen: AHashSet<String> = hits.iter().map(|h| h.document.id.clone()).collect();
    for doc in recent {
        if hits.len() >= limit {
            break;
        }
        if seen.insert(doc.id.clone()) {
            hits.push(ScoredDocument::padding(doc.without_embedding()));
        }
    }

    let padded = hits.len() > semantic_count;
    if padded {
        tracing::debug!("Padded {} semantic hits with {} recent postings", semantic_count, hits.len() - semantic_count);
    }

    Augmented {
        hits,
        semantic_count,
        padded,
    }
}
