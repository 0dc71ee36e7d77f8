use crate::error::{MatchError, Result};
use jobmatch_core::{CandidateDocument, FilterCondition, ScoredDocument, Vector};
use jobmatch_storage::{DocumentStore, NativeVectorIndex};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;

/// Which path produced a retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStrategy {
    /// Native index; scores on the `[0, 1]` relevance scale.
    Native,
    /// Exhaustive cosine scan; scores on the `[-1, 1]` cosine scale.
    BruteForce,
}

impl RetrievalStrategy {
    /// Map a score produced by this path onto the cosine scale.
    #[inline]
    pub fn to_cosine(self, score: f32) -> f32 {
        match self {
            RetrievalStrategy::Native => 2.0 * score - 1.0,
            RetrievalStrategy::BruteForce => score,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Retrieval {
    /// Sorted by score, highest first. Embeddings stripped.
    pub hits: Vec<ScoredDocument>,
    pub strategy: RetrievalStrategy,
}

/// Ranks active embedded postings against a query vector, through the native
/// index when it can serve the query and a brute-force scan otherwise.
pub struct VectorRetriever {
    store: Arc<dyn DocumentStore>,
    index: Option<Arc<dyn NativeVectorIndex>>,
}

impl VectorRetriever {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, index: None }
    }

    #[must_use]
    pub fn with_index(mut self, index: Arc<dyn NativeVectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Top `limit` postings for `query`. `pool_size` candidates are requested
    /// from the native index before filtering.
    pub async fn retrieve(&self, query: &Vector, limit: usize, pool_size: usize) -> Result<Retrieval> {
        if let Some(index) = &self.index {
            match index
                .query(query, pool_size.max(limit), limit, &FilterCondition::active())
                .await
            {
                Ok(hits) if !hits.is_empty() => {
                    let mut hits: Vec<ScoredDocument> = hits
                        .into_iter()
                        .map(|(doc, score)| ScoredDocument::new(doc.without_embedding(), score))
                        .collect();
                    sort_by_score(&mut hits);
                    hits.truncate(limit);
                    tracing::debug!("Native index returned {} hits", hits.len());
                    return Ok(Retrieval {
                        hits,
                        strategy: RetrievalStrategy::Native,
                    });
                }
                Ok(_) => tracing::debug!("Native index returned no hits, scanning"),
                Err(e) if e.is_degradation() => tracing::warn!("{}; falling back to brute-force scan", e),
                Err(e) => return Err(MatchError::Retrieval(e.to_string())),
            }
        }

        let hits = self.brute_force(query, limit).await?;
        Ok(Retrieval {
            hits,
            strategy: RetrievalStrategy::BruteForce,
        })
    }

    async fn brute_force(&self, query: &Vector, limit: usize) -> Result<Vec<ScoredDocument>> {
        let docs = self.store.find_active_embedded().await?;
        let query = query.clone();
        tokio::task::spawn_blocking(move || rank_by_cosine(docs, &query, limit))
            .await
            .map_err(|e| MatchError::Retrieval(format!("scan task failed: {e}")))
    }
}

/// Stable descending sort; equal scores keep their input order.
fn sort_by_score(hits: &mut [ScoredDocument]) {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Cosine-rank `docs` against `query`.
///
/// Only active documents whose embedding has the query's dimension are
/// scored; others are skipped. Non-finite similarities count as zero.
pub fn rank_by_cosine(docs: Vec<CandidateDocument>, query: &Vector, limit: usize) -> Vec<ScoredDocument> {
    let dim = query.dim();

    let mut scored: Vec<ScoredDocument> = docs
        .into_par_iter()
        .filter(|doc| doc.is_active() && doc.has_embedding() && doc.embedding_dim() == Some(dim))
        .map(|doc| {
            let score = doc
                .embedding
                .as_ref()
                .map_or(0.0, |embedding| query.cosine_similarity(embedding));
            let score = if score.is_finite() { score } else { 0.0 };
            ScoredDocument::new(doc.without_embedding(), score)
        })
        .collect();

    sort_by_score(&mut scored);
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jobmatch_core::JobStatus;
    use jobmatch_storage::{IndexError, MemoryStore};
    use parking_lot::Mutex;

    fn job(id: &str, embedding: Vec<f32>) -> CandidateDocument {
        CandidateDocument::new(id, id, "")
            .with_status(JobStatus::Active)
            .with_embedding(Vector::new(embedding))
    }

    fn toy_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .put_documents(vec![
                job("C", vec![0.0, 1.0, 0.0]),
                job("A", vec![1.0, 0.0, 0.0]),
                job("B", vec![0.9, 0.1, 0.0]),
            ])
            .unwrap();
        store
    }

    /// Index stub returning a canned answer and counting calls.
    struct StubIndex {
        answer: Mutex<Option<std::result::Result<Vec<(CandidateDocument, f32)>, IndexError>>>,
    }

    impl StubIndex {
        fn new(answer: std::result::Result<Vec<(CandidateDocument, f32)>, IndexError>) -> Arc<Self> {
            Arc::new(Self {
                answer: Mutex::new(Some(answer)),
            })
        }
    }

    #[async_trait]
    impl NativeVectorIndex for StubIndex {
        async fn query(
            &self,
            _query: &Vector,
            _pool_size: usize,
            _limit: usize,
            _filter: &FilterCondition,
        ) -> std::result::Result<Vec<(CandidateDocument, f32)>, IndexError> {
            self.answer.lock().take().unwrap_or(Ok(Vec::new()))
        }
    }

    fn ids(hits: &[ScoredDocument]) -> Vec<&str> {
        hits.iter().map(ScoredDocument::id).collect()
    }

    #[tokio::test]
    async fn test_brute_force_toy_ordering() {
        let retriever = VectorRetriever::new(toy_store());
        let retrieval = retriever
            .retrieve(&Vector::new(vec![1.0, 0.0, 0.0]), 10, 200)
            .await
            .unwrap();

        assert_eq!(retrieval.strategy, RetrievalStrategy::BruteForce);
        assert_eq!(ids(&retrieval.hits), vec!["A", "B", "C"]);
        assert!((retrieval.hits[0].score - 1.0).abs() < 1e-6);
        assert!((retrieval.hits[1].score - 0.9939).abs() < 1e-3);
        assert!(retrieval.hits[2].score.abs() < 1e-6);
        assert!(retrieval.hits.iter().all(|h| h.document.embedding.is_none()));
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let retriever = VectorRetriever::new(toy_store());
        let retrieval = retriever
            .retrieve(&Vector::new(vec![1.0, 0.0, 0.0]), 2, 200)
            .await
            .unwrap();
        assert_eq!(ids(&retrieval.hits), vec!["A", "B"]);
    }

    #[test]
    fn test_dimension_mismatch_and_inactive_skipped() {
        let docs = vec![
            job("ok", vec![1.0, 0.0, 0.0]),
            job("short", vec![1.0, 0.0]),
            job("long", vec![1.0, 0.0, 0.0, 0.0]),
            job("closed", vec![1.0, 0.0, 0.0]).with_status(JobStatus::Closed),
            CandidateDocument::new("bare", "bare", "").with_status(JobStatus::Active),
        ];
        let hits = rank_by_cosine(docs, &Vector::new(vec![1.0, 0.0, 0.0]), 10);
        assert_eq!(ids(&hits), vec!["ok"]);
    }

    #[test]
    fn test_non_finite_scores_are_zero() {
        let docs = vec![job("nan", vec![f32::NAN, 0.0]), job("good", vec![-1.0, 0.0])];
        let hits = rank_by_cosine(docs, &Vector::new(vec![1.0, 0.0]), 10);
        assert_eq!(ids(&hits), vec!["nan", "good"]);
        assert_eq!(hits[0].score, 0.0);
        assert_eq!(hits[1].score, -1.0);
    }

    #[tokio::test]
    async fn test_unavailable_index_matches_brute_force() {
        let store = toy_store();
        let query = Vector::new(vec![1.0, 0.0, 0.0]);

        let retriever = VectorRetriever::new(store.clone())
            .with_index(StubIndex::new(Err(IndexError::Unavailable("no search index".into()))));
        let retrieval = retriever.retrieve(&query, 10, 200).await.unwrap();

        let expected = rank_by_cosine(store.find_active_embedded().await.unwrap(), &query, 10);
        assert_eq!(retrieval.strategy, RetrievalStrategy::BruteForce);
        assert_eq!(ids(&retrieval.hits), ids(&expected));
        for (got, want) in retrieval.hits.iter().zip(&expected) {
            assert_eq!(got.score, want.score);
        }
    }

    #[tokio::test]
    async fn test_empty_index_result_falls_back() {
        let retriever = VectorRetriever::new(toy_store()).with_index(StubIndex::new(Ok(Vec::new())));
        let retrieval = retriever
            .retrieve(&Vector::new(vec![1.0, 0.0, 0.0]), 10, 200)
            .await
            .unwrap();
        assert_eq!(retrieval.strategy, RetrievalStrategy::BruteForce);
        assert_eq!(retrieval.hits.len(), 3);
    }

    #[tokio::test]
    async fn test_query_error_propagates() {
        let retriever = VectorRetriever::new(toy_store())
            .with_index(StubIndex::new(Err(IndexError::Query("bad vector".into()))));
        let err = retriever
            .retrieve(&Vector::new(vec![1.0, 0.0, 0.0]), 10, 200)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::Retrieval(_)));
    }

    #[test]
    fn test_scores_map_onto_cosine_scale() {
        assert_eq!(RetrievalStrategy::BruteForce.to_cosine(0.3), 0.3);
        assert_eq!(RetrievalStrategy::BruteForce.to_cosine(-0.4), -0.4);
        assert_eq!(RetrievalStrategy::Native.to_cosine(1.0), 1.0);
        assert_eq!(RetrievalStrategy::Native.to_cosine(0.5), 0.0);
        assert_eq!(RetrievalStrategy::Native.to_cosine(0.0), -1.0);
    }

    #[tokio::test]
    async fn test_native_hits_are_used_and_sorted() {
        let native = vec![
            (job("B", vec![0.9, 0.1, 0.0]), 0.7),
            (job("A", vec![1.0, 0.0, 0.0]), 0.9),
        ];
        let retriever = VectorRetriever::new(toy_store()).with_index(StubIndex::new(Ok(native)));
        let retrieval = retriever
            .retrieve(&Vector::new(vec![1.0, 0.0, 0.0]), 1, 200)
            .await
            .unwrap();
        assert_eq!(retrieval.strategy, RetrievalStrategy::Native);
        assert_eq!(ids(&retrieval.hits), vec!["A"]);
        assert!(retrieval.hits[0].document.embedding.is_none());
    }
}
