use crate::augment::ResultAugmenter;
use crate::embedding::EmbeddingProvider;
use crate::error::{MatchError, Result};
use crate::retriever::VectorRetriever;
use jobmatch_core::{
    extract_skill_tags, highlight, LexicalMatcher, MatchConfig, MatchResponse, MatchResult, QueryProfile,
    ScoredDocument, Vector, PADDING_SCORE,
};
use jobmatch_extract::{DocumentExtractor, FileTextExtractor};
use jobmatch_storage::{DocumentStore, NativeVectorIndex};
use std::sync::Arc;

pub mod messages {
    pub const UPLOAD_MATCHED: &str = "CV processed and matches retrieved";
    pub const UPLOAD_PARTLY_PADDED: &str = "CV processed. Some jobs are recent listings (no similarity score).";
    pub const UPLOAD_ALL_PADDED: &str =
        "No personalized matches (job postings may not be vectorized yet). Showing recent listings.";
    pub const PROFILE_MATCHED: &str = "Matches retrieved";
    pub const PROFILE_PARTLY_PADDED: &str = "Matches retrieved. Some are recent listings.";
    pub const PROFILE_ALL_PADDED: &str = "No personalized matches. Showing recent listings.";
    pub const NO_PROFILE: &str = "No CV uploaded yet. Upload a CV to get matches.";
    pub const NO_FILE: &str = "No CV file uploaded. Use field name \"cv\" and PDF or DOCX.";
    pub const EMPTY_QUERY: &str = "Query parameter is required";
    pub const NO_EMBEDDING: &str = "Failed to generate CV embedding.";
}

/// How `search_by_text` produced its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Semantic,
    Lexical,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<MatchResult>,
    pub mode: SearchMode,
}

/// An uploaded CV file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub filename: Option<String>,
}

impl Upload {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            filename: None,
        }
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Which operation a profile ranking serves; only changes the message.
#[derive(Clone, Copy)]
enum Caller {
    Profile,
    Upload,
}

impl Caller {
    fn message(self, semantic_count: usize, padded: bool) -> &'static str {
        use messages::*;
        match (self, padded, semantic_count) {
            (Caller::Upload, false, _) => UPLOAD_MATCHED,
            (Caller::Upload, true, 0) => UPLOAD_ALL_PADDED,
            (Caller::Upload, true, _) => UPLOAD_PARTLY_PADDED,
            (Caller::Profile, false, _) => PROFILE_MATCHED,
            (Caller::Profile, true, 0) => PROFILE_ALL_PADDED,
            (Caller::Profile, true, _) => PROFILE_PARTLY_PADDED,
        }
    }
}

/// Composes extraction, embedding, retrieval and padding into the public
/// matching operations.
pub struct MatchOrchestrator {
    config: MatchConfig,
    store: Arc<dyn DocumentStore>,
    embeddings: Arc<EmbeddingProvider>,
    retriever: VectorRetriever,
    augmenter: ResultAugmenter,
    extractor: Arc<dyn DocumentExtractor>,
}

impl MatchOrchestrator {
    pub fn new(config: MatchConfig, store: Arc<dyn DocumentStore>, embeddings: Arc<EmbeddingProvider>) -> Self {
        Self {
            retriever: VectorRetriever::new(store.clone()),
            augmenter: ResultAugmenter::new(store.clone()),
            extractor: Arc::new(FileTextExtractor::default()),
            config,
            store,
            embeddings,
        }
    }

    #[must_use]
    pub fn with_index(mut self, index: Arc<dyn NativeVectorIndex>) -> Self {
        self.retriever = self.retriever.with_index(index);
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn embeddings(&self) -> &EmbeddingProvider {
        &self.embeddings
    }

    /// Ad-hoc text search. Semantic when the query embeds and embedded
    /// postings exist, keyword matching otherwise. Never padded.
    pub async fn search_by_text(&self, query: &str) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MatchError::Validation(messages::EMPTY_QUERY.into()));
        }

        if let Some(embedding) = self.query_embedding(query).await {
            if self.store.count_active_embedded().await? > 0 {
                let results = self.semantic_search(query, &embedding).await?;
                tracing::debug!("Semantic search returned {} results", results.len());
                return Ok(SearchOutcome {
                    results,
                    mode: SearchMode::Semantic,
                });
            }
            tracing::debug!("No embedded postings, using keyword search");
        }

        let docs = self.store.find_active().await?;
        let results: Vec<MatchResult> = LexicalMatcher::new(query)
            .search(docs, self.config.lexical_cap)
            .into_iter()
            .map(|doc| {
                let skills = highlight(query, &doc.skills);
                MatchResult::new(ScoredDocument::new(doc, PADDING_SCORE), skills)
            })
            .collect();
        tracing::debug!("Keyword search returned {} results", results.len());

        Ok(SearchOutcome {
            results,
            mode: SearchMode::Lexical,
        })
    }

    /// Embedding failures only downgrade a text search to keyword matching.
    async fn query_embedding(&self, query: &str) -> Option<Vector> {
        match self.embeddings.generate_embedding(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!("Embedding failed for text search, using keyword search: {}", e);
                None
            }
        }
    }

    async fn semantic_search(&self, query: &str, embedding: &Vector) -> Result<Vec<MatchResult>> {
        let pool = self.config.pool_for(self.config.search_limit);
        let retrieval = self.retriever.retrieve(embedding, pool, pool).await?;
        let floor = self.config.relevance_floor;
        let strategy = retrieval.strategy;

        // The floor is a cosine threshold whichever path produced the scores
        Ok(retrieval
            .hits
            .into_iter()
            .filter(|hit| strategy.to_cosine(hit.score) >= floor)
            .take(self.config.search_limit)
            .map(|hit| {
                let skills = highlight(query, &hit.document.skills);
                MatchResult::new(hit, skills)
            })
            .collect())
    }

    /// Matches for the user's stored profile. A user without a profile gets
    /// an empty response, not an error.
    pub async fn match_from_profile(&self, user_id: &str, limit: Option<usize>) -> Result<MatchResponse> {
        let profile = self.store.find_latest_profile(user_id).await?;
        let Some(profile) = profile.filter(QueryProfile::has_embedding) else {
            return Ok(MatchResponse::empty(messages::NO_PROFILE));
        };

        self.rank_for_profile(&profile.embedding, &profile.extracted_text, limit, Caller::Profile)
            .await
    }

    /// Extract, embed and store a new CV for `user_id`, then match it.
    ///
    /// The profile is written before retrieval; if that write fails the
    /// whole upload fails and nothing is matched.
    pub async fn match_from_upload(&self, user_id: &str, upload: Upload, limit: Option<usize>) -> Result<MatchResponse> {
        if upload.bytes.is_empty() {
            return Err(MatchError::Validation(messages::NO_FILE.into()));
        }
        if upload.bytes.len() > self.config.max_upload_bytes {
            return Err(MatchError::PayloadTooLarge {
                size: upload.bytes.len(),
                limit: self.config.max_upload_bytes,
            });
        }

        let Upload {
            bytes,
            media_type,
            filename,
        } = upload;

        let extractor = Arc::clone(&self.extractor);
        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes, &media_type))
            .await
            .map_err(|e| MatchError::ExtractionFailure(format!("extraction task failed: {e}")))??;

        let embedding = self
            .embeddings
            .generate_embedding(&text)
            .await?
            .ok_or_else(|| MatchError::EmbeddingFailure(messages::NO_EMBEDDING.into()))?;

        let profile = QueryProfile::new(user_id, &text, embedding.clone(), extract_skill_tags(&text))
            .with_original_filename(filename.as_deref());
        self.store.upsert_profile(profile).await.map_err(|e| {
            tracing::error!("Profile upsert failed for user {}: {}", user_id, e);
            MatchError::Persistence(e.to_string())
        })?;

        self.rank_for_profile(&embedding, &text, limit, Caller::Upload).await
    }

    async fn rank_for_profile(
        &self,
        embedding: &Vector,
        source_text: &str,
        limit: Option<usize>,
        caller: Caller,
    ) -> Result<MatchResponse> {
        let limit = self.config.clamp_limit(limit);
        let retrieval = self
            .retriever
            .retrieve(embedding, limit, self.config.pool_for(limit))
            .await?;

        if retrieval.hits.is_empty() {
            match self.store.count_active_embedded().await {
                Ok(count) => tracing::warn!(
                    "0 semantic results: {} active embedded postings, query vector length {}",
                    count,
                    embedding.dim()
                ),
                Err(e) => tracing::warn!("0 semantic results; counting embedded postings failed: {}", e),
            }
        }

        let augmented = self
            .augmenter
            .pad(retrieval.hits, self.config.min_results_for(limit), limit)
            .await?;

        let matches = augmented
            .hits
            .into_iter()
            .map(|hit| {
                let skills = highlight(source_text, &hit.document.skills);
                MatchResult::new(hit, skills)
            })
            .collect();

        Ok(MatchResponse::new(
            matches,
            augmented.semantic_count,
            augmented.padded,
            caller.message(augmented.semantic_count, augmented.padded),
        ))
    }
}
