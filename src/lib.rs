//! # jobmatch
//!
//! Semantic job search and CV matching over embedded job postings.
//!
//! A query (free text, or an uploaded CV) is embedded, ranked against the
//! active postings through an HNSW index or a brute-force cosine scan, and
//! returned with 0-100 scores and highlighted skills. Short CV result sets
//! are padded with recent postings; text queries that cannot be embedded
//! fall back to keyword matching.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! jobmatch --http-port 5000 --embedding-backend ollama --native-index
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use jobmatch::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), MatchError> {
//! let store = Arc::new(MemoryStore::new());
//! store.put_document(
//!     CandidateDocument::new("job-1", "Data analyst", "SQL reporting")
//!         .with_status(JobStatus::Active)
//!         .with_skills(["SQL"])
//!         .with_embedding(HashingModel::new(384).embed("Data analyst SQL reporting")),
//! )?;
//!
//! let provider = Arc::new(EmbeddingProvider::new(HashingLoader { dim: 384 }));
//! let matcher = MatchOrchestrator::new(MatchConfig::default(), store, provider);
//!
//! let outcome = matcher.search_by_text("sql analyst").await?;
//! for result in outcome.results {
//!     println!("{} {}%", result.document.title, result.normalized_score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `jobmatch-core` - Data model, score normalization, skills, lexical matcher, HNSW graph
//! - `jobmatch-storage` - Document store trait, memory and LMDB stores, native vector index
//! - `jobmatch-extract` - PDF and DOCX text extraction
//! - `jobmatch-matcher` - Embedding provider, retriever, padding, orchestrator
//! - `jobmatch-api` - REST API

// Re-export core types
pub use jobmatch_core::{
    highlight, extract_skill_tags, to_percentage,
    CandidateDocument, JobStatus, QueryProfile, Vector,
    MatchConfig, MatchResponse, MatchResult, ScoredDocument,
    Error, Result,
};

// Re-export storage
pub use jobmatch_storage::{DocumentStore, HnswVectorIndex, LmdbStore, MemoryStore, NativeVectorIndex};

// Re-export extraction
pub use jobmatch_extract::{DocumentExtractor, FileTextExtractor};

// Re-export the pipeline
pub use jobmatch_matcher::{
    EmbeddingProvider, HashingLoader, HashingModel, MatchError, MatchOrchestrator, SearchMode, Upload,
    VectorRetriever,
};

// Re-export API
pub use jobmatch_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CandidateDocument, JobStatus, QueryProfile, Vector,
        MatchConfig, MatchResponse, MatchResult,
        DocumentStore, MemoryStore, LmdbStore, HnswVectorIndex,
        EmbeddingProvider, HashingLoader, HashingModel,
        MatchError, MatchOrchestrator, SearchMode, Upload,
        RestApi,
    };
}
