//! # jobmatch Matcher
//!
//! The retrieval and matching pipeline: a lazily loaded embedding model, a
//! vector retriever that degrades from the native index to a brute-force
//! scan, recency padding, and the orchestrator exposing text search and CV
//! matching.

pub mod augment;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod orchestrator;
pub mod remote;
pub mod retriever;

pub use augment::{Augmented, ResultAugmenter};
pub use embedding::{EmbeddingError, EmbeddingModel, EmbeddingProvider, ModelLoader};
pub use error::{MatchError, Result};
pub use hashing::{HashingLoader, HashingModel};
pub use orchestrator::{messages, MatchOrchestrator, SearchMode, SearchOutcome, Upload};
pub use remote::{RemoteBackend, RemoteConfig, RemoteLoader, RemoteModel};
pub use retriever::{rank_by_cosine, Retrieval, RetrievalStrategy, VectorRetriever};
