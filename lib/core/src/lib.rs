//! # jobmatch Core
//!
//! Core library for the jobmatch semantic matching service.
//!
//! This crate provides the data model and the pure algorithms the pipeline is
//! built from:
//!
//! - [`Vector`] - Dense embedding with cosine similarity
//! - [`CandidateDocument`] - A job posting, optionally embedded
//! - [`QueryProfile`] - A user's CV text, embedding and skill tags
//! - [`MatchResult`] / [`MatchResponse`] - What callers get back
//! - [`to_percentage`] - Score normalization onto 0..=100
//! - [`HnswIndex`] - HNSW approximate nearest neighbor graph
//! - [`LexicalMatcher`] - Keyword fallback for text queries
//!
//! ## Example
//!
//! ```rust
//! use jobmatch_core::{CandidateDocument, JobStatus, Vector, to_percentage, highlight};
//!
//! let job = CandidateDocument::new("job-1", "Data analyst", "Reporting and dashboards")
//!     .with_status(JobStatus::Active)
//!     .with_skills(["SQL", "Python"])
//!     .with_embedding(Vector::new(vec![0.9, 0.1, 0.0]));
//!
//! let query = Vector::new(vec![1.0, 0.0, 0.0]);
//! let score = query.cosine_similarity(job.embedding.as_ref().unwrap());
//! assert_eq!(to_percentage(score), 99);
//! assert_eq!(highlight("I know python", &job.skills), vec!["Python"]);
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod hnsw;
pub mod lexical;
pub mod normalize;
pub mod profile;
pub mod result;
pub mod skills;
pub mod text;
pub mod vector;

pub use config::MatchConfig;
pub use document::{CandidateDocument, JobStatus, SalaryRange};
pub use error::{Error, Result};
pub use filter::{DocumentFilter, FilterCondition};
pub use hnsw::HnswIndex;
pub use lexical::LexicalMatcher;
pub use normalize::to_percentage;
pub use profile::QueryProfile;
pub use result::{MatchResponse, MatchResult, ScoredDocument, PADDING_SCORE};
pub use skills::{extract_skill_tags, highlight, SKILL_VOCABULARY};
pub use text::truncate_chars;
pub use vector::Vector;
