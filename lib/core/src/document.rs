use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vector::Vector;

/// Publication state of a job posting. Only `Active` postings are ever matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Draft,
    Active,
    Closed,
    Expired,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// A job posting as seen by the matching pipeline.
///
/// Embeddings are written by the external indexing process; when present they
/// are expected to have the deployment's configured dimension, but readers
/// must tolerate a mismatch (see the brute-force scan).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDocument {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Ordered, case preserved, duplicates allowed.
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<SalaryRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vector>,
    pub created_at: DateTime<Utc>,
}

impl CandidateDocument {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            skills: Vec::new(),
            location: String::new(),
            category: String::new(),
            salary: None,
            company_name: None,
            experience_level: None,
            status: JobStatus::Draft,
            embedding: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vector) -> Self {
        self.embedding = Some(embedding);
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == JobStatus::Active
    }

    /// True when an embedding is attached and non-empty.
    #[inline]
    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().is_some_and(|e| !e.is_empty())
    }

    #[inline]
    pub fn embedding_dim(&self) -> Option<usize> {
        self.embedding.as_ref().map(Vector::dim)
    }

    /// Drop the embedding; used before anything leaves the pipeline.
    #[must_use]
    pub fn without_embedding(mut self) -> Self {
        self.embedding = None;
        self
    }

    /// Text the indexing process embeds: title, description and skills.
    pub fn searchable_text(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.skills.join(" "))
    }
}
