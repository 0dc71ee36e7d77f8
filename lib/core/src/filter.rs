// Simple document filter implementation
use crate::document::{CandidateDocument, JobStatus};

pub trait DocumentFilter {
    fn matches(&self, doc: &CandidateDocument) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Status(JobStatus),
    HasEmbedding,
    And(Vec<FilterCondition>),
}

impl FilterCondition {
    /// `status = active`
    pub fn active() -> Self {
        FilterCondition::Status(JobStatus::Active)
    }

    /// `status = active` with a non-empty embedding
    pub fn active_embedded() -> Self {
        FilterCondition::And(vec![Self::active(), FilterCondition::HasEmbedding])
    }

    fn matches_condition(condition: &FilterCondition, doc: &CandidateDocument) -> bool {
        match condition {
            FilterCondition::Status(status) => doc.status == *status,
            FilterCondition::HasEmbedding => doc.has_embedding(),
            FilterCondition::And(conditions) => {
                conditions.iter().all(|c| Self::matches_condition(c, doc))
            }
        }
    }
}

impl DocumentFilter for FilterCondition {
    fn matches(&self, doc: &CandidateDocument) -> bool {
        Self::matches_condition(self, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vector;

    #[test]
    fn test_active_embedded() {
        let filter = FilterCondition::active_embedded();
        let base = CandidateDocument::new("1", "t", "");

        assert!(!filter.matches(&base));
        assert!(!filter.matches(&base.clone().with_status(JobStatus::Active)));
        assert!(!filter.matches(&base.clone().with_embedding(Vector::new(vec![1.0]))));
        assert!(filter.matches(
            &base
                .with_status(JobStatus::Active)
                .with_embedding(Vector::new(vec![1.0]))
        ));
    }

    #[test]
    fn test_empty_embedding_is_not_embedded() {
        let doc = CandidateDocument::new("1", "t", "")
            .with_status(JobStatus::Active)
            .with_embedding(Vector::new(Vec::new()));

        assert!(FilterCondition::active().matches(&doc));
        assert!(!FilterCondition::HasEmbedding.matches(&doc));
        assert!(!FilterCondition::active_embedded().matches(&doc));
        assert!(FilterCondition::And(Vec::new()).matches(&doc));
    }
}
