use async_trait::async_trait;
use jobmatch_core::{CandidateDocument, QueryProfile, Result};

/// Read side of the job collection plus the per-user profile records.
///
/// Document writes belong to the external indexing process and live on the
/// concrete stores, not on this trait.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Active postings carrying a non-empty embedding.
    async fn find_active_embedded(&self) -> Result<Vec<CandidateDocument>>;

    /// All active postings, in store-native order.
    async fn find_active(&self) -> Result<Vec<CandidateDocument>>;

    /// Up to `limit` active postings, newest first.
    async fn find_recent_active(&self, limit: usize) -> Result<Vec<CandidateDocument>>;

    /// Changes whenever a posting is written or removed. Profile writes do
    /// not move it.
    async fn documents_version(&self) -> Result<u64>;

    async fn count_active_embedded(&self) -> Result<usize>;

    /// Replace the user's profile as a whole. Last write wins.
    async fn upsert_profile(&self, profile: QueryProfile) -> Result<()>;

    async fn find_latest_profile(&self, user_id: &str) -> Result<Option<QueryProfile>>;
}

/// Newest first, ties broken by id so the order is stable.
pub(crate) fn sort_recent(docs: &mut [CandidateDocument]) {
    docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}
