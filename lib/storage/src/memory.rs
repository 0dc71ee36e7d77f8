use crate::store::{sort_recent, DocumentStore};
use ahash::AHashMap;
use async_trait::async_trait;
use jobmatch_core::{
    CandidateDocument, DocumentFilter, Error, FilterCondition, QueryProfile, Result,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct DocumentTable {
    /// Insertion order is the store-native order
    rows: Vec<CandidateDocument>,
    positions: AHashMap<String, usize>,
}

/// In-process store for job postings and profiles.
pub struct MemoryStore {
    documents: RwLock<DocumentTable>,
    profiles: RwLock<AHashMap<String, QueryProfile>>,
    dimension: Option<usize>,
    version: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(DocumentTable::default()),
            profiles: RwLock::new(AHashMap::new()),
            dimension: None,
            version: AtomicU64::new(0),
        }
    }

    /// Reject embeddings whose length differs from `dimension`.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            ..Self::new()
        }
    }

    /// Insert or replace a posting.
    pub fn put_document(&self, document: CandidateDocument) -> Result<()> {
        if let (Some(expected), Some(actual)) = (self.dimension, document.embedding_dim()) {
            if actual != expected {
                return Err(Error::InvalidDimension { expected, actual });
            }
        }

        let mut table = self.documents.write();
        match table.positions.get(&document.id) {
            Some(&pos) => table.rows[pos] = document,
            None => {
                let pos = table.rows.len();
                table.positions.insert(document.id.clone(), pos);
                table.rows.push(document);
            }
        }
        drop(table);

        self.version.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    pub fn put_documents(&self, documents: Vec<CandidateDocument>) -> Result<()> {
        for document in documents {
            self.put_document(document)?;
        }
        Ok(())
    }

    pub fn remove_document(&self, id: &str) -> bool {
        let mut guard = self.documents.write();
        let table = &mut *guard;
        let Some(pos) = table.positions.remove(id) else {
            return false;
        };
        table.rows.remove(pos);
        for row in &table.rows[pos..] {
            if let Some(p) = table.positions.get_mut(&row.id) {
                *p -= 1;
            }
        }
        drop(guard);

        self.version.fetch_add(1, Ordering::AcqRel);
        true
    }

    pub fn get_document(&self, id: &str) -> Option<CandidateDocument> {
        let table = self.documents.read();
        table.positions.get(id).map(|&pos| table.rows[pos].clone())
    }

    pub fn document_count(&self) -> usize {
        self.documents.read().rows.len()
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.read().len()
    }

    /// Bumped on every document write.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn select(&self, filter: &FilterCondition) -> Vec<CandidateDocument> {
        self.documents
            .read()
            .rows
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_active_embedded(&self) -> Result<Vec<CandidateDocument>> {
        Ok(self.select(&FilterCondition::active_embedded()))
    }

    async fn find_active(&self) -> Result<Vec<CandidateDocument>> {
        Ok(self.select(&FilterCondition::active()))
    }

    async fn find_recent_active(&self, limit: usize) -> Result<Vec<CandidateDocument>> {
        let mut docs = self.select(&FilterCondition::active());
        sort_recent(&mut docs);
        docs.truncate(limit);
        Ok(docs)
    }

    async fn documents_version(&self) -> Result<u64> {
        Ok(self.version())
    }

    async fn count_active_embedded(&self) -> Result<usize> {
        let filter = FilterCondition::active_embedded();
        Ok(self
            .documents
            .read()
            .rows
            .iter()
            .filter(|doc| filter.matches(doc))
            .count())
    }

    async fn upsert_profile(&self, profile: QueryProfile) -> Result<()> {
        self.profiles.write().insert(profile.user_id.clone(), profile);
        Ok(())
    }

    async fn find_latest_profile(&self, user_id: &str) -> Result<Option<QueryProfile>> {
        Ok(self.profiles.read().get(user_id).cloned())
    }
}
