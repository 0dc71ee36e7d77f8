// LMDB-backed document and profile store
use crate::store::{sort_recent, DocumentStore};
use async_trait::async_trait;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions, RwTxn};
use jobmatch_core::{
    CandidateDocument, DocumentFilter, Error, FilterCondition, QueryProfile, Result,
};
use std::path::Path;
use std::sync::Arc;

const DB_DOCUMENTS: &str = "documents";
const DB_PROFILES: &str = "profiles";
const DB_META: &str = "meta";
const KEY_DOCUMENTS_VERSION: &str = "documents_version";

/// Persistent store. Values are JSON so records written by the indexing
/// process stay readable across schema additions.
///
/// Cloning is cheap; all clones share the same environment.
#[derive(Clone)]
pub struct LmdbStore {
    env: Arc<Env>,
    documents_db: Database<Str, Bytes>,
    profiles_db: Database<Str, Bytes>,
    meta_db: Database<Str, Bytes>,
}

fn storage_err(e: impl std::fmt::Display) -> Error {
    Error::Storage(e.to_string())
}

impl LmdbStore {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::open_with_map_size(path, 10 * 1024 * 1024 * 1024)
    }

    pub fn open_with_map_size<P: AsRef<Path>>(path: P, map_size: usize) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&path)?;

        let env = Arc::new(unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(4)
                .open(path.as_ref())?
        });

        let mut wtxn = env.write_txn()?;
        let documents_db = env.create_database(&mut wtxn, Some(DB_DOCUMENTS))?;
        let profiles_db = env.create_database(&mut wtxn, Some(DB_PROFILES))?;
        let meta_db = env.create_database(&mut wtxn, Some(DB_META))?;
        wtxn.commit()?;

        tracing::info!("Opened LMDB store at {}", path.as_ref().display());

        Ok(Self {
            env,
            documents_db,
            profiles_db,
            meta_db,
        })
    }

    /// Insert or replace a posting. Used by indexing tools and tests.
    pub fn put_document(&self, document: &CandidateDocument) -> Result<()> {
        let data = serde_json::to_vec(document)?;
        let mut wtxn = self.env.write_txn().map_err(storage_err)?;
        self.documents_db
            .put(&mut wtxn, &document.id, &data)
            .map_err(storage_err)?;
        self.bump_version(&mut wtxn)?;
        wtxn.commit().map_err(storage_err)
    }

    pub fn put_documents(&self, documents: &[CandidateDocument]) -> Result<()> {
        let mut wtxn = self.env.write_txn().map_err(storage_err)?;
        for document in documents {
            let data = serde_json::to_vec(document)?;
            self.documents_db
                .put(&mut wtxn, &document.id, &data)
                .map_err(storage_err)?;
        }
        self.bump_version(&mut wtxn)?;
        wtxn.commit().map_err(storage_err)
    }

    pub fn get_document(&self, id: &str) -> Result<Option<CandidateDocument>> {
        let rtxn = self.env.read_txn().map_err(storage_err)?;
        match self.documents_db.get(&rtxn, id).map_err(storage_err)? {
            Some(data) => Ok(Some(serde_json::from_slice(data)?)),
            None => Ok(None),
        }
    }

    pub fn delete_document(&self, id: &str) -> Result<bool> {
        let mut wtxn = self.env.write_txn().map_err(storage_err)?;
        let existed = self.documents_db.delete(&mut wtxn, id).map_err(storage_err)?;
        if existed {
            self.bump_version(&mut wtxn)?;
        }
        wtxn.commit().map_err(storage_err)?;
        Ok(existed)
    }

    /// The version counter moves in the same transaction as the documents.
    fn bump_version(&self, wtxn: &mut RwTxn) -> Result<()> {
        let current = self.read_version_in(wtxn)?;
        self.meta_db
            .put(wtxn, KEY_DOCUMENTS_VERSION, &(current + 1).to_be_bytes())
            .map_err(storage_err)
    }

    fn read_version_in(&self, txn: &heed::RoTxn) -> Result<u64> {
        let raw = self.meta_db.get(txn, KEY_DOCUMENTS_VERSION).map_err(storage_err)?;
        Ok(raw
            .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
            .map(u64::from_be_bytes)
            .unwrap_or(0))
    }

    fn read_version(&self) -> Result<u64> {
        let rtxn = self.env.read_txn().map_err(storage_err)?;
        self.read_version_in(&rtxn)
    }

    /// Full scan in key order. Undecodable records are skipped with a warning.
    fn scan(&self, filter: &FilterCondition) -> Result<Vec<CandidateDocument>> {
        let rtxn = self.env.read_txn().map_err(storage_err)?;
        let mut docs = Vec::new();
        for entry in self.documents_db.iter(&rtxn).map_err(storage_err)? {
            let (key, data) = entry.map_err(storage_err)?;
            match serde_json::from_slice::<CandidateDocument>(data) {
                Ok(doc) if filter.matches(&doc) => docs.push(doc),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping undecodable document {}: {}", key, e),
            }
        }
        Ok(docs)
    }

    fn write_profile(&self, profile: &QueryProfile) -> Result<()> {
        let data = serde_json::to_vec(profile)?;
        let mut wtxn = self.env.write_txn().map_err(storage_err)?;
        self.profiles_db
            .put(&mut wtxn, &profile.user_id, &data)
            .map_err(storage_err)?;
        wtxn.commit().map_err(storage_err)
    }

    fn read_profile(&self, user_id: &str) -> Result<Option<QueryProfile>> {
        let rtxn = self.env.read_txn().map_err(storage_err)?;
        match self.profiles_db.get(&rtxn, user_id).map_err(storage_err)? {
            Some(data) => Ok(Some(serde_json::from_slice(data)?)),
            None => Ok(None),
        }
    }

    /// Run a blocking LMDB call off the async workers.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(LmdbStore) -> Result<T> + Send + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_blocking(move || f(this))
            .await
            .map_err(|e| Error::Storage(format!("blocking task failed: {e}")))?
    }
}

#[async_trait]
impl DocumentStore for LmdbStore {
    async fn find_active_embedded(&self) -> Result<Vec<CandidateDocument>> {
        self.blocking(|store| store.scan(&FilterCondition::active_embedded()))
            .await
    }

    async fn find_active(&self) -> Result<Vec<CandidateDocument>> {
        self.blocking(|store| store.scan(&FilterCondition::active())).await
    }

    async fn find_recent_active(&self, limit: usize) -> Result<Vec<CandidateDocument>> {
        self.blocking(move |store| {
            let mut docs = store.scan(&FilterCondition::active())?;
            sort_recent(&mut docs);
            docs.truncate(limit);
            Ok(docs)
        })
        .await
    }

    async fn documents_version(&self) -> Result<u64> {
        self.blocking(|store| store.read_version()).await
    }

    async fn count_active_embedded(&self) -> Result<usize> {
        self.blocking(|store| Ok(store.scan(&FilterCondition::active_embedded())?.len()))
            .await
    }

    async fn upsert_profile(&self, profile: QueryProfile) -> Result<()> {
        self.blocking(move |store| store.write_profile(&profile)).await
    }

    async fn find_latest_profile(&self, user_id: &str) -> Result<Option<QueryProfile>> {
        let user_id = user_id.to_string();
        self.blocking(move |store| store.read_profile(&user_id)).await
    }
}
