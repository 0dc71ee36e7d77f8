use crate::store::DocumentStore;
use ahash::AHashMap;
use async_trait::async_trait;
use jobmatch_core::{CandidateDocument, DocumentFilter, FilterCondition, HnswIndex, Vector};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum IndexError {
    /// The index cannot serve this query at all (not built, not configured,
    /// backing store down). Callers fall back to a brute-force scan.
    #[error("Vector index unavailable: {0}")]
    Unavailable(String),

    /// The index rejected the query itself.
    #[error("Vector index query failed: {0}")]
    Query(String),
}

impl IndexError {
    #[inline]
    pub fn is_degradation(&self) -> bool {
        matches!(self, IndexError::Unavailable(_))
    }
}

/// Approximate nearest-neighbor search over the job collection.
///
/// Scores are on the `(1 + cosine) / 2` scale, so they lie in `[0, 1]`.
#[async_trait]
pub trait NativeVectorIndex: Send + Sync {
    /// Top `limit` documents among `pool_size` candidates that satisfy
    /// `filter`, most similar first.
    async fn query(
        &self,
        query: &Vector,
        pool_size: usize,
        limit: usize,
        filter: &FilterCondition,
    ) -> Result<Vec<(CandidateDocument, f32)>, IndexError>;
}

/// Snapshot of the store's embedded postings plus their HNSW graph.
/// Documents keep their embeddings so embedding filters still apply.
struct BuiltIndex {
    /// Store document version observed before the snapshot was read.
    version: u64,
    graph: HnswIndex,
    documents: AHashMap<String, CandidateDocument>,
}

/// HNSW index built lazily from a [`DocumentStore`].
///
/// Every query compares the store's document version with the one the graph
/// was built from and rebuilds when postings changed. One build runs at a
/// time; callers arriving during a build wait for it and reuse the result.
pub struct HnswVectorIndex {
    store: Arc<dyn DocumentStore>,
    dim: usize,
    max_connections: usize,
    max_layers: usize,
    built: RwLock<Option<Arc<BuiltIndex>>>,
    build_lock: Mutex<()>,
    builds: AtomicUsize,
}

impl HnswVectorIndex {
    pub fn new(store: Arc<dyn DocumentStore>, dim: usize) -> Self {
        Self {
            store,
            dim,
            max_connections: 16,
            max_layers: 16,
            built: RwLock::new(None),
            build_lock: Mutex::new(()),
            builds: AtomicUsize::new(0),
        }
    }

    /// How many times the graph has been built.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Acquire)
    }

    fn current(&self, version: u64) -> Option<Arc<BuiltIndex>> {
        self.built
            .read()
            .as_ref()
            .filter(|built| built.version >= version)
            .cloned()
    }

    async fn snapshot(&self) -> Result<Arc<BuiltIndex>, IndexError> {
        let version = self
            .store
            .documents_version()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;
        if let Some(built) = self.current(version) {
            return Ok(built);
        }

        let _guard = self.build_lock.lock().await;
        // Another query may have finished the build while this one waited
        if let Some(built) = self.current(version) {
            return Ok(built);
        }

        let docs = self
            .store
            .find_active_embedded()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        let dim = self.dim;
        let (max_connections, max_layers) = (self.max_connections, self.max_layers);
        let built = tokio::task::spawn_blocking(move || build(version, docs, dim, max_connections, max_layers))
            .await
            .map_err(|e| IndexError::Unavailable(format!("index build failed: {e}")))?;
        let built = Arc::new(built);

        self.builds.fetch_add(1, Ordering::AcqRel);
        tracing::info!(
            "Built HNSW index over {} postings (dim {}, version {})",
            built.graph.len(),
            dim,
            version
        );
        *self.built.write() = Some(Arc::clone(&built));
        Ok(built)
    }
}

fn build(
    version: u64,
    docs: Vec<CandidateDocument>,
    dim: usize,
    max_connections: usize,
    max_layers: usize,
) -> BuiltIndex {
    let mut graph = HnswIndex::new(dim, max_connections, max_layers);
    let mut documents = AHashMap::with_capacity(docs.len());
    let mut skipped = 0usize;

    for doc in docs {
        let Some(embedding) = doc.embedding.as_ref() else {
            continue;
        };
        match graph.insert(doc.id.clone(), embedding) {
            Ok(true) => {
                documents.insert(doc.id.clone(), doc);
            }
            Ok(false) => {}
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!("Left {} postings out of the index: embedding dimension is not {}", skipped, dim);
    }

    BuiltIndex {
        version,
        graph,
        documents,
    }
}

#[async_trait]
impl NativeVectorIndex for HnswVectorIndex {
    async fn query(
        &self,
        query: &Vector,
        pool_size: usize,
        limit: usize,
        filter: &FilterCondition,
    ) -> Result<Vec<(CandidateDocument, f32)>, IndexError> {
        if query.dim() != self.dim {
            return Err(IndexError::Query(format!(
                "query dimension {} does not match index dimension {}",
                query.dim(),
                self.dim
            )));
        }

        let built = self.snapshot().await?;
        if built.graph.is_empty() {
            return Err(IndexError::Unavailable(format!("no postings of dimension {} indexed", self.dim)));
        }
        let pool = pool_size.max(limit);

        let hits = built
            .graph
            .search(query, pool, Some(pool))
            .into_iter()
            .filter_map(|(id, cosine)| {
                let doc = built.documents.get(&id)?;
                filter
                    .matches(doc)
                    .then(|| (doc.clone().without_embedding(), ((1.0 + cosine) / 2.0).clamp(0.0, 1.0)))
            })
            .take(limit)
            .collect();

        Ok(hits)
    }
}
