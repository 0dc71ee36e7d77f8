use async_trait::async_trait;
use jobmatch_core::Vector;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding model unavailable: {0}")]
    Unavailable(String),

    #[error("Embedding failed: {0}")]
    Encode(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A loaded text encoder. Shared by all requests once loaded.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn encode(&self, text: &str) -> Result<Vector, EmbeddingError>;
}

/// Builds the model on first use.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn EmbeddingModel>, EmbeddingError>;
}

/// Process-wide lazily initialized encoder.
///
/// Concurrent first calls share a single load. A failed load leaves the
/// provider uninitialized, so a later call retries it.
pub struct EmbeddingProvider {
    loader: Box<dyn ModelLoader>,
    model: OnceCell<Arc<dyn EmbeddingModel>>,
    loads: AtomicUsize,
}

impl EmbeddingProvider {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            model: OnceCell::new(),
            loads: AtomicUsize::new(0),
        }
    }

    async fn model(&self) -> Result<&Arc<dyn EmbeddingModel>, EmbeddingError> {
        self.model
            .get_or_try_init(|| async {
                self.loads.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Loading embedding model");

                let model = self.loader.load().await.map_err(|e| {
                    tracing::error!("Embedding model failed to load: {}", e);
                    match e {
                        EmbeddingError::Unavailable(msg) => EmbeddingError::Unavailable(msg),
                        other => EmbeddingError::Unavailable(other.to_string()),
                    }
                })?;

                tracing::info!("Embedding model {} loaded (dim {})", model.name(), model.dimension());
                Ok(model)
            })
            .await
    }

    /// Encode `text`. Blank text yields `Ok(None)`, as does a model that
    /// returns an empty vector.
    pub async fn generate_embedding(&self, text: &str) -> Result<Option<Vector>, EmbeddingError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let model = self.model().await?;
        let vector = model.encode(text).await?;
        Ok((!vector.is_empty()).then_some(vector))
    }

    /// Load the model now instead of on the first request.
    pub async fn warm_up(&self) -> Result<(), EmbeddingError> {
        self.model().await.map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Number of load attempts so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn dimension(&self) -> Option<usize> {
        self.model.get().map(|m| m.dimension())
    }
}
