// HTTP embedding backends (Ollama and OpenAI-compatible servers)
use crate::embedding::{EmbeddingError, EmbeddingModel, ModelLoader};
use async_trait::async_trait;
use jobmatch_core::{truncate_chars, Vector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Characters sent per request. CVs are long; sentence encoders only look at
/// the first few hundred tokens anyway.
const MAX_EMBED_CHARS: usize = 8_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteBackend {
    Ollama,
    OpenAi,
}

impl std::str::FromStr for RemoteBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(RemoteBackend::Ollama),
            "openai" => Ok(RemoteBackend::OpenAi),
            other => Err(format!("Unknown embedding backend: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub backend: RemoteBackend,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub dimension: usize,
    pub timeout: Duration,
}

pub struct RemoteModel {
    client: reqwest::Client,
    config: RemoteConfig,
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct OpenAiEmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

fn encode_err(e: impl std::fmt::Display) -> EmbeddingError {
    EmbeddingError::Encode(e.to_string())
}

impl RemoteModel {
    pub fn new(config: RemoteConfig) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match self.config.backend {
            RemoteBackend::Ollama => format!("{base}/api/embed"),
            RemoteBackend::OpenAi => format!("{base}/v1/embeddings"),
        }
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let text = truncate_chars(text, MAX_EMBED_CHARS);
        let model = self.config.model.as_str();

        let mut request = self.client.post(self.endpoint());
        request = match self.config.backend {
            RemoteBackend::Ollama => request.json(&OllamaEmbedRequest {
                model,
                input: vec![text],
                truncate: true,
            }),
            RemoteBackend::OpenAi => {
                let request = request.json(&OpenAiEmbedRequest { model, input: vec![text] });
                match self.config.api_key.as_deref() {
                    Some(key) => request.bearer_auth(key),
                    None => request,
                }
            }
        };

        let resp = request.send().await.map_err(encode_err)?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::Encode(format!("embedding API returned {status}: {body}")));
        }

        let embedding = match self.config.backend {
            RemoteBackend::Ollama => resp
                .json::<OllamaEmbedResponse>()
                .await
                .map_err(encode_err)?
                .embeddings
                .into_iter()
                .next(),
            RemoteBackend::OpenAi => resp
                .json::<OpenAiEmbedResponse>()
                .await
                .map_err(encode_err)?
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding),
        };

        embedding.ok_or_else(|| EmbeddingError::Encode("no embedding returned".into()))
    }
}

fn check_dimension(data: Vec<f32>, expected: usize) -> Result<Vector, EmbeddingError> {
    if data.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: data.len(),
        });
    }
    Ok(Vector::new(data))
}

#[async_trait]
impl EmbeddingModel for RemoteModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn encode(&self, text: &str) -> Result<Vector, EmbeddingError> {
        let data = self.request(text).await?;
        check_dimension(data, self.config.dimension)
    }
}

/// Connects to the embedding server and checks it answers with vectors of
/// the configured dimension.
pub struct RemoteLoader {
    pub config: RemoteConfig,
}

#[async_trait]
impl ModelLoader for RemoteLoader {
    async fn load(&self) -> Result<Arc<dyn EmbeddingModel>, EmbeddingError> {
        let model = RemoteModel::new(self.config.clone())?;
        model
            .encode("warm up")
            .await
            .map_err(|e| EmbeddingError::Unavailable(format!("{} probe failed: {}", model.endpoint(), e)))?;
        Ok(Arc::new(model))
    }
}
