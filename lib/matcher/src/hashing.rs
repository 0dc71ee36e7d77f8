// Feature-hashing encoder: no model weights, no network
use crate::embedding::{EmbeddingError, EmbeddingModel, ModelLoader};
use async_trait::async_trait;
use jobmatch_core::Vector;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Deterministic text encoder hashing character trigrams and words into
/// `dim` buckets. Similar wording gives similar vectors, which is enough for
/// development deployments and tests.
#[derive(Debug, Clone)]
pub struct HashingModel {
    dim: usize,
}

impl HashingModel {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed(&self, text: &str) -> Vector {
        let mut vector = vec![0.0f32; self.dim];
        let normalized = text.to_lowercase();

        for word in normalized.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for trigram in chars.windows(3) {
                vector[self.bucket(trigram)] += 1.0;
            }
            // Words contribute more than their trigrams
            vector[self.bucket(word)] += 2.0;
        }

        let mut vector = Vector::new(vector);
        vector.normalize();
        vector
    }

    #[inline]
    fn bucket<T: Hash + ?Sized>(&self, item: &T) -> usize {
        let mut hasher = DefaultHasher::new();
        item.hash(&mut hasher);
        (hasher.finish() % self.dim as u64) as usize
    }
}

#[async_trait]
impl EmbeddingModel for HashingModel {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    async fn encode(&self, text: &str) -> Result<Vector, EmbeddingError> {
        Ok(self.embed(text))
    }
}

pub struct HashingLoader {
    pub dim: usize,
}

#[async_trait]
impl ModelLoader for HashingLoader {
    async fn load(&self) -> Result<Arc<dyn EmbeddingModel>, EmbeddingError> {
        Ok(Arc::new(HashingModel::new(self.dim)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_and_normalized() {
        let model = HashingModel::new(64);
        let a = model.embed("Python data engineer");
        let b = model.embed("python DATA engineer");
        assert_eq!(a.dim(), 64);
        assert_eq!(a.as_slice(), b.as_slice());
        assert!((a.norm() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_related_text_is_closer() {
        let model = HashingModel::new(384);
        let query = model.embed("senior python developer");
        let near = model.embed("python developer with django");
        let far = model.embed("pastry chef for hotel kitchen");
        assert!(query.cosine_similarity(&near) > query.cosine_similarity(&far));
    }

    #[test]
    fn test_blank_text_is_empty_direction() {
        let model = HashingModel::new(16);
        assert!(model.embed("").as_slice().iter().all(|x| *x == 0.0));
    }
}
