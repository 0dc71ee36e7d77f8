use serde::{Deserialize, Serialize};

/// A dense embedding.
///
/// Vectors have no equality semantics; they are only ever compared through
/// [`Vector::cosine_similarity`] or an index's internal metric.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn dot(&self, other: &Vector) -> f32 {
        dot_product(&self.data, &other.data)
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        dot_product(&self.data, &self.data).sqrt()
    }

    /// Cosine similarity `(a . b) / (|a| |b|)`.
    ///
    /// Returns `0.0` when the dimensions differ, either vector has zero norm,
    /// or the result is not finite (NaN/inf components).
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() || self.is_empty() {
            return 0.0;
        }

        let norm_a = self.norm();
        let norm_b = other.norm();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        let similarity = self.dot(other) / (norm_a * norm_b);
        if similarity.is_finite() {
            similarity
        } else {
            0.0
        }
    }

    /// Normalize the vector to unit length
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > f32::EPSILON && norm.is_finite() {
            let inv_norm = 1.0 / norm;
            for x in &mut self.data {
                *x *= inv_norm;
            }
        }
    }

    /// Get normalized copy
    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

/// Dot product with two accumulators for better pipelining.
/// Slices of different length are truncated to the shorter one.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let (a, b) = (&a[..len], &b[..len]);

    let mut sum1 = 0.0f32;
    let mut sum2 = 0.0f32;
    let chunks = len / 2;
    for i in 0..chunks {
        sum1 += a[2 * i] * b[2 * i];
        sum2 += a[2 * i + 1] * b[2 * i + 1];
    }
    if len % 2 == 1 {
        sum1 += a[len - 1] * b[len - 1];
    }
    sum1 + sum2
}
