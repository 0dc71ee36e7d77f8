use crate::vector::dot_product;
use crate::{Error, Result, Vector};
use ahash::{AHashMap, AHashSet};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Candidate for search with distance
#[derive(Clone, Copy)]
struct Candidate {
    idx: usize,
    dist: f32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.idx == other.idx
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: smaller distance = higher priority
        other.dist.partial_cmp(&self.dist).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-heap entry (furthest first), used to bound the result set
#[derive(Clone, Copy)]
struct Furthest {
    idx: usize,
    dist: f32,
}

impl PartialEq for Furthest {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.idx == other.idx
    }
}

impl Eq for Furthest {}

impl Ord for Furthest {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.partial_cmp(&other.dist).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Furthest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
struct HnswNode {
    id: String,
    layers: Vec<Vec<usize>>,
}

/// HNSW graph over job embeddings for approximate nearest neighbor search.
///
/// Vectors are normalized on insert and kept in one contiguous buffer, so the
/// distance is `1 - dot` and the reported similarity is plain cosine.
/// Searching takes `&self`; concurrent readers share one graph.
pub struct HnswIndex {
    nodes: Vec<HnswNode>,
    /// Contiguous storage for all vectors (`dim * nodes.len()` floats)
    vectors: Vec<f32>,
    dim: usize,
    id_to_index: AHashMap<String, usize>,
    entry_point: Option<usize>,
    top_layer: usize,
    max_connections: usize,
    max_layers: usize,
    ef_construction: usize,
}

impl HnswIndex {
    pub fn new(dim: usize, max_connections: usize, max_layers: usize) -> Self {
        Self {
            nodes: Vec::new(),
            vectors: Vec::new(),
            dim,
            id_to_index: AHashMap::new(),
            entry_point: None,
            top_layer: 0,
            max_connections: max_connections.max(1),
            max_layers: max_layers.max(1),
            ef_construction: 200,
        }
    }

    #[must_use]
    pub fn with_ef_construction(mut self, ef_construction: usize) -> Self {
        self.ef_construction = ef_construction.max(1);
        self
    }

    #[inline]
    fn vector(&self, idx: usize) -> &[f32] {
        let start = idx * self.dim;
        &self.vectors[start..start + self.dim]
    }

    #[inline]
    fn distance(&self, query: &[f32], idx: usize) -> f32 {
        1.0 - dot_product(query, self.vector(idx))
    }

    /// Select layer using exponential decay
    #[inline]
    fn select_layer(&self) -> usize {
        let mut layer = 0;
        while layer < self.max_layers - 1 && rand::random::<f32>() < 0.5 {
            layer += 1;
        }
        layer
    }

    /// Best-first search restricted to one layer. Returns up to `ef`
    /// `(node, distance)` pairs sorted nearest first.
    fn search_layer(&self, query: &[f32], entry: usize, ef: usize, layer: usize) -> Vec<(usize, f32)> {
        let mut visited: AHashSet<usize> = AHashSet::with_capacity(ef * 4);
        let mut candidates: BinaryHeap<Candidate> = BinaryHeap::with_capacity(ef * 2);
        let mut results: BinaryHeap<Furthest> = BinaryHeap::with_capacity(ef + 1);

        let entry_dist = self.distance(query, entry);
        visited.insert(entry);
        candidates.push(Candidate { idx: entry, dist: entry_dist });
        results.push(Furthest { idx: entry, dist: entry_dist });

        while let Some(Candidate { idx, dist }) = candidates.pop() {
            let worst = results.peek().map_or(f32::INFINITY, |f| f.dist);
            if results.len() >= ef && dist > worst {
                break;
            }

            let Some(links) = self.nodes[idx].layers.get(layer) else {
                continue;
            };

            for &neighbor in links {
                if !visited.insert(neighbor) {
                    continue;
                }
                let d = self.distance(query, neighbor);
                let worst = results.peek().map_or(f32::INFINITY, |f| f.dist);
                if results.len() < ef || d < worst {
                    candidates.push(Candidate { idx: neighbor, dist: d });
                    results.push(Furthest { idx: neighbor, dist: d });
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut out: Vec<(usize, f32)> = results.into_iter().map(|f| (f.idx, f.dist)).collect();
        out.sort_unstable_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        out
    }

    /// Walk down from `from_layer` to just above `to_layer`, keeping the
    /// closest node at each level.
    fn greedy_descend(&self, query: &[f32], mut entry: usize, from_layer: usize, to_layer: usize) -> usize {
        for layer in ((to_layer + 1)..=from_layer).rev() {
            if let Some(&(closest, _)) = self.search_layer(query, entry, 1, layer).first() {
                entry = closest;
            }
        }
        entry
    }

    fn connect(&mut self, from: usize, to: usize, layer: usize) {
        if layer >= self.nodes[from].layers.len() {
            return;
        }
        self.nodes[from].layers[layer].push(to);

        let limit = self.max_connections * 2;
        if self.nodes[from].layers[layer].len() > limit {
            let base = self.vector(from).to_vec();
            let mut links = std::mem::take(&mut self.nodes[from].layers[layer]);
            links.sort_by(|&a, &b| {
                self.distance(&base, a)
                    .partial_cmp(&self.distance(&base, b))
                    .unwrap_or(Ordering::Equal)
            });
            links.truncate(limit);
            self.nodes[from].layers[layer] = links;
        }
    }

    /// Insert an embedding under `id`. Returns `false` if the id is already present.
    pub fn insert(&mut self, id: impl Into<String>, vector: &Vector) -> Result<bool> {
        if vector.dim() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: vector.dim(),
            });
        }

        let id = id.into();
        if self.id_to_index.contains_key(&id) {
            return Ok(false);
        }

        let normalized = vector.normalized();
        let layer = self.select_layer();
        let idx = self.nodes.len();

        self.vectors.extend_from_slice(normalized.as_slice());
        self.nodes.push(HnswNode {
            id: id.clone(),
            layers: vec![Vec::new(); layer + 1],
        });
        self.id_to_index.insert(id, idx);

        let Some(entry_point) = self.entry_point else {
            self.entry_point = Some(idx);
            self.top_layer = layer;
            return Ok(true);
        };

        let query = normalized.as_slice();
        let mut entry = self.greedy_descend(query, entry_point, self.top_layer, layer);

        for l in (0..=layer.min(self.top_layer)).rev() {
            let candidates = self.search_layer(query, entry, self.ef_construction, l);
            let neighbors: Vec<usize> = candidates
                .iter()
                .take(self.max_connections)
                .map(|(n, _)| *n)
                .collect();

            for &neighbor in &neighbors {
                self.connect(neighbor, idx, l);
            }
            self.nodes[idx].layers[l] = neighbors;

            if let Some(&(closest, _)) = candidates.first() {
                entry = closest;
            }
        }

        if layer > self.top_layer {
            self.top_layer = layer;
            self.entry_point = Some(idx);
        }

        Ok(true)
    }

    /// k nearest ids with their cosine similarity, most similar first.
    ///
    /// A query of the wrong dimension yields no results.
    pub fn search(&self, query: &Vector, k: usize, ef: Option<usize>) -> Vec<(String, f32)> {
        let Some(entry_point) = self.entry_point else {
            return Vec::new();
        };
        if k == 0 || query.dim() != self.dim {
            return Vec::new();
        }

        // ef = k * 1.5, minimum 16
        let ef = ef.unwrap_or_else(|| (k + k / 2).max(16)).max(k);
        let query = query.normalized();
        let entry = self.greedy_descend(query.as_slice(), entry_point, self.top_layer, 0);

        self.search_layer(query.as_slice(), entry, ef, 0)
            .into_iter()
            .take(k)
            .map(|(idx, dist)| (self.nodes[idx].id.clone(), (1.0 - dist).clamp(-1.0, 1.0)))
            .collect()
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
