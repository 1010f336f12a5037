//! Cosine top-k search over an immutable corpus arena.
//!
//! Rows are L2-normalised once at build time so a search is a single
//! (N, dim) @ (dim,) matrix-vector product followed by a stable sort.

use ndarray::{Array1, Array2, ArrayView1};
use tracing::{debug, info};

use crate::types::{CorpusEntry, CorpusStats, RetrievalHit};
use talentrag_core::{Error, Result};

/// Norms below this are treated as zero vectors.
const NORM_EPSILON: f32 = 1e-9;

/// Immutable arena of corpus entries, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    entries: Vec<CorpusEntry>,
    /// Normalised vectors, shape (N, dim), row i belongs to `entries[i]`.
    matrix: Array2<f32>,
    dimension: usize,
}

impl CorpusIndex {
    /// Build the index from positionally paired vectors and texts.
    ///
    /// Fails with `DimensionMismatch` when the two sequences differ in length
    /// or when the vectors do not all share the first vector's length.
    pub fn build(vectors: Vec<Vec<f32>>, texts: Vec<String>) -> Result<Self> {
        if vectors.len() != texts.len() {
            return Err(Error::DimensionMismatch {
                expected: vectors.len(),
                actual: texts.len(),
            });
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if !vectors.is_empty() && dimension == 0 {
            return Err(Error::Corpus("corpus vectors have zero dimension".into()));
        }

        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(Error::Corpus(format!("vector {} has non-finite values", i)));
            }
        }

        let n = vectors.len();
        let mut matrix = Array2::zeros((n, dimension));
        for (i, vector) in vectors.iter().enumerate() {
            let mut row = matrix.row_mut(i);
            row.assign(&ArrayView1::from(vector.as_slice()));
            let norm = row.dot(&row).sqrt();
            if norm > NORM_EPSILON {
                row /= norm;
            }
        }

        let entries = vectors
            .into_iter()
            .zip(texts)
            .map(|(vector, text)| CorpusEntry { vector, text })
            .collect();

        info!("Corpus index built: {} entries, dim={}", n, dimension);

        Ok(Self {
            entries,
            matrix,
            dimension,
        })
    }

    /// An index with no entries and a known dimension.
    pub fn empty(dimension: usize) -> Self {
        Self {
            entries: Vec::new(),
            matrix: Array2::zeros((0, dimension)),
            dimension,
        }
    }

    /// Return up to `top_k` entries ranked by cosine similarity, descending.
    ///
    /// `top_k` is clamped to the corpus size. Equal scores keep corpus order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<RetrievalHit>> {
        if self.dimension != 0 && query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.entries.is_empty() {
            return Err(Error::EmptyIndex);
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(
                "query vector has non-finite values".into(),
            ));
        }

        let mut q = Array1::from(query.to_vec());
        let q_norm = q.dot(&q).sqrt();
        if q_norm > NORM_EPSILON {
            q /= q_norm;
        }

        // (N, dim) @ (dim,) -> (N,)
        let similarities = self.matrix.dot(&q);

        let mut ranked: Vec<(usize, f32)> = similarities.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(top_k.min(self.entries.len()));

        debug!(
            "Corpus search: top_k={}, returned={}, best={:?}",
            top_k,
            ranked.len(),
            ranked.first().map(|&(_, s)| s)
        );

        Ok(ranked
            .into_iter()
            .enumerate()
            .map(|(rank, (index, score))| RetrievalHit {
                index,
                text: self.entries[index].text.clone(),
                score,
                rank,
            })
            .collect())
    }

    pub fn get(&self, index: usize) -> Option<&CorpusEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            entries: self.entries.len(),
            dimension: self.dimension,
        }
    }
}
