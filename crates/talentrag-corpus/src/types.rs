//! Corpus records and search hits.

use serde::{Deserialize, Serialize};

/// One historical candidate/role record and its precomputed vector.
///
/// Its position in the [`CorpusIndex`](crate::CorpusIndex) is its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub vector: Vec<f32>,
    pub text: String,
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// Position of the matched entry in the corpus.
    pub index: usize,
    pub text: String,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
    /// 0-based rank, 0 is the most similar.
    pub rank: usize,
}

/// Corpus summary for health/validate output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    pub entries: usize,
    pub dimension: usize,
}
