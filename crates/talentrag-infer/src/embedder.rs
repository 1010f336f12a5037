//! Query encoder trait.
//!
//! The corpus side is encoded offline with the same model, so the width
//! reported here must match the corpus index.

use ndarray::Array1;

use talentrag_core::Result;

/// An encoded query.
pub struct EmbeddingResult {
    /// Dense vector (384 wide for all-MiniLM-L6-v2).
    pub embedding: Array1<f32>,
    /// Served from the query cache.
    pub cached: bool,
}

/// Sentence encoder shared by every request.
pub trait EmbedderBackend: Send + Sync {
    /// Short identifier used in logs and `/health`.
    fn name(&self) -> &str;

    fn embed(&self, text: &str) -> Result<EmbeddingResult>;

    /// One result per input, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Vec<Result<EmbeddingResult>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Vector width.
    fn dimension(&self) -> usize;
}
