//! TalentRAG Infer — sentence encoder, causal LM, query cache, token counting.
//!
//! With the `onnx` feature, `OnnxEmbedder` loads all-MiniLM-L6-v2 for 384-dim
//! query vectors and `OnnxGenerator` runs a causal LM (distilgpt2) with greedy
//! decoding. Both are loaded once at startup and shared for the process
//! lifetime.

pub mod cache;
pub mod embedder;
pub mod generator;
pub mod onnx_embedder;
pub mod onnx_generator;
mod onnx_model;
pub mod special_tokens;

pub use cache::QueryCache;
pub use embedder::{EmbedderBackend, EmbeddingResult};
pub use generator::{GenerationEngine, TokenCounter, WhitespaceTokenCounter};
pub use special_tokens::strip_special_tokens;

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;
#[cfg(feature = "onnx")]
pub use onnx_generator::OnnxGenerator;

use std::path::Path;
use std::sync::Arc;

use talentrag_core::Result;

/// A loaded generator together with the token counter matching its vocabulary.
pub struct LoadedGenerator {
    pub engine: Arc<dyn GenerationEngine>,
    pub tokens: Arc<dyn TokenCounter>,
}

/// Load the sentence encoder from `model_dir`.
pub fn create_embedder(model_dir: &Path) -> Result<Arc<dyn EmbedderBackend>> {
    #[cfg(feature = "onnx")]
    {
        let embedder = OnnxEmbedder::load(model_dir)?;
        tracing::info!("Using ONNX encoder (dim={})", embedder.dimension());
        Ok(Arc::new(embedder))
    }

    #[cfg(not(feature = "onnx"))]
    {
        Err(talentrag_core::Error::Config(format!(
            "built without the `onnx` feature; cannot load encoder from {}",
            model_dir.display()
        )))
    }
}

/// Load the causal LM from `model_dir`; its tokenizer becomes the prompt
/// token counter.
pub fn create_generator(model_dir: &Path, max_model_tokens: usize) -> Result<LoadedGenerator> {
    #[cfg(feature = "onnx")]
    {
        let generator = Arc::new(OnnxGenerator::load(model_dir, max_model_tokens)?);
        Ok(LoadedGenerator {
            engine: generator.clone(),
            tokens: generator,
        })
    }

    #[cfg(not(feature = "onnx"))]
    {
        let _ = max_model_tokens;
        Err(talentrag_core::Error::Config(format!(
            "built without the `onnx` feature; cannot load generator from {}",
            model_dir.display()
        )))
    }
}
