//! ONNX sentence encoder (all-MiniLM-L6-v2), the same model the offline job
//! used to embed the corpus. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use ndarray::{Array1, ArrayView2, Axis};
    use ort::session::Session;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::{debug, info};

    use crate::cache::QueryCache;
    use crate::embedder::{EmbedderBackend, EmbeddingResult};
    use crate::onnx_model::{open, row_tensor};
    use talentrag_core::{Error, Result};

    /// Longest input the encoder accepts; longer queries are cut.
    const MAX_SEQ_LEN: usize = 512;

    /// all-MiniLM-L6-v2 output width.
    const MINILM_DIM: usize = 384;

    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        cache: QueryCache,
    }

    impl OnnxEmbedder {
        /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
        pub fn load(model_dir: &Path) -> Result<Self> {
            let (session, tokenizer) = open(model_dir, "Encoder", 2)?;
            info!("ONNX encoder loaded from {} (dim={})", model_dir.display(), MINILM_DIM);

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                cache: QueryCache::default_cache(),
            })
        }

        fn encode(&self, text: &str) -> Result<Array1<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| Error::Embedding(format!("Tokenization failed: {}", e)))?;

            let len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let mask: Vec<i64> = encoding.get_attention_mask()[..len]
                .iter()
                .map(|&m| m as i64)
                .collect();
            let ids: Vec<i64> = encoding.get_ids()[..len].iter().map(|&id| id as i64).collect();

            let inputs = ort::inputs![
                row_tensor(ids, Error::Embedding)?,
                row_tensor(mask.clone(), Error::Embedding)?,
                row_tensor(vec![0; len], Error::Embedding)?
            ];

            let mut session = self.session.lock();
            let outputs = session
                .run(inputs)
                .map_err(|e| Error::Embedding(format!("ONNX inference failed: {}", e)))?;
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| Error::Embedding(format!("Failed to extract output: {}", e)))?;
            let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();

            // SentenceTransformers exports emit either token embeddings
            // [1, seq, dim] or an already pooled [1, dim].
            match dims.as_slice() {
                [1, seq, dim] if *seq == len => {
                    let tokens = ArrayView2::from_shape((len, *dim), &data[..len * dim])
                        .map_err(|e| Error::Embedding(format!("Bad output layout: {}", e)))?;
                    mean_pool(tokens, &mask)
                }
                [1, dim] => Ok(Array1::from_vec(data[..*dim].to_vec())),
                other => Err(Error::Embedding(format!(
                    "Unexpected output shape: {:?}",
                    other
                ))),
            }
        }
    }

    /// Average of the token rows whose mask is set.
    fn mean_pool(tokens: ArrayView2<'_, f32>, mask: &[i64]) -> Result<Array1<f32>> {
        let mut pooled = Array1::<f32>::zeros(tokens.ncols());
        let mut kept = 0usize;
        for (row, _) in tokens.axis_iter(Axis(0)).zip(mask).filter(|(_, m)| **m > 0) {
            pooled += &row;
            kept += 1;
        }
        if kept == 0 {
            return Err(Error::Embedding("empty attention mask".into()));
        }
        Ok(pooled / kept as f32)
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn name(&self) -> &str {
            "onnx-minilm"
        }

        fn embed(&self, text: &str) -> Result<EmbeddingResult> {
            if let Some(embedding) = self.cache.get(text) {
                return Ok(EmbeddingResult {
                    embedding,
                    cached: true,
                });
            }

            let embedding = self.encode(text)?;
            debug!("Encoded query ({} chars)", text.len());
            self.cache.put(text.to_string(), embedding.clone());

            Ok(EmbeddingResult {
                embedding,
                cached: false,
            })
        }

        fn dimension(&self) -> usize {
            MINILM_DIM
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
