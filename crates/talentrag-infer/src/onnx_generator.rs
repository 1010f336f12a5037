//! ONNX causal language model (distilgpt2 export) with greedy decoding.
//! Requires the `onnx` feature.
//!
//! The export is expected without past key/values: every step re-runs the
//! whole sequence. Good enough for a 256-token answer on CPU, and it keeps the
//! session stateless between requests.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use ort::session::Session;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::{debug, info};

    use crate::generator::{GenerationEngine, TokenCounter, WhitespaceTokenCounter};
    use crate::onnx_model::{open, row_tensor};
    use talentrag_core::{Error, Result};

    const END_OF_TEXT: &str = "<|endoftext|>";

    pub struct OnnxGenerator {
        /// One session, one request at a time.
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        eos_id: Option<u32>,
        max_model_tokens: usize,
    }

    impl OnnxGenerator {
        /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
        /// `max_model_tokens` is the model's context window (1024 for distilgpt2).
        pub fn load(model_dir: &Path, max_model_tokens: usize) -> Result<Self> {
            let (session, tokenizer) = open(model_dir, "Generator", 4)?;
            let eos_id = tokenizer.token_to_id(END_OF_TEXT);

            info!(
                "ONNX generator loaded from {}: window={}, eos={:?}",
                model_dir.display(),
                max_model_tokens,
                eos_id
            );

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                eos_id,
                max_model_tokens,
            })
        }

        /// Greedy next token for the current sequence.
        fn next_token(&self, session: &mut Session, ids: &[i64]) -> Result<u32> {
            let seq_len = ids.len();
            let inputs = ort::inputs![
                row_tensor(ids.to_vec(), Error::GenerationFailure)?,
                row_tensor(vec![1; seq_len], Error::GenerationFailure)?
            ];

            let outputs = session
                .run(inputs)
                .map_err(|e| Error::GenerationFailure(format!("ONNX inference failed: {}", e)))?;

            // logits: [1, seq_len, vocab]
            let (shape, logits) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| Error::GenerationFailure(format!("Failed to extract logits: {}", e)))?;
            let shape_dims: Vec<i64> = shape.iter().copied().collect();
            let vocab = match shape_dims.as_slice() {
                [1, len, vocab] if *len as usize == seq_len => *vocab as usize,
                other => {
                    return Err(Error::GenerationFailure(format!(
                        "Unexpected logits shape: {:?}",
                        other
                    )))
                }
            };

            let last = &logits[(seq_len - 1) * vocab..seq_len * vocab];
            last.iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(id, _)| id as u32)
                .ok_or_else(|| Error::GenerationFailure("empty vocabulary".into()))
        }
    }

    impl TokenCounter for OnnxGenerator {
        fn count(&self, text: &str) -> usize {
            match self.tokenizer.encode(text, false) {
                Ok(encoding) => encoding.get_ids().len(),
                Err(_) => WhitespaceTokenCounter.count(text),
            }
        }
    }

    impl GenerationEngine for OnnxGenerator {
        fn name(&self) -> &str {
            "onnx-causal-lm"
        }

        fn generate(&self, prompt: &str, max_new_tokens: usize) -> Result<String> {
            let encoding = self
                .tokenizer
                .encode(prompt, false)
                .map_err(|e| Error::GenerationFailure(format!("Tokenization failed: {}", e)))?;
            let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();

            if ids.is_empty() {
                return Err(Error::GenerationFailure("prompt produced no tokens".into()));
            }
            let input_budget = self.max_model_tokens.saturating_sub(max_new_tokens);
            if ids.len() > input_budget {
                return Err(Error::GenerationFailure(format!(
                    "prompt has {} tokens, budget is {}",
                    ids.len(),
                    input_budget
                )));
            }

            let mut generated: Vec<u32> = Vec::with_capacity(max_new_tokens);
            let mut session = self.session.lock();
            for _ in 0..max_new_tokens {
                let next = self.next_token(&mut session, &ids)?;
                if Some(next) == self.eos_id {
                    break;
                }
                generated.push(next);
                ids.push(next as i64);
            }
            drop(session);

            debug!(
                "Generated {} tokens from a {}-token prompt",
                generated.len(),
                encoding.get_ids().len()
            );

            self.tokenizer
                .decode(&generated, true)
                .map_err(|e| Error::GenerationFailure(format!("Decoding failed: {}", e)))
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxGenerator;
