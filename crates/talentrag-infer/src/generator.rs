//! Generation engine and token counting traits.
//!
//! A generator is a single stateful resource (weights, scratch buffers).
//! Implementations serialize concurrent calls internally; callers may share
//! one instance behind an `Arc`.

use talentrag_core::Result;

/// Counts prompt length in the generator's token units.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Counts whitespace-separated words. Used when no tokenizer is loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Autoregressive text generator.
pub trait GenerationEngine: Send + Sync {
    /// Short identifier used in logs and `/health`.
    fn name(&self) -> &str;

    /// Generate at most `max_new_tokens` tokens continuing `prompt` and return
    /// only the newly generated text. Errors are final: the pipeline does not
    /// retry.
    fn generate(&self, prompt: &str, max_new_tokens: usize) -> Result<String>;
}
