//! Retrieval-augmented answering: encode, search, assemble, generate.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use talentrag_core::{Error, GenerationSettings, Result};
use talentrag_corpus::{CorpusIndex, RetrievalHit};
use talentrag_infer::{strip_special_tokens, EmbedderBackend, GenerationEngine, TokenCounter};

use crate::prompt::PromptAssembler;
use crate::types::{validate_query, GenerationRequest, GenerationResult};

/// Long-lived pipeline. One encoder and one generator are owned here and
/// reused across every call.
pub struct RagPipeline {
    index: Arc<CorpusIndex>,
    encoder: Arc<dyn EmbedderBackend>,
    generator: Arc<dyn GenerationEngine>,
    assembler: PromptAssembler,
    settings: GenerationSettings,
}

impl RagPipeline {
    /// Fails with `DimensionMismatch` when the encoder cannot produce vectors
    /// comparable with the corpus, and with `Config` for unusable settings.
    pub fn new(
        index: Arc<CorpusIndex>,
        encoder: Arc<dyn EmbedderBackend>,
        generator: Arc<dyn GenerationEngine>,
        tokens: Arc<dyn TokenCounter>,
        settings: GenerationSettings,
    ) -> Result<Self> {
        settings.validate()?;
        if !index.is_empty() && encoder.dimension() != index.dimension() {
            return Err(Error::DimensionMismatch {
                expected: index.dimension(),
                actual: encoder.dimension(),
            });
        }

        info!(
            "RAG pipeline ready: {} contexts (dim={}), encoder={}, generator={}, top_k={}",
            index.len(),
            index.dimension(),
            encoder.name(),
            generator.name(),
            settings.top_k
        );

        Ok(Self {
            index,
            encoder,
            generator,
            assembler: PromptAssembler::new(tokens),
            settings,
        })
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn encoder_name(&self) -> &str {
        self.encoder.name()
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Answer one query with the configured settings.
    pub fn answer(&self, query: &str) -> Result<GenerationResult> {
        self.answer_request(&GenerationRequest::new(query, &self.settings))
    }

    /// Answer each query independently, in input order. An empty list or a
    /// blank query fails the whole call before any work starts; after that,
    /// every position carries its own outcome.
    pub fn answer_many(&self, queries: &[String]) -> Result<Vec<Result<GenerationResult>>> {
        if queries.is_empty() {
            return Err(Error::InvalidInput("no queries provided".into()));
        }
        for (i, query) in queries.iter().enumerate() {
            validate_query(query)
                .map_err(|_| Error::InvalidInput(format!("query {} is empty", i)))?;
        }

        let start = Instant::now();
        let results: Vec<Result<GenerationResult>> = queries
            .iter()
            .enumerate()
            .map(|(i, query)| {
                let result = self.answer(query);
                if let Err(e) = &result {
                    warn!("Query {} of {} failed: {}", i + 1, queries.len(), e);
                }
                result
            })
            .collect();

        info!(
            "Answered batch of {} ({} failed) in {}ms",
            queries.len(),
            results.iter().filter(|r| r.is_err()).count(),
            start.elapsed().as_millis()
        );

        Ok(results)
    }

    /// Top-k hits for `query`, most similar first.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalHit>> {
        validate_query(query)?;
        let encoded = self.encoder.embed(query)?;
        self.index.search(&encoded.embedding.to_vec(), top_k)
    }

    /// Full pipeline for a request whose limits may differ from the defaults.
    pub fn answer_request(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        request.validate()?;
        let start = Instant::now();

        let retrieved = self.retrieve(&request.query, request.top_k)?;
        let texts: Vec<&str> = retrieved.iter().map(|hit| hit.text.as_str()).collect();

        let prompt = self.assembler.assemble(
            &request.query,
            &texts,
            request.max_model_tokens,
            request.max_new_tokens,
        )?;
        debug!(
            "Prompt: {} tokens, {} contexts retrieved",
            self.assembler.count_tokens(&prompt),
            retrieved.len()
        );

        let raw = self.generator.generate(&prompt, request.max_new_tokens)?;
        let answer = strip_special_tokens(&raw);

        debug!(
            "Answered in {}ms ({} chars)",
            start.elapsed().as_millis(),
            answer.len()
        );

        Ok(GenerationResult { answer, retrieved })
    }
}
