//! TalentRAG RAG — prompt assembly under a token budget and the answering
//! pipeline that ties the corpus, encoder and generator together.

pub mod pipeline;
pub mod prompt;
pub mod types;

pub use pipeline::RagPipeline;
pub use prompt::{PromptAssembler, CONTEXT_HEADER, CONTEXT_SEPARATOR};
pub use types::{GenerationRequest, GenerationResult, QueryBatch};
