//! Error types for TalentRAG.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Corpus index is empty")]
    EmptyIndex,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable name of the variant, used in per-item batch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::EmptyIndex => "empty_index",
            Self::InvalidInput(_) => "invalid_input",
            Self::MetadataUnavailable(_) => "metadata_unavailable",
            Self::GenerationFailure(_) => "generation_failure",
            Self::Embedding(_) => "embedding",
            Self::Corpus(_) => "corpus",
            Self::Registry(_) => "registry",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
