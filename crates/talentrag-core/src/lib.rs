//! TalentRAG Core — error taxonomy, configuration, data directory layout.

pub mod config;
pub mod error;

pub use config::{DataPaths, GenerationSettings, RagConfig};
pub use error::{Error, Result};
