//! Configuration and data directory layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Registered model name looked up at startup when none is configured.
pub const DEFAULT_MODEL_NAME: &str = "RAG_Recrutamento";

/// Paths to all TalentRAG data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Corpus vectors, one row per context (`data/processed/embeddings.npy`).
    pub embeddings: PathBuf,
    /// Corpus texts, positionally paired with the vectors (`data/processed/contexts.json`).
    pub contexts: PathBuf,
    /// Sentence encoder model directory (`data/models/encoder/`).
    pub encoder_dir: PathBuf,
    /// Causal LM directory (`data/models/generator/`).
    pub generator_dir: PathBuf,
    /// Offline registry manifest (`data/registry.json`).
    pub registry_file: PathBuf,
}

impl DataPaths {
    /// Lay out data paths under a root directory. Nothing is created on disk;
    /// every file here is produced offline and only read by the server.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let processed = root.join("processed");
        let models = root.join("models");
        Self {
            embeddings: processed.join("embeddings.npy"),
            contexts: processed.join("contexts.json"),
            encoder_dir: models.join("encoder"),
            generator_dir: models.join("generator"),
            registry_file: root.join("registry.json"),
            root,
        }
    }
}

/// Retrieval and token-budget knobs applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Number of contexts retrieved per query.
    pub top_k: usize,
    /// Tokens reserved for the generated answer.
    pub max_new_tokens: usize,
    /// Total context window of the generator (prompt + answer).
    pub max_model_tokens: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        // distilgpt2: 1024-token window, 256 of them reserved for the answer.
        Self {
            top_k: 3,
            max_new_tokens: 256,
            max_model_tokens: 1024,
        }
    }
}

impl GenerationSettings {
    /// Reject settings that leave no room for the prompt or the answer.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::Config("top_k must be at least 1".into()));
        }
        if self.max_new_tokens == 0 {
            return Err(Error::Config("max_new_tokens must be positive".into()));
        }
        if self.max_model_tokens <= self.max_new_tokens {
            return Err(Error::Config(format!(
                "max_model_tokens ({}) must exceed max_new_tokens ({})",
                self.max_model_tokens, self.max_new_tokens
            )));
        }
        Ok(())
    }

    /// Token ceiling for the assembled prompt.
    pub fn prompt_budget(&self) -> usize {
        self.max_model_tokens.saturating_sub(self.max_new_tokens)
    }
}

/// Top-level TalentRAG configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data file paths.
    pub data_paths: DataPaths,
    /// Registered model whose metadata is exposed on `/info`.
    pub model_name: String,
    /// MLflow tracking server; `None` falls back to the registry manifest file.
    pub registry_uri: Option<String>,
    /// Per-request generation settings.
    pub generation: GenerationSettings,
}

impl RagConfig {
    /// Defaults rooted at `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            port: 3000,
            data_paths: DataPaths::new(data_dir),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            registry_uri: None,
            generation: GenerationSettings::default(),
        }
    }

    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::new(data_dir);

        config.port = env_parse("PORT").unwrap_or(config.port);
        if let Ok(name) = std::env::var("TALENTRAG_MODEL_NAME") {
            if !name.trim().is_empty() {
                config.model_name = name;
            }
        }
        config.registry_uri = std::env::var("MLFLOW_TRACKING_URI")
            .ok()
            .filter(|uri| !uri.trim().is_empty());

        let generation = &mut config.generation;
        generation.top_k = env_parse("TALENTRAG_TOP_K").unwrap_or(generation.top_k);
        generation.max_new_tokens =
            env_parse("TALENTRAG_MAX_NEW_TOKENS").unwrap_or(generation.max_new_tokens);
        generation.max_model_tokens =
            env_parse("TALENTRAG_MAX_MODEL_TOKENS").unwrap_or(generation.max_model_tokens);

        config.generation.validate()?;
        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_layout() {
        let paths = DataPaths::new("/srv/talentrag");
        assert_eq!(paths.embeddings, PathBuf::from("/srv/talentrag/processed/embeddings.npy"));
        assert_eq!(paths.contexts, PathBuf::from("/srv/talentrag/processed/contexts.json"));
        assert_eq!(paths.generator_dir, PathBuf::from("/srv/talentrag/models/generator"));
        assert_eq!(paths.registry_file, PathBuf::from("/srv/talentrag/registry.json"));
    }

    #[test]
    fn test_default_settings_reserve_answer_tokens() {
        let settings = GenerationSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.prompt_budget(), 768);
    }

    #[test]
    fn test_settings_validation() {
        let no_room = GenerationSettings {
            top_k: 3,
            max_new_tokens: 512,
            max_model_tokens: 512,
        };
        assert!(matches!(no_room.validate(), Err(Error::Config(_))));

        let zero_k = GenerationSettings {
            top_k: 0,
            ..Default::default()
        };
        assert!(zero_k.validate().is_err());

        let zero_new = GenerationSettings {
            max_new_tokens: 0,
            ..Default::default()
        };
        assert!(zero_new.validate().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = RagConfig::new("data");
        assert_eq!(config.port, 3000);
        assert_eq!(config.model_name, DEFAULT_MODEL_NAME);
        assert!(config.registry_uri.is_none());
        assert_eq!(config.generation.top_k, 3);
    }
}
