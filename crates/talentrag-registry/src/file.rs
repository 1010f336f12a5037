//! JSON manifest registry for deployments without a tracking server.
//!
//! ```json
//! { "models": { "RAG_Recrutamento": [
//!     { "version": "3", "run_id": "a1b2", "metrics": { "manual_rouge1": 0.41 },
//!       "parameters": { "pergunta": "..." } } ] } }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use talentrag_core::{Error, Result};

use crate::registry::ModelRegistry;
use crate::types::{newest, RegisteredVersion};

#[derive(Deserialize)]
struct Manifest {
    #[serde(default)]
    models: HashMap<String, Vec<RegisteredVersion>>,
}

pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ModelRegistry for FileRegistry {
    fn name(&self) -> &str {
        "file"
    }

    async fn latest_version(&self, model_name: &str) -> Result<Option<RegisteredVersion>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Registry(format!(
                "Cannot read registry manifest {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let mut manifest: Manifest = serde_json::from_str(&raw).map_err(|e| {
            Error::Registry(format!(
                "Invalid registry manifest {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let versions = manifest.models.remove(model_name).unwrap_or_default();
        debug!(
            "Registry manifest lists {} versions of {}",
            versions.len(),
            model_name
        );
        Ok(newest(versions, |v| v.version.as_str()))
    }
}
