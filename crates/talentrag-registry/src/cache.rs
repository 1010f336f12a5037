//! Build-once holder for the served model's metadata.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::registry::ModelRegistry;
use crate::types::ModelMetadataSnapshot;

/// Snapshot taken once at startup and only read afterwards.
#[derive(Debug, Clone)]
pub struct ModelMetadataCache {
    snapshot: ModelMetadataSnapshot,
    built_at: DateTime<Utc>,
}

impl ModelMetadataCache {
    /// Query `registry` for `model_name`. Never fails: a registry error or a
    /// model without versions yields the `Unavailable` snapshot.
    pub async fn build<R: ModelRegistry + ?Sized>(registry: &R, model_name: &str) -> Self {
        let snapshot = match registry.latest_version(model_name).await {
            Ok(Some(version)) => {
                info!(
                    "Model metadata loaded from {}: {} v{}",
                    registry.name(),
                    model_name,
                    version.version
                );
                ModelMetadataSnapshot::from_version(model_name, version)
            }
            Ok(None) => {
                warn!("No registered version of {} in {}", model_name, registry.name());
                ModelMetadataSnapshot::unavailable(
                    model_name,
                    format!("no registered version of {}", model_name),
                )
            }
            Err(e) => {
                warn!("Model metadata unavailable ({}): {}", registry.name(), e);
                ModelMetadataSnapshot::unavailable(model_name, e.to_string())
            }
        };

        Self::from_snapshot(snapshot)
    }

    pub fn from_snapshot(snapshot: ModelMetadataSnapshot) -> Self {
        Self {
            snapshot,
            built_at: Utc::now(),
        }
    }

    pub fn get(&self) -> &ModelMetadataSnapshot {
        &self.snapshot
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}
