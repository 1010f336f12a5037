//! Registry lookup trait.

use async_trait::async_trait;

use talentrag_core::Result;

use crate::types::RegisteredVersion;

/// Source of registered model versions.
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Latest registered version of `model_name` with its run metrics and
    /// parameters. `Ok(None)` means the model has no registered version.
    async fn latest_version(&self, model_name: &str) -> Result<Option<RegisteredVersion>>;
}
