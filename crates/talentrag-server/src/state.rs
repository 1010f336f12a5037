//! Shared application state.

use std::sync::Arc;

use talentrag_core::RagConfig;
use talentrag_rag::RagPipeline;
use talentrag_registry::ModelMetadataCache;

/// Shared application state accessible from all route handlers. Everything
/// here is built at startup and read-only afterwards.
pub struct AppState {
    pub config: RagConfig,
    pub pipeline: Arc<RagPipeline>,
    pub metadata: ModelMetadataCache,
}

impl AppState {
    pub fn new(config: RagConfig, pipeline: RagPipeline, metadata: ModelMetadataCache) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
            metadata,
        }
    }
}
