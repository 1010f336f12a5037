//! Introspection routes: model metadata and health.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use talentrag_registry::ModelMetadataSnapshot;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/info", get(get_info))
        .route("/health", get(get_health))
}

#[derive(Serialize)]
struct InfoResponse<'a> {
    #[serde(flatten)]
    snapshot: &'a ModelMetadataSnapshot,
    built_at: DateTime<Utc>,
}

/// GET /info — the metadata snapshot taken at startup. No registry I/O.
async fn get_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let response = InfoResponse {
        snapshot: state.metadata.get(),
        built_at: state.metadata.built_at(),
    };
    Json(serde_json::to_value(&response).unwrap_or_else(|e| {
        json!({
            "status": "unavailable",
            "model_name": state.metadata.get().model_name(),
            "message": e.to_string(),
        })
    }))
}

/// GET /health — corpus and model summary.
async fn get_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let pipeline = &state.pipeline;
    let stats = pipeline.index().stats();
    let settings = pipeline.settings();

    Json(json!({
        "status": "healthy",
        "service": "talentrag",
        "corpus": {
            "entries": stats.entries,
            "dimension": stats.dimension,
        },
        "encoder": pipeline.encoder_name(),
        "generator": pipeline.generator_name(),
        "generation": {
            "top_k": settings.top_k,
            "max_new_tokens": settings.max_new_tokens,
            "max_model_tokens": settings.max_model_tokens,
        },
        "model": {
            "name": state.config.model_name,
            "metadata_available": state.metadata.get().is_available(),
        },
    }))
}
