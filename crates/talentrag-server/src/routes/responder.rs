//! Inference route: `POST /responder`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use talentrag_core::Error;
use talentrag_rag::{GenerationResult, QueryBatch};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/responder", post(responder))
}

#[derive(Deserialize, Default)]
struct ResponderParams {
    #[serde(default)]
    include_context: bool,
}

/// POST /responder — one answer per query, in request order.
///
/// Body: `"pergunta"`, `["p1", "p2"]` or `{"perguntas": [...]}`.
async fn responder(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResponderParams>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    let batch = match QueryBatch::from_json(&body) {
        Ok(batch) => batch,
        Err(e) => {
            warn!("[{}] Rejected request: {}", request_id, e);
            return error_response(&e);
        }
    };
    let count = batch.len();

    // Encoding and decoding are CPU-bound; keep them off the async workers.
    let pipeline = state.pipeline.clone();
    let queries = batch.into_inner();
    let outcome = tokio::task::spawn_blocking(move || pipeline.answer_many(&queries)).await;

    let results = match outcome {
        Ok(Ok(results)) => results,
        Ok(Err(e)) => {
            warn!("[{}] Batch failed: {}", request_id, e);
            return error_response(&e);
        }
        Err(e) => {
            error!("[{}] Inference task panicked: {}", request_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "inference task failed", "kind": "internal" })),
            );
        }
    };

    let failed = results.iter().filter(|r| r.is_err()).count();
    let items: Vec<Value> = results
        .into_iter()
        .map(|result| render_item(result, params.include_context))
        .collect();

    info!(
        "[{}] /responder: {} queries, {} failed, {}ms",
        request_id,
        count,
        failed,
        start.elapsed().as_millis()
    );

    (StatusCode::OK, Json(Value::Array(items)))
}

fn render_item(result: talentrag_core::Result<GenerationResult>, include_context: bool) -> Value {
    match result {
        Ok(result) if include_context => json!({
            "answer": result.answer,
            "context": result.context_texts(),
        }),
        Ok(result) => Value::String(result.answer),
        Err(e) => json!({ "error": e.to_string(), "kind": e.kind() }),
    }
}

fn error_response(e: &Error) -> (StatusCode, Json<Value>) {
    let status = match e {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string(), "kind": e.kind() })))
}
