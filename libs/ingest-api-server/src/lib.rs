use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use courier_api::{Record, RecordStore, now_ms};
use pipeline::Publisher;

#[derive(Clone)]
struct AppState {
    publisher: Arc<Publisher>,
    store: Arc<dyn RecordStore>,
}

/// Ingress HTTP API server.
///
/// The publisher must be live before this binds: a request is never
/// acknowledged without a working publish path behind it.
pub async fn run(
    port: u16,
    publisher: Arc<Publisher>,
    store: Arc<dyn RecordStore>,
    shutdown: CancellationToken,
) -> Result<(), String> {
    let state = AppState { publisher, store };

    let app = Router::new()
        .route("/ping", get(handle_ping))
        .route("/messages", post(handle_submit))
        .route("/records/{id}", get(handle_get_record))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|e| format!("bind api :{port}: {e}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| format!("axum serve: {e}"))?;

    Ok(())
}

// ═══════════════════════════════════════════════════════════════
//  REST: GET /ping
// ═══════════════════════════════════════════════════════════════

/// Liveness only; says nothing about pipeline health.
async fn handle_ping() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "message": "pong" }))
}

// ═══════════════════════════════════════════════════════════════
//  REST: POST /messages
// ═══════════════════════════════════════════════════════════════

#[derive(Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    content: String,
    #[serde(default)]
    owner: String,
}

#[derive(Serialize)]
struct SubmitResponse {
    id: String,
    content: String,
    owner: String,
    status: &'static str,
    timestamp: i64,
}

async fn handle_submit(
    State(state): State<AppState>,
    axum::Json(req): axum::Json<SubmitRequest>,
) -> Response {
    let content = req.content.trim();
    let owner = req.owner.trim();
    if content.is_empty() || owner.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(serde_json::json!({
                "error": "content and owner must be non-empty"
            })),
        )
            .into_response();
    }

    // Id and created_at are assigned here, at ingress, and never
    // touched by the log. The owner is the partition key: one owner's
    // records keep their order.
    let record = Record {
        id: Uuid::new_v4().to_string(),
        content: content.to_string(),
        owner: owner.to_string(),
        created_at: now_ms(),
        processed_at: None,
    };

    match state.publisher.send(&record.owner, &record).await {
        Ok(placement) => {
            tracing::info!(
                id = %record.id,
                partition = placement.partition,
                offset = placement.offset,
                "record accepted"
            );
            (
                StatusCode::OK,
                axum::Json(SubmitResponse {
                    id: record.id,
                    content: record.content,
                    owner: record.owner,
                    status: "accepted-for-processing",
                    timestamp: now_ms(),
                }),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!(%error, "publish failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(serde_json::json!({
                    "error": format!("failed to append record: {error}")
                })),
            )
                .into_response()
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  REST: GET /records/{id}
// ═══════════════════════════════════════════════════════════════

/// Reads the store only, so a record is visible here exactly once
/// the consumer has persisted it.
async fn handle_get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.fetch(&id).await {
        Ok(Some(record)) => axum::Json(record).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, format!("record '{id}' not found")).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("error: {e}")).into_response(),
    }
}
