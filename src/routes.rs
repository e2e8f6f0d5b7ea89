// src/routes.rs

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use serde_json::json;
use tower_http::trace::TraceLayer;

const STATUS_DOC: &str = "ALT3R matchmaking service\nstatus: running\n";

/// Liveness probe used by hosting platforms.
///
/// * GET `/` returns 200 and a static status document.
/// * POST `/` returns `{"status":"ok"}`.
pub fn probe_router() -> Router {
    Router::new()
        .route("/", get(status_doc).post(status_ok))
        .layer(TraceLayer::new_for_http())
}

async fn status_doc() -> impl IntoResponse {
    (StatusCode::OK, STATUS_DOC)
}

async fn status_ok() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
