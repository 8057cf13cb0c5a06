//! HTTP handlers for the prediction API.

pub mod predict;
pub mod template;
pub mod upload;

use axum::response::Json;
use serde_json::{json, Value};

/// GET /api/health — liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
