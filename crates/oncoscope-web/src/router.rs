//! Axum router — maps all URL paths to handlers.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    health, predict::predict_submit, template::template_download, upload::upload_submit,
    upload::MAX_UPLOAD_BYTES,
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        // API endpoints
        .route("/api/predict", post(predict_submit))
        .route("/api/upload", post(upload_submit))
        .route("/api/template", get(template_download))
        .route("/api/health", get(health))

        // Middleware
        // Body limit leaves headroom over the 10 MiB file cap for
        // multipart framing; the handler enforces the exact cap.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
