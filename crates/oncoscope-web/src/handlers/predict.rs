//! Single-patient prediction endpoint.

use axum::extract::State;
use axum::response::Json;
use serde_json::Value;
use tracing::debug;

use oncoscope_common::ApiError;

use crate::state::SharedState;

/// POST /api/predict — score one patient from a JSON object of clinical
/// fields. All fields are optional; missing or unparsable values take
/// clinical defaults. Tries the external backend first, then the local
/// heuristic.
pub async fn predict_submit(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if !body.is_object() {
        return Err(ApiError::Validation("Invalid input data".to_string()));
    }
    debug!(fields = body.as_object().map(|o| o.len()), "prediction request");

    let result = state.scorer.predict_one(&body).await?;
    Ok(Json(result))
}
