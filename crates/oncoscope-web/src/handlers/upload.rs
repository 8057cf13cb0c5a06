//! Batch CSV upload endpoint.

use axum::extract::{Multipart, State};
use axum::response::Json;
use serde_json::Value;
use tracing::{debug, warn};

use oncoscope_common::ApiError;

use crate::state::SharedState;

/// Upload size cap: 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// POST /api/upload — accept a multipart CSV (field name `file`),
/// score every row, and return the cohort summary. Tries the external
/// backend first, then falls back to in-process batch scoring.
pub async fn upload_submit(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("uploaded_file.csv").to_string();
        let content_type = field.content_type().map(str::to_string);

        if !file_name.to_lowercase().ends_with(".csv")
            && content_type.as_deref() != Some("text/csv")
        {
            return Err(ApiError::Validation(
                "Invalid file type. Please upload a CSV file.".to_string(),
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("Could not read file: {e}")))?;
        file = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = file.ok_or_else(|| ApiError::Validation("No file provided".to_string()))?;

    if bytes.len() > MAX_UPLOAD_BYTES {
        warn!(size = bytes.len(), "rejecting oversized upload");
        return Err(ApiError::Validation(
            "File too large. Maximum size is 10MB.".to_string(),
        ));
    }

    let csv_text = String::from_utf8_lossy(&bytes);
    if csv_text.trim().is_empty() {
        return Err(ApiError::Validation(
            "File is empty or could not be read".to_string(),
        ));
    }

    debug!(file = %file_name, bytes = bytes.len(), "processing upload");
    let result = state.scorer.score_batch(&file_name, &csv_text).await?;
    Ok(Json(result))
}
