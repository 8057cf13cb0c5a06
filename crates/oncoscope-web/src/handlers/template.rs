//! CSV template download — the implicit schema contract for uploads.

use axum::http::header;
use axum::response::IntoResponse;

use oncoscope_cohort::TEMPLATE_CSV;

/// GET /api/template — serve the example CSV with the expected columns.
pub async fn template_download() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"patient_data_template.csv\"",
            ),
        ],
        TEMPLATE_CSV,
    )
}
