//! oncoscope-cohort — Clinical data ingestion and heuristic survival scoring.
//!
//! Pure, request-scoped core of the Oncoscope demo service:
//!   1. Parse an uploaded CSV into patient records (`csv`)
//!   2. Extract clinical features and score each patient (`scoring`)
//!   3. Reduce scored patients into a cohort summary (`aggregate`)
//!   4. Generate synthetic display artifacts — survival curves,
//!      feature importance, model-comparison stand-ins (`curves`)
//!
//! Nothing here performs I/O. The scoring model is a deterministic
//! heuristic with optional seeded jitter for demo variety; it is NOT a
//! trained survival model and must never be presented as one.

pub mod aggregate;
pub mod csv;
pub mod curves;
pub mod models;
pub mod scoring;

pub use aggregate::{summarize, CohortSummary, EmptyCohortError};
pub use csv::{parse_csv, FormatError, ParseOutcome, TEMPLATE_CSV};
pub use models::{ClinicalFeatures, PatientRecord, Prediction, RiskCategory, TumorStage};
pub use scoring::{predict, risk_score, Jitter};
