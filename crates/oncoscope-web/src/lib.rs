//! oncoscope-web — HTTP API for the Oncoscope survival-prediction demo.
//! Provides:
//!   - Single-patient prediction endpoint
//!   - Batch CSV upload endpoint with cohort summary
//!   - CSV template download
//!   - Best-effort delegation to an external prediction backend,
//!     falling back to the local heuristic on any failure

pub mod delegate;
pub mod handlers;
pub mod router;
pub mod state;
