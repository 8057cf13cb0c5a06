//! External backend delegation with local fallback.
//!
//! Both API endpoints first try the external prediction backend under a
//! bounded deadline and fall back to the local heuristic on any failure
//! (timeout, connection error, non-2xx). The remote call is best-effort
//! and never required for correctness, so remote failures are logged and
//! swallowed — only the caller's own bad input can fail a request.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, instrument};

use oncoscope_cohort::curves::{feature_importance, kaplan_meier_curve, model_comparison};
use oncoscope_cohort::{parse_csv, predict, summarize, ClinicalFeatures};
use oncoscope_common::{ApiError, OncoscopeError};

use crate::state::AppConfig;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure talking to the external backend. Always recoverable: the
/// caller substitutes the local scorer.
#[derive(Debug, Error)]
pub enum DelegateError {
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend responded with status {0}")]
    Status(u16),
}

/// Scoring failure, split by whether fallback applies.
#[derive(Debug)]
pub enum ScoreError {
    /// The backend could not serve the request; try the local scorer.
    Unavailable(DelegateError),
    /// The request itself is invalid; no scorer can save it.
    Rejected(ApiError),
}

impl ScoreError {
    fn into_api(self) -> ApiError {
        match self {
            ScoreError::Unavailable(e) => ApiError::Internal(e.to_string()),
            ScoreError::Rejected(e) => e,
        }
    }
}

// ── Scorer seam ───────────────────────────────────────────────────────────────

/// A strategy capable of serving both prediction endpoints. Two
/// implementations: the remote backend proxy and the local heuristic.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn predict_one(&self, input: &Value) -> Result<Value, ScoreError>;
    async fn score_batch(&self, file_name: &str, csv_text: &str) -> Result<Value, ScoreError>;
}

// ── Remote ────────────────────────────────────────────────────────────────────

/// HTTP client for the external prediction backend.
#[derive(Debug, Clone)]
pub struct DelegateClient {
    http: reqwest::Client,
    base_url: String,
}

impl DelegateClient {
    pub fn new(base_url: &str) -> Result<Self, OncoscopeError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[instrument(skip(self, payload))]
    pub async fn predict(&self, payload: &Value, deadline: Duration) -> Result<Value, DelegateError> {
        let resp = self
            .http
            .post(format!("{}/api/predict", self.base_url))
            .timeout(deadline)
            .json(payload)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(DelegateError::Status(resp.status().as_u16()));
        }
        Ok(resp.json().await?)
    }

    #[instrument(skip(self, data))]
    pub async fn upload(
        &self,
        file_name: &str,
        data: Vec<u8>,
        deadline: Duration,
    ) -> Result<Value, DelegateError> {
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let resp = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .timeout(deadline)
            .multipart(form)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(DelegateError::Status(resp.status().as_u16()));
        }
        Ok(resp.json().await?)
    }
}

/// Remote strategy: proxy the request as-is under the configured deadline.
pub struct RemoteScorer {
    client: DelegateClient,
    predict_timeout: Duration,
    upload_timeout: Duration,
}

#[async_trait]
impl Scorer for RemoteScorer {
    async fn predict_one(&self, input: &Value) -> Result<Value, ScoreError> {
        self.client
            .predict(input, self.predict_timeout)
            .await
            .map_err(ScoreError::Unavailable)
    }

    async fn score_batch(&self, file_name: &str, csv_text: &str) -> Result<Value, ScoreError> {
        self.client
            .upload(file_name, csv_text.as_bytes().to_vec(), self.upload_timeout)
            .await
            .map_err(ScoreError::Unavailable)
    }
}

// ── Local ─────────────────────────────────────────────────────────────────────

/// Local strategy: the pure heuristic pipeline from `oncoscope-cohort`.
pub struct LocalScorer {
    jitter_seed: Option<u64>,
    jitter_enabled: bool,
    simulated_latency: Option<Duration>,
}

impl LocalScorer {
    fn jitter(&self) -> oncoscope_cohort::Jitter {
        if !self.jitter_enabled {
            oncoscope_cohort::Jitter::Disabled
        } else {
            match self.jitter_seed {
                Some(seed) => oncoscope_cohort::Jitter::seeded(seed),
                None => oncoscope_cohort::Jitter::random(),
            }
        }
    }

    async fn simulate_latency(&self) {
        if let Some(delay) = self.simulated_latency {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Scorer for LocalScorer {
    async fn predict_one(&self, input: &Value) -> Result<Value, ScoreError> {
        let mut jitter = self.jitter();

        let features = ClinicalFeatures::from_json(input);
        let patient_id = input
            .get("patientId")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("PATIENT-{}", Utc::now().timestamp_millis()));

        let prediction = predict(&patient_id, &features, &mut jitter);
        let months = prediction.predicted_survival_months;
        let comparison = model_comparison(months, &mut jitter);
        let importance = feature_importance(&features);
        let curve = kaplan_meier_curve(prediction.risk_score);
        let processing_time = ((1.0 + jitter.unit() * 2.0) * 100.0).round() / 100.0;

        self.simulate_latency().await;

        let response = json!({
            "patientId": prediction.patient_id,
            "survivalProbability": prediction.survival_probability,
            "riskScore": prediction.risk_score,
            "predictedSurvivalMonths": months,
            "riskCategory": prediction.risk_category,
            "modelComparison": comparison,
            "featureImportance": importance,
            "inputData": input,
            "modelUsed": "Local heuristic model (demo mode)",
            "processingTime": processing_time,
            "kaplanMeier": {
                "medianSurvival": (months * 0.9 * 10.0).round() / 10.0,
                "survivalCurve": curve,
            },
        });
        Ok(response)
    }

    async fn score_batch(&self, file_name: &str, csv_text: &str) -> Result<Value, ScoreError> {
        let mut jitter = self.jitter();

        let outcome = parse_csv(csv_text)
            .map_err(|e| ScoreError::Rejected(ApiError::Format(e.to_string())))?;
        debug!(
            patients = outcome.patients.len(),
            warnings = outcome.warnings.len(),
            "parsed upload"
        );

        let predictions = outcome
            .patients
            .iter()
            .map(|p| predict(p.patient_id(), &ClinicalFeatures::from_record(p), &mut jitter))
            .collect();

        let summary = summarize(file_name, predictions, outcome.warnings, &mut jitter)
            .map_err(|e| ScoreError::Rejected(ApiError::EmptyCohort(e.to_string())))?;

        self.simulate_latency().await;

        serde_json::to_value(&summary).map_err(|e| ScoreError::Rejected(e.into()))
    }
}

// ── Fallback wrapper ──────────────────────────────────────────────────────────

/// Try the remote backend first; on any unavailability substitute the
/// local heuristic. Remote failure never propagates to the caller.
#[derive(Clone)]
pub struct FallbackScorer {
    remote: Option<std::sync::Arc<RemoteScorer>>,
    local: std::sync::Arc<LocalScorer>,
}

impl FallbackScorer {
    pub fn from_config(config: &AppConfig) -> Result<Self, OncoscopeError> {
        let remote = match &config.backend_url {
            Some(url) => Some(std::sync::Arc::new(RemoteScorer {
                client: DelegateClient::new(url)?,
                predict_timeout: config.predict_timeout,
                upload_timeout: config.upload_timeout,
            })),
            None => None,
        };
        Ok(Self {
            remote,
            local: std::sync::Arc::new(LocalScorer {
                jitter_seed: config.jitter_seed,
                jitter_enabled: config.jitter_enabled,
                simulated_latency: config.simulated_latency,
            }),
        })
    }

    pub async fn predict_one(&self, input: &Value) -> Result<Value, ApiError> {
        if let Some(remote) = &self.remote {
            match remote.predict_one(input).await {
                Ok(v) => return Ok(v),
                Err(ScoreError::Rejected(e)) => return Err(e),
                Err(ScoreError::Unavailable(e)) => {
                    info!(error = %e, "backend unavailable, using local prediction model");
                }
            }
        }
        self.local
            .predict_one(input)
            .await
            .map_err(ScoreError::into_api)
    }

    pub async fn score_batch(&self, file_name: &str, csv_text: &str) -> Result<Value, ApiError> {
        if let Some(remote) = &self.remote {
            match remote.score_batch(file_name, csv_text).await {
                Ok(v) => return Ok(v),
                Err(ScoreError::Rejected(e)) => return Err(e),
                Err(ScoreError::Unavailable(e)) => {
                    info!(error = %e, "backend unavailable, using local batch processing");
                }
            }
        }
        self.local
            .score_batch(file_name, csv_text)
            .await
            .map_err(ScoreError::into_api)
    }
}
