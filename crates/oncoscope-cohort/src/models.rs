//! Domain types shared by the parsing, scoring, and aggregation stages.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Patient record ────────────────────────────────────────────────────────────

/// One parsed CSV row: lower-cased column names mapped to raw string
/// values, plus the normalized patient identifier. Immutable once built.
#[derive(Debug, Clone)]
pub struct PatientRecord {
    patient_id: String,
    fields: HashMap<String, String>,
}

impl PatientRecord {
    pub fn new(patient_id: String, fields: HashMap<String, String>) -> Self {
        debug_assert!(!patient_id.trim().is_empty());
        Self { patient_id, fields }
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// First non-empty value among synonym column names.
    pub fn first_of(&self, columns: &[&str]) -> Option<&str> {
        columns
            .iter()
            .filter_map(|c| self.get(c))
            .find(|v| !v.trim().is_empty())
    }
}

// ── Tumor stage ───────────────────────────────────────────────────────────────

/// AJCC-style tumor stage. Unknown stage strings score as stage IV
/// (worst case), but only recognizable stages enter histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TumorStage {
    I,
    II,
    III,
    IV,
}

impl TumorStage {
    /// Case-insensitive recognizer; accepts roman numerals and "1".."4".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "I" | "1" => Some(TumorStage::I),
            "II" | "2" => Some(TumorStage::II),
            "III" | "3" => Some(TumorStage::III),
            "IV" | "4" => Some(TumorStage::IV),
            _ => None,
        }
    }

    /// 1-based index used by the risk formula (I→1 … IV→4).
    pub fn index(self) -> u32 {
        match self {
            TumorStage::I => 1,
            TumorStage::II => 2,
            TumorStage::III => 3,
            TumorStage::IV => 4,
        }
    }
}

impl fmt::Display for TumorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TumorStage::I => "I",
            TumorStage::II => "II",
            TumorStage::III => "III",
            TumorStage::IV => "IV",
        };
        f.write_str(s)
    }
}

// ── Clinical features ─────────────────────────────────────────────────────────

/// Numeric/categorical inputs to the risk formula, extracted with
/// fallback defaults. Extraction never fails: garbage in a column means
/// the default for that column, not an error.
#[derive(Debug, Clone)]
pub struct ClinicalFeatures {
    pub age: f64,
    /// Raw stage string as supplied (kept for display and histograms).
    pub stage_raw: String,
    pub tumor_size: f64,
    pub lymph_nodes: u32,
    pub tp53_expression: f64,
    pub er_status: String,
    pub treatment: String,
    pub gender: String,
}

impl Default for ClinicalFeatures {
    fn default() -> Self {
        Self {
            age: 65.0,
            stage_raw: "II".to_string(),
            tumor_size: 2.0,
            lymph_nodes: 0,
            tp53_expression: 2.0,
            er_status: String::new(),
            treatment: String::new(),
            gender: "unknown".to_string(),
        }
    }
}

impl ClinicalFeatures {
    /// Stage used for scoring: unparsable strings count as stage IV.
    pub fn stage(&self) -> TumorStage {
        TumorStage::parse(&self.stage_raw).unwrap_or(TumorStage::IV)
    }

    /// Extract features from a parsed CSV row, with synonym column lookup.
    pub fn from_record(record: &PatientRecord) -> Self {
        let defaults = Self::default();
        Self {
            age: record
                .first_of(&["age"])
                .and_then(parse_num)
                .unwrap_or(defaults.age),
            stage_raw: record
                .first_of(&["tumor_stage", "stage"])
                .map(|s| s.trim().to_string())
                .unwrap_or(defaults.stage_raw),
            tumor_size: record
                .first_of(&["tumor_size", "size"])
                .and_then(parse_num)
                .unwrap_or(defaults.tumor_size),
            lymph_nodes: record
                .first_of(&["lymph_nodes", "nodes"])
                .and_then(parse_num)
                .map(|n: f64| n.max(0.0) as u32)
                .unwrap_or(defaults.lymph_nodes),
            tp53_expression: record
                .first_of(&["tp53_expression"])
                .and_then(parse_num)
                .unwrap_or(defaults.tp53_expression),
            er_status: record
                .first_of(&["er_status", "er"])
                .unwrap_or_default()
                .to_string(),
            treatment: record
                .first_of(&["treatment_history", "treatment"])
                .unwrap_or_default()
                .to_string(),
            gender: record
                .first_of(&["gender", "sex"])
                .unwrap_or("unknown")
                .to_string(),
        }
    }

    /// Extract features from a single-prediction JSON body. Fields are
    /// all optional and may arrive as strings or numbers; anything
    /// missing or unparsable falls back to the default.
    pub fn from_json(input: &Value) -> Self {
        let defaults = Self::default();
        Self {
            age: json_num(input, "age").unwrap_or(defaults.age),
            stage_raw: json_str(input, "tumorStage").unwrap_or(defaults.stage_raw),
            tumor_size: json_num(input, "tumorSize").unwrap_or(defaults.tumor_size),
            lymph_nodes: json_num(input, "lymphNodes")
                .map(|n| n.max(0.0) as u32)
                .unwrap_or(defaults.lymph_nodes),
            tp53_expression: json_num(input, "tp53Expression").unwrap_or(defaults.tp53_expression),
            er_status: json_str(input, "erStatus").unwrap_or_default(),
            treatment: json_str(input, "treatmentHistory").unwrap_or_default(),
            gender: json_str(input, "gender").unwrap_or(defaults.gender),
        }
    }
}

fn parse_num(raw: &str) -> Option<f64> {
    let v: f64 = raw.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

fn json_num(input: &Value, key: &str) -> Option<f64> {
    match input.get(key)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_num(s),
        _ => None,
    }
}

fn json_str(input: &Value, key: &str) -> Option<String> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ── Prediction result ─────────────────────────────────────────────────────────

/// Coarse risk bucket derived by thresholding the continuous score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    /// Thresholds are exact: <0.3 low, <0.6 medium, else high.
    pub fn from_score(risk: f64) -> Self {
        if risk < 0.3 {
            RiskCategory::Low
        } else if risk < 0.6 {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        }
    }
}

/// Per-patient prediction as returned on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub patient_id: String,
    pub age: f64,
    pub gender: String,
    pub tumor_stage: String,
    pub survival_probability: f64,
    pub risk_score: f64,
    pub predicted_survival_months: f64,
    pub risk_category: RiskCategory,
}

/// Round to 2 decimal places (probabilities and scores).
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Round to 1 decimal place (month durations).
pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
