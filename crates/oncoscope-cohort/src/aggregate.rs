//! Cohort aggregation.
//!
//! Reduces per-patient predictions into the batch summary returned by
//! the upload endpoint: risk-category counts, mean survival and risk,
//! age/stage histograms, and the fixed display stand-ins. The reduction
//! is commutative, so row processing order never changes the result.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::curves::FeatureWeight;
use crate::models::{round1, round2, Prediction, RiskCategory, TumorStage};
use crate::scoring::Jitter;

/// Zero patients survived parsing and scoring.
#[derive(Debug)]
pub struct EmptyCohortError {
    pub errors: Vec<String>,
}

impl fmt::Display for EmptyCohortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No patients could be processed successfully.")?;
        if !self.errors.is_empty() {
            let first: Vec<&str> = self.errors.iter().take(3).map(String::as_str).collect();
            write!(f, " Errors: {}", first.join("; "))?;
        }
        Ok(())
    }
}

impl std::error::Error for EmptyCohortError {}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortSummary {
    pub file_name: String,
    pub total_patients: usize,
    pub processed_at: DateTime<Utc>,
    pub processing_errors: Vec<String>,
    pub summary: SummaryStats,
    pub demographics: Demographics,
    pub model_performance: ModelPerformance,
    pub top_features: Vec<FeatureWeight>,
    pub patients: Vec<Prediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub average_survival_months: f64,
    pub average_risk_score: f64,
    pub high_risk_patients: usize,
    pub medium_risk_patients: usize,
    pub low_risk_patients: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub age_distribution: AgeDistribution,
    pub stage_distribution: StageDistribution,
    pub risk_distribution: RiskDistribution,
}

/// Fixed age buckets matching the demographic chart widgets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgeDistribution {
    #[serde(rename = "18-40")]
    pub young: usize,
    #[serde(rename = "41-60")]
    pub middle: usize,
    #[serde(rename = "61-80")]
    pub senior: usize,
    #[serde(rename = "80+")]
    pub elderly: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageDistribution {
    #[serde(rename = "I")]
    pub i: usize,
    #[serde(rename = "II")]
    pub ii: usize,
    #[serde(rename = "III")]
    pub iii: usize,
    #[serde(rename = "IV")]
    pub iv: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// Cosmetic concordance-index stand-ins for the model comparison panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub cox: CIndex,
    pub rsf: CIndex,
    pub deepsurv: CIndex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CIndex {
    #[serde(rename = "cIndex")]
    pub c_index: f64,
}

// ── Reduction ─────────────────────────────────────────────────────────────────

/// Reduce scored patients into a cohort summary.
///
/// `warnings` carries row-level diagnostics from parsing; they are
/// reported in the response but never fail the batch. Fails only when
/// zero patients were scored.
pub fn summarize(
    file_name: &str,
    predictions: Vec<Prediction>,
    warnings: Vec<String>,
    jitter: &mut Jitter,
) -> Result<CohortSummary, EmptyCohortError> {
    if predictions.is_empty() {
        return Err(EmptyCohortError { errors: warnings });
    }

    let n = predictions.len() as f64;
    let total_months: f64 = predictions.iter().map(|p| p.predicted_survival_months).sum();
    let total_risk: f64 = predictions.iter().map(|p| p.risk_score).sum();

    let mut ages = AgeDistribution::default();
    let mut stages = StageDistribution::default();
    let mut risks = RiskDistribution::default();

    for p in &predictions {
        if p.age <= 40.0 {
            ages.young += 1;
        } else if p.age <= 60.0 {
            ages.middle += 1;
        } else if p.age <= 80.0 {
            ages.senior += 1;
        } else {
            ages.elderly += 1;
        }

        // Only recognizable stages enter the histogram
        match TumorStage::parse(&p.tumor_stage) {
            Some(TumorStage::I) => stages.i += 1,
            Some(TumorStage::II) => stages.ii += 1,
            Some(TumorStage::III) => stages.iii += 1,
            Some(TumorStage::IV) => stages.iv += 1,
            None => {}
        }

        match p.risk_category {
            RiskCategory::Low => risks.low += 1,
            RiskCategory::Medium => risks.medium += 1,
            RiskCategory::High => risks.high += 1,
        }
    }

    let model_performance = ModelPerformance {
        cox: CIndex {
            c_index: 0.68 + jitter.unit() * 0.05,
        },
        rsf: CIndex {
            c_index: 0.72 + jitter.unit() * 0.05,
        },
        deepsurv: CIndex {
            c_index: 0.75 + jitter.unit() * 0.05,
        },
    };

    Ok(CohortSummary {
        file_name: file_name.to_string(),
        total_patients: predictions.len(),
        processed_at: Utc::now(),
        processing_errors: warnings,
        summary: SummaryStats {
            average_survival_months: round1(total_months / n),
            average_risk_score: round2(total_risk / n),
            high_risk_patients: risks.high,
            medium_risk_patients: risks.medium,
            low_risk_patients: risks.low,
        },
        demographics: Demographics {
            age_distribution: ages,
            stage_distribution: stages,
            risk_distribution: risks,
        },
        model_performance,
        top_features: FeatureWeight::cohort_ranking(),
        patients: predictions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(id: &str, age: f64, stage: &str, risk: f64, months: f64) -> Prediction {
        Prediction {
            patient_id: id.to_string(),
            age,
            gender: "unknown".to_string(),
            tumor_stage: stage.to_string(),
            survival_probability: round2((1.0 - risk + 0.2).max(0.3)),
            risk_score: risk,
            predicted_survival_months: months,
            risk_category: RiskCategory::from_score(risk),
        }
    }

    fn sample_cohort() -> Vec<Prediction> {
        vec![
            pred("P1", 35.0, "I", 0.15, 66.6),
            pred("P2", 55.0, "II", 0.45, 55.8),
            pred("P3", 72.0, "III", 0.75, 45.0),
            pred("P4", 85.0, "IV", 0.9, 39.6),
            pred("P5", 61.0, "unknown", 0.3, 61.2),
        ]
    }

    #[test]
    fn test_empty_cohort_is_an_error() {
        let err = summarize("x.csv", vec![], vec!["Row 2: bad".into()], &mut Jitter::Disabled)
            .unwrap_err();
        assert!(err.to_string().contains("Row 2: bad"));
    }

    #[test]
    fn test_counts_sum_to_total() {
        let s = summarize("x.csv", sample_cohort(), vec![], &mut Jitter::Disabled).unwrap();
        assert_eq!(s.total_patients, 5);
        let r = &s.demographics.risk_distribution;
        assert_eq!(r.low + r.medium + r.high, 5);
        let a = &s.demographics.age_distribution;
        assert_eq!(a.young + a.middle + a.senior + a.elderly, 5);
        // "unknown" stage stays out of the stage histogram
        let st = &s.demographics.stage_distribution;
        assert_eq!(st.i + st.ii + st.iii + st.iv, 4);
    }

    #[test]
    fn test_means_and_buckets() {
        let s = summarize("x.csv", sample_cohort(), vec![], &mut Jitter::Disabled).unwrap();
        assert_eq!(s.summary.average_risk_score, 0.51);
        assert_eq!(s.summary.average_survival_months, 53.6);
        assert_eq!(s.demographics.age_distribution.young, 1);
        assert_eq!(s.demographics.age_distribution.middle, 1);
        assert_eq!(s.demographics.age_distribution.senior, 2);
        assert_eq!(s.demographics.age_distribution.elderly, 1);
        assert_eq!(s.summary.high_risk_patients, 2);
        assert_eq!(s.summary.medium_risk_patients, 2);
        assert_eq!(s.summary.low_risk_patients, 1);
    }

    #[test]
    fn test_order_independent() {
        let forward = summarize("x.csv", sample_cohort(), vec![], &mut Jitter::Disabled).unwrap();
        let mut shuffled = sample_cohort();
        shuffled.reverse();
        shuffled.swap(0, 2);
        let backward = summarize("x.csv", shuffled, vec![], &mut Jitter::Disabled).unwrap();

        assert_eq!(
            forward.summary.average_risk_score,
            backward.summary.average_risk_score
        );
        assert!(
            (forward.summary.average_survival_months - backward.summary.average_survival_months)
                .abs()
                < 1e-9
        );
        assert_eq!(
            forward.demographics.risk_distribution.high,
            backward.demographics.risk_distribution.high
        );
    }

    #[test]
    fn test_cindex_standins_deterministic_without_jitter() {
        let s = summarize("x.csv", sample_cohort(), vec![], &mut Jitter::Disabled).unwrap();
        assert_eq!(s.model_performance.cox.c_index, 0.68);
        assert_eq!(s.model_performance.rsf.c_index, 0.72);
        assert_eq!(s.model_performance.deepsurv.c_index, 0.75);
    }

    #[test]
    fn test_wire_field_names() {
        let s = summarize("x.csv", sample_cohort(), vec![], &mut Jitter::Disabled).unwrap();
        let v = serde_json::to_value(&s).unwrap();
        assert!(v.get("totalPatients").is_some());
        assert!(v["demographics"]["ageDistribution"].get("18-40").is_some());
        assert!(v["demographics"]["stageDistribution"].get("IV").is_some());
        assert!(v["modelPerformance"]["cox"].get("cIndex").is_some());
        assert!(v["patients"][0].get("riskCategory").is_some());
    }
}
