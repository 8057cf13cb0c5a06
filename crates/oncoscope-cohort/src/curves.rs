//! Synthetic display artifacts for the single-prediction response.
//!
//! Everything here is cosmetic: a step-function survival curve rendered
//! from the risk score (not estimated from event data), a rank-ordered
//! feature-importance list derived from the inputs, and per-model
//! prediction stand-ins. None of it feeds back into scoring.

use serde::{Deserialize, Serialize};

use crate::models::{round1, round2, ClinicalFeatures};
use crate::scoring::Jitter;

/// Months at which the synthetic curve steps down.
const EVENT_MONTHS: [u32; 14] = [3, 6, 9, 12, 15, 18, 21, 24, 30, 36, 42, 48, 54, 60];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KmPoint {
    pub month: u32,
    pub survival: f64,
    pub upper_ci: f64,
    pub lower_ci: f64,
}

/// Kaplan-Meier-shaped step curve over 0..=60 months in 3-month ticks.
/// Hazard scales with the risk score; confidence band is a flat ±10%.
pub fn kaplan_meier_curve(risk: f64) -> Vec<KmPoint> {
    let hazard = 0.02 + risk * 0.05;
    let mut survival: f64 = 1.0;
    let mut points = Vec::with_capacity(21);

    for month in (0u32..=60).step_by(3) {
        if month > 0 && EVENT_MONTHS.contains(&month) {
            let event_prob = hazard * (1.0 + 0.3 * (month as f64 / 12.0).sin());
            survival *= 1.0 - event_prob.min(0.15);
        }

        let ci_width = 0.1 * survival;
        points.push(KmPoint {
            month,
            survival: survival.max(0.0),
            upper_ci: (survival + ci_width).min(1.0),
            lower_ci: (survival - ci_width).max(0.0),
        });
    }

    points
}

// ── Feature importance ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub importance: f64,
}

impl FeatureWeight {
    fn new(feature: &str, importance: f64) -> Self {
        Self {
            feature: feature.to_string(),
            importance,
        }
    }

    /// Fixed cohort-level ranking shown on batch results.
    pub fn cohort_ranking() -> Vec<FeatureWeight> {
        vec![
            FeatureWeight::new("Tumor Stage", 0.28),
            FeatureWeight::new("Age at Diagnosis", 0.24),
            FeatureWeight::new("Lymph Node Status", 0.19),
            FeatureWeight::new("Treatment Type", 0.16),
            FeatureWeight::new("ER Status", 0.13),
        ]
    }
}

/// Input-sensitive importance ranking for a single prediction,
/// sorted descending.
pub fn feature_importance(features: &ClinicalFeatures) -> Vec<FeatureWeight> {
    let mut weights = vec![
        FeatureWeight::new(
            "Tumor Stage",
            0.25 + features.stage().index() as f64 / 10.0,
        ),
        FeatureWeight::new("Age", 0.2 + if features.age > 65.0 { 0.05 } else { 0.0 }),
        FeatureWeight::new(
            "Lymph Node Status",
            0.18 + if features.lymph_nodes > 0 { 0.07 } else { 0.0 },
        ),
        FeatureWeight::new(
            "Tumor Size",
            0.15 + if features.tumor_size > 2.5 { 0.05 } else { 0.0 },
        ),
        FeatureWeight::new(
            "TP53 Expression",
            0.12 + if features.tp53_expression > 2.5 { 0.03 } else { 0.0 },
        ),
        FeatureWeight::new(
            "ER Status",
            0.1 + if features.er_status.to_lowercase().contains("positive") {
                0.02
            } else {
                0.0
            },
        ),
    ];
    weights.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    weights
}

// ── Model comparison stand-ins ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEstimate {
    #[serde(rename = "cIndex")]
    pub c_index: f64,
    pub prediction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelComparison {
    pub cox: ModelEstimate,
    pub rsf: ModelEstimate,
    pub deepsurv: ModelEstimate,
}

/// Per-model survival estimates scaled from the heuristic prediction.
pub fn model_comparison(survival_months: f64, jitter: &mut Jitter) -> ModelComparison {
    ModelComparison {
        cox: ModelEstimate {
            c_index: round2(0.68 + jitter.unit() * 0.05),
            prediction: round1(survival_months * (0.9 + jitter.unit() * 0.2)),
        },
        rsf: ModelEstimate {
            c_index: round2(0.72 + jitter.unit() * 0.05),
            prediction: round1(survival_months * (0.95 + jitter.unit() * 0.1)),
        },
        deepsurv: ModelEstimate {
            c_index: round2(0.75 + jitter.unit() * 0.05),
            prediction: round1(survival_months * (1.0 + jitter.unit() * 0.15)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_is_monotone_step_function() {
        let curve = kaplan_meier_curve(0.9);
        assert_eq!(curve.len(), 21);
        assert_eq!(curve[0].month, 0);
        assert_eq!(curve[0].survival, 1.0);
        assert_eq!(curve.last().unwrap().month, 60);
        for w in curve.windows(2) {
            assert!(w[1].survival <= w[0].survival);
        }
    }

    #[test]
    fn test_curve_bounds_and_ci_ordering() {
        for risk in [0.1, 0.5, 0.9] {
            for p in kaplan_meier_curve(risk) {
                assert!((0.0..=1.0).contains(&p.survival));
                assert!(p.lower_ci <= p.survival && p.survival <= p.upper_ci);
                assert!(p.upper_ci <= 1.0 && p.lower_ci >= 0.0);
            }
        }
    }

    #[test]
    fn test_higher_risk_means_steeper_curve() {
        let low = kaplan_meier_curve(0.1);
        let high = kaplan_meier_curve(0.9);
        assert!(high.last().unwrap().survival < low.last().unwrap().survival);
    }

    #[test]
    fn test_importance_sorted_descending() {
        let f = ClinicalFeatures {
            age: 72.0,
            stage_raw: "III".to_string(),
            lymph_nodes: 3,
            ..Default::default()
        };
        let ranked = feature_importance(&f);
        assert_eq!(ranked.len(), 6);
        for w in ranked.windows(2) {
            assert!(w[0].importance >= w[1].importance);
        }
        // Stage III dominates: 0.25 + 3/10
        assert_eq!(ranked[0].feature, "Tumor Stage");
    }

    #[test]
    fn test_comparison_deterministic_without_jitter() {
        let cmp = model_comparison(50.0, &mut Jitter::Disabled);
        assert_eq!(cmp.cox.prediction, 45.0);
        assert_eq!(cmp.rsf.prediction, 47.5);
        assert_eq!(cmp.deepsurv.prediction, 50.0);
        assert_eq!(cmp.cox.c_index, 0.68);
    }
}
