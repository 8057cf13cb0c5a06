//! Heuristic risk scoring.
//!
//! A deterministic additive formula over clinical features, with an
//! optional injected jitter source for demo variety. Scoring is total:
//! every input produces a prediction, and the risk score is always
//! clamped to [0.1, 0.9].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{round1, round2, ClinicalFeatures, Prediction, RiskCategory};

const BASE_RISK: f64 = 0.3;
const RISK_FLOOR: f64 = 0.1;
const RISK_CEIL: f64 = 0.9;
const BASE_SURVIVAL_MONTHS: f64 = 36.0;

// ── Jitter source ─────────────────────────────────────────────────────────────

/// Injected pseudo-random source for demo noise. `Disabled` makes every
/// stage of the pipeline fully deterministic, which is what tests use.
#[derive(Debug, Clone)]
pub enum Jitter {
    Disabled,
    Seeded(StdRng),
}

impl Jitter {
    pub fn seeded(seed: u64) -> Self {
        Jitter::Seeded(StdRng::seed_from_u64(seed))
    }

    /// Entropy-seeded jitter for normal demo operation.
    pub fn random() -> Self {
        Jitter::Seeded(StdRng::from_entropy())
    }

    /// Symmetric noise in [-0.1, 0.1], or 0 when disabled.
    pub fn noise(&mut self) -> f64 {
        match self {
            Jitter::Disabled => 0.0,
            Jitter::Seeded(rng) => (rng.gen::<f64>() - 0.5) * 0.2,
        }
    }

    /// Uniform sample in [0, 1), or 0 when disabled.
    pub fn unit(&mut self) -> f64 {
        match self {
            Jitter::Disabled => 0.0,
            Jitter::Seeded(rng) => rng.gen::<f64>(),
        }
    }
}

// ── Risk formula ──────────────────────────────────────────────────────────────

/// Compute the clamped risk score for one patient.
pub fn risk_score(features: &ClinicalFeatures, jitter: &mut Jitter) -> f64 {
    let mut risk = BASE_RISK;

    // Age penalty
    if features.age > 70.0 {
        risk += 0.2;
    } else if features.age > 60.0 {
        risk += 0.1;
    }

    // Stage penalty
    risk += (features.stage().index() - 1) as f64 * 0.15;

    // Size penalty
    if features.tumor_size > 3.0 {
        risk += 0.15;
    } else if features.tumor_size > 2.0 {
        risk += 0.1;
    }

    // Nodal penalty, capped
    risk += (features.lymph_nodes as f64 * 0.1).min(0.3);

    // Molecular factor
    if features.tp53_expression > 3.0 {
        risk += 0.1;
    }

    // Protective factors
    if features.er_status.to_lowercase().contains("positive") {
        risk -= 0.1;
    }
    if features.treatment.to_lowercase().contains("combination") {
        risk -= 0.15;
    }

    risk += jitter.noise();

    risk.clamp(RISK_FLOOR, RISK_CEIL)
}

/// Score one patient and derive the survival outputs. Never fails.
pub fn predict(patient_id: &str, features: &ClinicalFeatures, jitter: &mut Jitter) -> Prediction {
    let risk = risk_score(features, jitter);

    let survival_probability = (1.0 - risk + 0.2).max(0.3);
    let survival_months = BASE_SURVIVAL_MONTHS * (1.0 + (1.0 - risk));

    Prediction {
        patient_id: patient_id.to_string(),
        age: features.age,
        gender: features.gender.clone(),
        tumor_stage: features.stage_raw.clone(),
        survival_probability: round2(survival_probability),
        risk_score: round2(risk),
        predicted_survival_months: round1(survival_months),
        risk_category: RiskCategory::from_score(risk),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TumorStage;

    fn worked_example() -> ClinicalFeatures {
        ClinicalFeatures {
            age: 72.0,
            stage_raw: "III".to_string(),
            tumor_size: 3.1,
            lymph_nodes: 3,
            er_status: "negative".to_string(),
            treatment: "combination".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_worked_example_clamps_high() {
        // 0.3 + 0.2 + 0.3 + 0.15 + 0.3 - 0.15 = 1.1 before clamping
        let risk = risk_score(&worked_example(), &mut Jitter::Disabled);
        assert_eq!(risk, 0.9);

        let p = predict("P1", &worked_example(), &mut Jitter::Disabled);
        assert_eq!(p.risk_category, RiskCategory::High);
        assert_eq!(p.risk_score, 0.9);
        assert_eq!(p.survival_probability, 0.3);
        assert_eq!(p.predicted_survival_months, 39.6);
    }

    #[test]
    fn test_risk_always_in_bounds() {
        let extremes = [
            ClinicalFeatures {
                age: 95.0,
                stage_raw: "IV".to_string(),
                tumor_size: 12.0,
                lymph_nodes: 40,
                tp53_expression: 9.0,
                ..Default::default()
            },
            ClinicalFeatures {
                age: 20.0,
                stage_raw: "I".to_string(),
                tumor_size: 0.5,
                lymph_nodes: 0,
                er_status: "positive".to_string(),
                treatment: "combination".to_string(),
                ..Default::default()
            },
            ClinicalFeatures {
                age: -1e9,
                stage_raw: "garbage".to_string(),
                ..Default::default()
            },
        ];
        let mut jitter = Jitter::seeded(7);
        for f in &extremes {
            for _ in 0..100 {
                let r = risk_score(f, &mut jitter);
                assert!((0.1..=0.9).contains(&r), "risk {r} out of bounds");
            }
        }
    }

    #[test]
    fn test_protective_factors_lower_risk() {
        let mut f = ClinicalFeatures {
            age: 65.0,
            stage_raw: "II".to_string(),
            ..Default::default()
        };
        let base = risk_score(&f, &mut Jitter::Disabled);

        f.er_status = "ER-Positive".to_string();
        let with_er = risk_score(&f, &mut Jitter::Disabled);
        assert!((base - with_er - 0.1).abs() < 1e-9);

        f.treatment = "combination therapy".to_string();
        let with_both = risk_score(&f, &mut Jitter::Disabled);
        assert!((base - with_both - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_nodal_penalty_capped() {
        let few = ClinicalFeatures {
            lymph_nodes: 3,
            ..Default::default()
        };
        let many = ClinicalFeatures {
            lymph_nodes: 30,
            ..Default::default()
        };
        assert_eq!(
            risk_score(&few, &mut Jitter::Disabled),
            risk_score(&many, &mut Jitter::Disabled)
        );
    }

    #[test]
    fn test_seeded_jitter_is_reproducible() {
        let f = worked_example();
        let a = risk_score(&f, &mut Jitter::seeded(42));
        let b = risk_score(&f, &mut Jitter::seeded(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_jitter_noise_bounded() {
        let mut j = Jitter::seeded(1);
        for _ in 0..1000 {
            let n = j.noise();
            assert!((-0.1..=0.1).contains(&n));
        }
    }

    #[test]
    fn test_unknown_stage_scores_like_iv() {
        let known = ClinicalFeatures {
            stage_raw: "IV".to_string(),
            ..Default::default()
        };
        let unknown = ClinicalFeatures {
            stage_raw: "stage-x".to_string(),
            ..Default::default()
        };
        assert_eq!(unknown.stage(), TumorStage::IV);
        assert_eq!(
            risk_score(&known, &mut Jitter::Disabled),
            risk_score(&unknown, &mut Jitter::Disabled)
        );
    }
}
