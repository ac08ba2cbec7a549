//! Hybrid Risk Classifier

use feature_engine::{FeatureVector, Reading};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::artifact::ModelArtifact;
use crate::model::check_probabilities;
use crate::rules::OverrideRule;
use crate::tier::RiskTier;
use crate::InferenceError;

/// Which path produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", content = "rule", rename_all = "snake_case")]
pub enum Decision {
    /// A safety override fired; the model was not consulted
    Override(OverrideRule),
    /// The trained ensemble decided
    Ensemble,
}

/// Result of classifying one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub tier: RiskTier,
    /// Rule confidence, or the model's max class probability
    pub confidence: f64,
    pub decision: Decision,
    /// Engineered features for the reading
    pub features: FeatureVector,
}

impl Classification {
    /// Method label recorded with each prediction
    pub fn method(&self) -> &'static str {
        match self.decision {
            Decision::Override(_) => "rule_override",
            Decision::Ensemble => "hybrid_ensemble",
        }
    }

    /// Override reason, when a rule fired
    pub fn reason(&self) -> Option<&'static str> {
        match self.decision {
            Decision::Override(rule) => Some(rule.reason()),
            Decision::Ensemble => None,
        }
    }
}

/// Rule overrides first, ensemble model second
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    artifact: Option<Arc<ModelArtifact>>,
}

impl RiskClassifier {
    /// Create a classifier backed by a loaded model artifact
    pub fn new(artifact: Arc<ModelArtifact>) -> Self {
        info!("Creating risk classifier with model {}", artifact.version());
        Self {
            artifact: Some(artifact),
        }
    }

    /// Classifier with no model deployed. Overrides still fire; anything
    /// that needs the ensemble fails with [`InferenceError::ModelUnavailable`].
    pub fn without_model() -> Self {
        info!("Creating risk classifier without a model artifact");
        Self { artifact: None }
    }

    /// Classify a validated reading
    pub fn classify(&self, reading: &Reading) -> Result<Classification, InferenceError> {
        let features = reading.features();

        if let Some(rule) = OverrideRule::first_match(reading) {
            debug!("Override fired: {:?}", rule);
            return Ok(Classification {
                tier: rule.tier(),
                confidence: rule.confidence(),
                decision: Decision::Override(rule),
                features,
            });
        }

        let artifact = self.artifact.as_ref().ok_or_else(|| {
            InferenceError::ModelUnavailable("no model artifact deployed".to_string())
        })?;
        let model = artifact.model();
        let decoder = artifact.decoder();

        let class_id = model.predict(&features)?;
        let probabilities = model.predict_probability(&features)?;
        check_probabilities(&probabilities, decoder.len())?;

        let tier = decoder.decode(class_id)?;
        let confidence = probabilities.iter().copied().fold(0.0, f64::max).min(1.0);

        debug!(
            "Ensemble decided {} (class {}, conf={:.3}) via {}",
            tier,
            class_id,
            confidence,
            model.name()
        );

        Ok(Classification {
            tier,
            confidence,
            decision: Decision::Ensemble,
            features,
        })
    }

    /// Check if a model is deployed
    pub fn is_loaded(&self) -> bool {
        self.artifact.is_some()
    }

    /// The deployed artifact, if any
    pub fn artifact(&self) -> Option<&Arc<ModelArtifact>> {
        self.artifact.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LabelDecoder, RiskModel};
    use proptest::prelude::*;

    /// Always answers with the same distribution over [high, low, medium]
    struct FixedModel {
        probabilities: Vec<f64>,
    }

    impl RiskModel for FixedModel {
        fn predict(&self, _features: &FeatureVector) -> Result<usize, InferenceError> {
            Ok(crate::forest::argmax(&self.probabilities))
        }

        fn predict_probability(&self, _features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
            Ok(self.probabilities.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn classifier(probabilities: Vec<f64>) -> RiskClassifier {
        let decoder = LabelDecoder::from_labels(&["high", "low", "medium"]).unwrap();
        let artifact = ModelArtifact::new(
            "test",
            Arc::new(FixedModel { probabilities }),
            decoder,
            None,
        );
        RiskClassifier::new(Arc::new(artifact))
    }

    #[test]
    fn test_ensemble_path() {
        let classifier = classifier(vec![0.1, 0.7, 0.2]);
        let result = classifier.classify(&Reading::new(50.0, 7.0, 0.05, 0)).unwrap();

        assert_eq!(result.tier, RiskTier::Low);
        assert!((result.confidence - 0.7).abs() < 1e-12);
        assert_eq!(result.decision, Decision::Ensemble);
        assert_eq!(result.method(), "hybrid_ensemble");
        assert_eq!(result.reason(), None);
    }

    #[test]
    fn test_override_short_circuits_model() {
        // Model would say low with certainty
        let classifier = classifier(vec![0.0, 1.0, 0.0]);
        let result = classifier.classify(&Reading::new(460.0, 7.0, 0.5, 0)).unwrap();

        assert_eq!(result.tier, RiskTier::High);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(
            result.decision,
            Decision::Override(OverrideRule::RainContaminationInteraction)
        );
        assert_eq!(result.method(), "rule_override");
        assert_eq!(result.reason(), Some("Heavy Rain + Contamination Interaction"));
    }

    #[test]
    fn test_missing_model_is_not_guessed() {
        let classifier = RiskClassifier::without_model();
        let err = classifier.classify(&Reading::new(50.0, 7.0, 0.05, 0)).unwrap_err();
        assert!(matches!(err, InferenceError::ModelUnavailable(_)));
        assert!(!classifier.is_loaded());
    }

    #[test]
    fn test_probability_width_checked() {
        let classifier = classifier(vec![0.5, 0.5]);
        let err = classifier.classify(&Reading::new(50.0, 7.0, 0.05, 0)).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInputShape { .. }));
    }

    #[test]
    fn test_out_of_range_probabilities_rejected() {
        for probabilities in [
            vec![-1.0, 2.0, 0.0],
            vec![0.1, f64::NAN, 0.2],
            vec![0.0, f64::INFINITY, 0.0],
        ] {
            let err = classifier(probabilities)
                .classify(&Reading::new(50.0, 7.0, 0.05, 0))
                .unwrap_err();
            assert!(matches!(err, InferenceError::InferenceFailed(_)));
        }
    }

    proptest! {
        #[test]
        fn prop_critical_contamination_always_high(
            rainfall in 0.0f64..1000.0,
            ph in 0.0f64..14.0,
            contamination in 0.8501f64..=1.0,
            cases in 0u32..500,
        ) {
            let result = RiskClassifier::without_model()
                .classify(&Reading::new(rainfall, ph, contamination, cases))
                .unwrap();
            prop_assert_eq!(result.tier, RiskTier::High);
            prop_assert_eq!(result.confidence, 1.0);
        }

        #[test]
        fn prop_outbreak_cases_always_high(cases in 81u32..10_000, ph in 0.0f64..14.0) {
            let result = classifier(vec![0.0, 1.0, 0.0])
                .classify(&Reading::new(0.0, ph, 0.0, cases))
                .unwrap();
            prop_assert_eq!(result.tier, RiskTier::High);
            prop_assert_eq!(result.confidence, 0.98);
        }
    }
}
