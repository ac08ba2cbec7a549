//! Model Collaborator Interfaces

use feature_engine::{FeatureVector, FEATURE_DIMENSION, FEATURE_NAMES};

use crate::tier::RiskTier;
use crate::InferenceError;

/// A trained multi-class classifier over the engineered feature vector.
///
/// Implementations are immutable after loading and shared across requests.
pub trait RiskModel: Send + Sync {
    /// Predicted class id
    fn predict(&self, features: &FeatureVector) -> Result<usize, InferenceError>;

    /// Probability per class id
    fn predict_probability(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError>;

    /// Short backend name for logs and reports
    fn name(&self) -> &str;
}

/// Maps class ids produced by the model back to risk tiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDecoder {
    labels: Vec<RiskTier>,
}

impl LabelDecoder {
    /// Build a decoder from class label names, in class id order
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, InferenceError> {
        if labels.is_empty() {
            return Err(InferenceError::ModelLoadError(
                "label encoder has no classes".to_string(),
            ));
        }
        let labels = labels
            .iter()
            .map(|label| label.as_ref().parse::<RiskTier>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { labels })
    }

    /// Decode a class id
    pub fn decode(&self, class_id: usize) -> Result<RiskTier, InferenceError> {
        self.labels
            .get(class_id)
            .copied()
            .ok_or(InferenceError::UnknownClass(class_id))
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in class id order
    pub fn labels(&self) -> &[RiskTier] {
        &self.labels
    }
}

/// Rounding slack for averaged leaves and f32 model outputs
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// A model's class distribution must have one finite entry in `[0, 1]`
/// per class
pub(crate) fn check_probabilities(probabilities: &[f64], n_classes: usize) -> Result<(), InferenceError> {
    if probabilities.len() != n_classes {
        return Err(InferenceError::InvalidInputShape {
            expected: format!("{} class probabilities", n_classes),
            actual: probabilities.len().to_string(),
        });
    }
    match probabilities
        .iter()
        .position(|p| {
            !p.is_finite()
                || !(-PROBABILITY_TOLERANCE..=1.0 + PROBABILITY_TOLERANCE).contains(p)
        })
    {
        Some(class_id) => Err(InferenceError::InferenceFailed(format!(
            "class {} probability {} outside [0, 1]",
            class_id, probabilities[class_id]
        ))),
        None => Ok(()),
    }
}

/// Per-feature importance table published alongside a trained model.
///
/// Single estimators expose importances directly; composite ensembles only
/// expose their sub-estimators, whose tables are averaged.
pub trait ImportanceSource: Send + Sync {
    /// One importance per feature, in model order
    fn feature_importances(&self) -> Vec<f64>;
}

/// Importances reported directly by the classifier
#[derive(Debug, Clone)]
pub struct NativeImportances(pub Vec<f64>);

impl ImportanceSource for NativeImportances {
    fn feature_importances(&self) -> Vec<f64> {
        self.0.clone()
    }
}

/// Importances of each sub-estimator of a composite classifier
#[derive(Debug, Clone)]
pub struct EstimatorImportances(pub Vec<Vec<f64>>);

impl ImportanceSource for EstimatorImportances {
    fn feature_importances(&self) -> Vec<f64> {
        let mut sums = vec![0.0; FEATURE_DIMENSION];
        if self.0.is_empty() {
            return sums;
        }
        for table in &self.0 {
            for (sum, value) in sums.iter_mut().zip(table.iter()) {
                *sum += value;
            }
        }
        let n = self.0.len() as f64;
        sums.iter_mut().for_each(|sum| *sum /= n);
        sums
    }
}

/// Feature names paired with importance, most important first
pub fn rank_importances(source: &dyn ImportanceSource) -> Vec<(&'static str, f64)> {
    let mut ranked: Vec<_> = FEATURE_NAMES
        .iter()
        .copied()
        .zip(source.feature_importances())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
