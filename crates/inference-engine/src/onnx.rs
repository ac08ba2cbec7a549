//! ONNX Classifier Backend
//!
//! Runs an exported classifier with tract. The model takes a `[1, 8]` f32
//! input and must expose a `[1, n_classes]` probability tensor (exported
//! without a ZipMap post-processor).

use feature_engine::{FeatureVector, FEATURE_DIMENSION};
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

use crate::forest::argmax;
use crate::model::{check_probabilities, RiskModel};
use crate::InferenceError;

/// tract-backed classifier
pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    n_classes: usize,
    probability_output: usize,
}

impl OnnxModel {
    /// Load and optimise an ONNX model
    pub fn load(path: &Path, n_classes: usize, probability_output: usize) -> Result<Self, InferenceError> {
        if !path.exists() {
            return Err(InferenceError::ModelUnavailable(format!(
                "{} not found",
                path.display()
            )));
        }

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, FEATURE_DIMENSION]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        info!(
            "Loaded ONNX model from {} ({} classes, probabilities at output {})",
            path.display(),
            n_classes,
            probability_output
        );

        Ok(Self {
            plan,
            n_classes,
            probability_output,
        })
    }

    fn run(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        let input: Tensor =
            tract_ndarray::Array2::from_shape_fn((1, FEATURE_DIMENSION), |(_, j)| {
                features.values[j] as f32
            })
            .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let output = outputs.get(self.probability_output).ok_or_else(|| {
            InferenceError::InvalidInputShape {
                expected: format!("at least {} outputs", self.probability_output + 1),
                actual: format!("{} outputs", outputs.len()),
            }
        })?;

        let probabilities: Vec<f64> = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?
            .iter()
            .map(|p| *p as f64)
            .collect();

        check_probabilities(&probabilities, self.n_classes)?;

        debug!("ONNX probabilities: {:?}", probabilities);
        Ok(probabilities)
    }
}

impl RiskModel for OnnxModel {
    fn predict(&self, features: &FeatureVector) -> Result<usize, InferenceError> {
        self.run(features).map(|probabilities| argmax(&probabilities))
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        self.run(features)
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
