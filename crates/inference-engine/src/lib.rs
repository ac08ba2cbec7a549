//! Risk Inference Engine
//!
//! Hybrid classifier: deterministic safety overrides evaluated first, then a
//! trained ensemble model (native decision forest or ONNX via tract).

mod artifact;
mod engine;
mod forest;
mod model;
mod onnx;
mod rules;
mod tier;

pub use artifact::{
    BackendSpec, FeatureImportance, ImportanceSpec, ModelArtifact, ModelManifest, ModelReport,
    MANIFEST_FILE,
};
pub use engine::{Classification, Decision, RiskClassifier};
pub use forest::{DecisionTree, Estimator, TreeEnsemble, TreeNode};
pub use model::{
    rank_importances, EstimatorImportances, ImportanceSource, LabelDecoder, NativeImportances,
    RiskModel,
};
pub use onnx::OnnxModel;
pub use rules::{
    OverrideRule, CRITICAL_CONTAMINATION, HEAVY_RAINFALL_MM, INTERACTION_CONTAMINATION,
    OUTBREAK_CASES, OVERRIDE_ORDER,
};
pub use tier::RiskTier;

use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Artifact missing; fixed by deploying a model, never by retrying
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("Unknown risk label: {0}")]
    UnknownLabel(String),
    #[error("Class id {0} has no label")]
    UnknownClass(usize),
}
