//! Prediction Pipeline
//!
//! Orchestrates one submission end to end: classify, compare against the
//! location's history, map to a severity, compose recommendations, and
//! persist the prediction (plus an alert for HIGH/CRITICAL) in a single
//! unit of work. Also hosts the advisory workflows that persist nothing.

mod pipeline;
mod scenario;
mod types;

pub use pipeline::{PredictionPipeline, MAX_PAGE_SIZE};
pub use scenario::Scenario;
pub use types::{Analysis, AnalysisPrediction, BatchError, BatchReport, Simulation, Submission};

use data_validator::ValidationError;
use inference_engine::InferenceError;
use storage::StorageError;
use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl PipelineError {
    /// Model missing is a deployment problem, not worth retrying
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, PipelineError::Inference(InferenceError::ModelUnavailable(_)))
    }
}
