//! Pipeline result shapes

use fallback::{Advice, Attribution, Outcome};
use feature_engine::{FeatureVector, Reading};
use inference_engine::{Classification, RiskTier};
use serde::Serialize;
use storage::{AlertRecord, PredictionRecord};
use uuid::Uuid;

use crate::scenario::Scenario;

/// A persisted prediction and the alert it raised, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub prediction: PredictionRecord,
    /// Same text as `prediction.recommendation`, unjoined
    pub recommendations: Vec<String>,
    pub alert: Option<AlertRecord>,
}

/// One failed batch entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchError {
    pub index: usize,
    pub error: String,
}

/// Per-entry outcome of a batch submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub predictions: Vec<Submission>,
    pub errors: Vec<BatchError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisPrediction {
    pub risk_level: RiskTier,
    pub confidence: f64,
    pub method: &'static str,
    pub reason: Option<&'static str>,
    pub features: FeatureVector,
}

impl From<&Classification> for AnalysisPrediction {
    fn from(c: &Classification) -> Self {
        Self {
            risk_level: c.tier,
            confidence: c.confidence,
            method: c.method(),
            reason: c.reason(),
            features: c.features,
        }
    }
}

/// Advisory result. Nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub reading: Reading,
    pub prediction: AnalysisPrediction,
    pub attribution: Outcome<Attribution>,
    pub advice: Outcome<Advice>,
}

/// What-if projection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    pub simulation_id: Uuid,
    pub scenario: Scenario,
    pub modified_inputs: Reading,
    pub analysis: Analysis,
}
