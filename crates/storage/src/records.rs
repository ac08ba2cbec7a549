//! Stored record shapes

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// Persisted prediction. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PredictionRecord {
    pub id: i64,
    pub location: String,
    pub rainfall: f64,
    pub ph_level: f64,
    pub contamination: f64,
    pub cases_count: i64,
    pub risk_level: String,
    pub confidence: f64,
    pub method: String,
    pub reason: Option<String>,
    pub severity: String,
    pub trend: String,
    pub recommendation: String,
    pub created_at_ms: i64,
}

/// Prediction awaiting an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPrediction {
    pub location: String,
    pub rainfall: f64,
    pub ph_level: f64,
    pub contamination: f64,
    pub cases_count: i64,
    pub risk_level: String,
    pub confidence: f64,
    pub method: String,
    pub reason: Option<String>,
    pub severity: String,
    pub trend: String,
    pub recommendation: String,
    pub created_at_ms: i64,
}

impl NewPrediction {
    pub fn with_id(self, id: i64) -> PredictionRecord {
        PredictionRecord {
            id,
            location: self.location,
            rainfall: self.rainfall,
            ph_level: self.ph_level,
            contamination: self.contamination,
            cases_count: self.cases_count,
            risk_level: self.risk_level,
            confidence: self.confidence,
            method: self.method,
            reason: self.reason,
            severity: self.severity,
            trend: self.trend,
            recommendation: self.recommendation,
            created_at_ms: self.created_at_ms,
        }
    }
}

/// Persisted alert. Only `resolved` ever changes, and only to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AlertRecord {
    pub id: i64,
    pub prediction_id: i64,
    pub location: String,
    pub severity: String,
    pub message: String,
    pub resolved: bool,
    pub created_at_ms: i64,
}

/// Alert awaiting an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub prediction_id: i64,
    pub location: String,
    pub severity: String,
    pub message: String,
    pub created_at_ms: i64,
}

impl NewAlert {
    pub fn with_id(self, id: i64) -> AlertRecord {
        AlertRecord {
            id,
            prediction_id: self.prediction_id,
            location: self.location,
            severity: self.severity,
            message: self.message,
            resolved: false,
            created_at_ms: self.created_at_ms,
        }
    }
}

/// Aggregate counts over the whole history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub total_predictions: u64,
    pub risk_distribution: BTreeMap<String, u64>,
    pub trend_distribution: BTreeMap<String, u64>,
    pub severity_distribution: BTreeMap<String, u64>,
    pub total_alerts: u64,
    pub active_alerts: u64,
}
