//! Alerting
//!
//! Turns a bare risk tier into an operational alert level: trend against a
//! location's recent history, severity mapping, and the ordered
//! recommendation text attached to every prediction.

mod config;
mod message;
mod recommendation;
mod severity;
mod trend;

pub use config::{AlertingConfig, SeverityConfig, TrendConfig};
pub use message::alert_message;
pub use recommendation::{compose, join_recommendations, RECOMMENDATION_SEPARATOR};
pub use severity::{
    Severity, SeverityClassifier, HIGH_TIER_CRITICAL_CONFIDENCE, MEDIUM_TIER_WARNING_CONFIDENCE,
};
pub use trend::{Trend, TrendEstimator};

use thiserror::Error;

/// Alerting errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlertingError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown label: {0}")]
    UnknownLabel(String),
}
