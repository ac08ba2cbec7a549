//! Alerting configuration

use serde::{Deserialize, Serialize};

use crate::severity::{HIGH_TIER_CRITICAL_CONFIDENCE, MEDIUM_TIER_WARNING_CONFIDENCE};
use crate::AlertingError;

/// Trend estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Number of prior predictions averaged per location
    pub window: usize,

    /// Hysteresis band around the historical mean
    pub band: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window: 3,
            band: 0.2,
        }
    }
}

impl TrendConfig {
    /// Narrow band, reacts to single tier changes sooner
    pub fn sensitive() -> Self {
        Self {
            band: 0.1,
            ..Default::default()
        }
    }

    /// Longer window and wider band for noisy sensor sites
    pub fn smoothed() -> Self {
        Self {
            window: 5,
            band: 0.3,
        }
    }
}

/// Severity thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityConfig {
    /// High tier above this confidence is CRITICAL regardless of trend
    pub critical_confidence: f64,

    /// Medium tier above this confidence is WARNING regardless of trend
    pub warning_confidence: f64,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            critical_confidence: HIGH_TIER_CRITICAL_CONFIDENCE,
            warning_confidence: MEDIUM_TIER_WARNING_CONFIDENCE,
        }
    }
}

/// Combined alerting configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    pub trend: TrendConfig,
    pub severity: SeverityConfig,
}

impl AlertingConfig {
    /// Reject values that would make the estimators meaningless
    pub fn validate(&self) -> Result<(), AlertingError> {
        if self.trend.window == 0 {
            return Err(AlertingError::InvalidConfig(
                "trend.window must be at least 1".to_string(),
            ));
        }
        if !self.trend.band.is_finite() || self.trend.band < 0.0 {
            return Err(AlertingError::InvalidConfig(format!(
                "trend.band must be a non-negative number, got {}",
                self.trend.band
            )));
        }
        for (name, value) in [
            ("severity.critical_confidence", self.severity.critical_confidence),
            ("severity.warning_confidence", self.severity.warning_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AlertingError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
