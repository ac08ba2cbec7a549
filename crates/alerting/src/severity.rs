//! Severity Mapping

use inference_engine::RiskTier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::SeverityConfig;
use crate::trend::Trend;
use crate::AlertingError;

/// High-tier confidence above which the result is CRITICAL
pub const HIGH_TIER_CRITICAL_CONFIDENCE: f64 = 0.85;

/// Medium-tier confidence above which the result is WARNING
pub const MEDIUM_TIER_WARNING_CONFIDENCE: f64 = 0.9;

/// Operational alert level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Warning,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }

    /// HIGH and CRITICAL results raise an alert
    pub fn raises_alert(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = AlertingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(Severity::Critical),
            "HIGH" => Ok(Severity::High),
            "WARNING" => Ok(Severity::Warning),
            "INFO" => Ok(Severity::Info),
            _ => Err(AlertingError::UnknownLabel(s.to_string())),
        }
    }
}

/// Maps (tier, confidence, trend) to a severity
#[derive(Debug, Clone, Default)]
pub struct SeverityClassifier {
    config: SeverityConfig,
}

impl SeverityClassifier {
    pub fn new(config: SeverityConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, tier: RiskTier, confidence: f64, trend: Trend) -> Severity {
        match tier {
            RiskTier::High => {
                if confidence > self.config.critical_confidence || trend == Trend::Rising {
                    Severity::Critical
                } else {
                    Severity::High
                }
            }
            RiskTier::Medium => {
                if trend == Trend::Rising || confidence > self.config.warning_confidence {
                    Severity::Warning
                } else {
                    Severity::Info
                }
            }
            RiskTier::Low => Severity::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decision_table() {
        let classifier = SeverityClassifier::default();
        assert_eq!(classifier.classify(RiskTier::High, 0.9, Trend::Stable), Severity::Critical);
        assert_eq!(classifier.classify(RiskTier::High, 0.5, Trend::Stable), Severity::High);
        assert_eq!(classifier.classify(RiskTier::High, 0.5, Trend::Rising), Severity::Critical);
        assert_eq!(classifier.classify(RiskTier::Medium, 0.5, Trend::Stable), Severity::Info);
        assert_eq!(classifier.classify(RiskTier::Medium, 0.5, Trend::Rising), Severity::Warning);
        assert_eq!(classifier.classify(RiskTier::Medium, 0.95, Trend::Falling), Severity::Warning);
        assert_eq!(classifier.classify(RiskTier::Low, 0.99, Trend::Rising), Severity::Info);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let classifier = SeverityClassifier::default();
        assert_eq!(classifier.classify(RiskTier::High, 0.85, Trend::Stable), Severity::High);
        assert_eq!(classifier.classify(RiskTier::Medium, 0.9, Trend::Stable), Severity::Info);
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier = SeverityClassifier::new(SeverityConfig {
            critical_confidence: 0.95,
            warning_confidence: 0.6,
        });
        assert_eq!(classifier.classify(RiskTier::High, 0.9, Trend::Stable), Severity::High);
        assert_eq!(classifier.classify(RiskTier::Medium, 0.7, Trend::Stable), Severity::Warning);
    }

    #[test]
    fn test_alert_gate() {
        assert!(Severity::Critical.raises_alert());
        assert!(Severity::High.raises_alert());
        assert!(!Severity::Warning.raises_alert());
        assert!(!Severity::Info.raises_alert());
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
    }

    proptest! {
        #[test]
        fn prop_low_tier_is_always_info(confidence in 0.0f64..=1.0, trend in 0usize..3) {
            let severity = SeverityClassifier::default()
                .classify(RiskTier::Low, confidence, Trend::ALL[trend]);
            prop_assert_eq!(severity, Severity::Info);
        }

        #[test]
        fn prop_high_tier_always_alerts(confidence in 0.0f64..=1.0, trend in 0usize..3) {
            let severity = SeverityClassifier::default()
                .classify(RiskTier::High, confidence, Trend::ALL[trend]);
            prop_assert!(severity.raises_alert());
        }
    }
}
