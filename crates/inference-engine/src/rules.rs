//! Safety Override Rules
//!
//! Hard public-health floors. When one of these matches, the statistical
//! model is never consulted.

use feature_engine::Reading;
use serde::{Deserialize, Serialize};

use crate::tier::RiskTier;

/// Contamination index above which risk is always high
pub const CRITICAL_CONTAMINATION: f64 = 0.85;

/// Rainfall (mm) above which moderate contamination becomes high risk
pub const HEAVY_RAINFALL_MM: f64 = 450.0;

/// Contamination index that combines with heavy rainfall
pub const INTERACTION_CONTAMINATION: f64 = 0.4;

/// Case count above which a localized outbreak is assumed
pub const OUTBREAK_CASES: u32 = 80;

/// Deterministic override, checked before the ensemble model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideRule {
    CriticalContamination,
    RainContaminationInteraction,
    LocalizedOutbreak,
}

/// Evaluation order. First match wins.
pub const OVERRIDE_ORDER: [OverrideRule; 3] = [
    OverrideRule::CriticalContamination,
    OverrideRule::RainContaminationInteraction,
    OverrideRule::LocalizedOutbreak,
];

impl OverrideRule {
    /// Whether this rule fires for the reading
    pub fn matches(&self, reading: &Reading) -> bool {
        match self {
            OverrideRule::CriticalContamination => reading.contamination > CRITICAL_CONTAMINATION,
            OverrideRule::RainContaminationInteraction => {
                reading.rainfall > HEAVY_RAINFALL_MM
                    && reading.contamination > INTERACTION_CONTAMINATION
            }
            OverrideRule::LocalizedOutbreak => reading.cases_count > OUTBREAK_CASES,
        }
    }

    /// Tier assigned when the rule fires
    pub fn tier(&self) -> RiskTier {
        RiskTier::High
    }

    /// Fixed confidence reported for the rule
    pub fn confidence(&self) -> f64 {
        match self {
            OverrideRule::CriticalContamination => 1.0,
            OverrideRule::RainContaminationInteraction => 0.95,
            OverrideRule::LocalizedOutbreak => 0.98,
        }
    }

    /// Human-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            OverrideRule::CriticalContamination => "Critical Contamination Threshold Exceeded",
            OverrideRule::RainContaminationInteraction => "Heavy Rain + Contamination Interaction",
            OverrideRule::LocalizedOutbreak => "Localized Outbreak Pattern Detected",
        }
    }

    /// First rule in [`OVERRIDE_ORDER`] that matches, if any
    pub fn first_match(reading: &Reading) -> Option<OverrideRule> {
        OVERRIDE_ORDER.iter().copied().find(|rule| rule.matches(reading))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contamination_dominates_other_rules() {
        // Every rule matches here
        let reading = Reading::new(500.0, 7.0, 0.9, 100);
        assert_eq!(
            OverrideRule::first_match(&reading),
            Some(OverrideRule::CriticalContamination)
        );
    }

    #[test]
    fn test_interaction_dominates_outbreak() {
        let reading = Reading::new(460.0, 7.0, 0.5, 90);
        assert_eq!(
            OverrideRule::first_match(&reading),
            Some(OverrideRule::RainContaminationInteraction)
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        assert_eq!(OverrideRule::first_match(&Reading::new(0.0, 7.0, 0.85, 0)), None);
        assert_eq!(OverrideRule::first_match(&Reading::new(450.0, 7.0, 0.5, 0)), None);
        assert_eq!(OverrideRule::first_match(&Reading::new(500.0, 7.0, 0.4, 0)), None);
        assert_eq!(OverrideRule::first_match(&Reading::new(0.0, 7.0, 0.0, 80)), None);
        assert_eq!(
            OverrideRule::first_match(&Reading::new(0.0, 7.0, 0.0, 81)),
            Some(OverrideRule::LocalizedOutbreak)
        );
    }

    #[test]
    fn test_rule_results() {
        for rule in OVERRIDE_ORDER {
            assert_eq!(rule.tier(), RiskTier::High);
        }
        assert_eq!(OverrideRule::CriticalContamination.confidence(), 1.0);
        assert_eq!(OverrideRule::RainContaminationInteraction.confidence(), 0.95);
        assert_eq!(OverrideRule::LocalizedOutbreak.confidence(), 0.98);
    }
}
