//! Recommendation Composer
//!
//! Builds the ordered action list attached to each prediction. Stages only
//! append: headline, trend commentary, tier baseline, then condition extras.

use feature_engine::Reading;
use inference_engine::RiskTier;

use crate::severity::Severity;
use crate::trend::Trend;

/// Separator used when the list is stored or displayed as one string
pub const RECOMMENDATION_SEPARATOR: &str = " | ";

const PH_SAFE_MIN: f64 = 5.0;
const PH_SAFE_MAX: f64 = 8.5;
const EXTREME_CONTAMINATION: f64 = 0.85;
const HOSPITAL_CAPACITY_CASES: u32 = 80;
const FLOOD_RAINFALL_MM: f64 = 300.0;

fn headline(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "CRITICAL: Activate emergency outbreak response protocol immediately",
        Severity::High => "HIGH: Outbreak risk confirmed, escalate to district health authorities",
        Severity::Warning => {
            "WARNING: Elevated risk, increase surveillance and prepare response teams"
        }
        Severity::Info => "INFO: Conditions within expected range, continue routine monitoring",
    }
}

fn trend_commentary(tier: RiskTier, trend: Trend) -> Option<&'static str> {
    match trend {
        Trend::Rising => Some("Risk is rising compared to recent readings at this location"),
        Trend::Stable if tier != RiskTier::High => {
            Some("Risk level is stable relative to recent history")
        }
        Trend::Stable => None,
        Trend::Falling => {
            Some("Risk is falling; continue current interventions until levels normalise")
        }
    }
}

fn baseline(tier: RiskTier) -> &'static [&'static str] {
    match tier {
        RiskTier::High => &[
            "Immediate water supply shutdown recommended",
            "Deploy medical response team to affected area",
            "Issue public boil-water advisory",
        ],
        RiskTier::Medium => &[
            "Increase water quality monitoring frequency",
            "Precautionary chlorination of water supply",
            "Alert local health authorities",
        ],
        RiskTier::Low => &[
            "Continue routine water quality monitoring",
            "Log data for trend analysis",
        ],
    }
}

/// Compose the recommendation list for one prediction
pub fn compose(tier: RiskTier, reading: &Reading, severity: Severity, trend: Trend) -> Vec<String> {
    let mut actions = vec![headline(severity).to_string()];

    if let Some(commentary) = trend_commentary(tier, trend) {
        actions.push(commentary.to_string());
    }

    actions.extend(baseline(tier).iter().map(|a| a.to_string()));

    if reading.ph_level < PH_SAFE_MIN || reading.ph_level > PH_SAFE_MAX {
        actions.push(
            "pH out of safe range (5.0-8.5), investigate industrial or chemical contamination"
                .to_string(),
        );
    }
    if reading.contamination > EXTREME_CONTAMINATION {
        actions.push("Extreme contamination, evacuate nearby residents".to_string());
    }
    if reading.cases_count > HOSPITAL_CAPACITY_CASES {
        actions.push("Hospital capacity alert, prepare overflow facilities".to_string());
    }
    if reading.rainfall > FLOOD_RAINFALL_MM {
        actions.push("Severe flooding risk, deploy flood barriers".to_string());
    }

    actions
}

pub fn join_recommendations(actions: &[String]) -> String {
    actions.join(RECOMMENDATION_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_extras_in_order() {
        let reading = Reading::new(350.0, 4.0, 0.9, 90);
        let actions = compose(RiskTier::High, &reading, Severity::Critical, Trend::Stable);
        let text = join_recommendations(&actions);

        let positions: Vec<usize> = [
            "pH out of safe range",
            "Extreme contamination",
            "Hospital capacity alert",
            "Severe flooding risk",
        ]
        .iter()
        .map(|needle| text.find(needle).expect("extra missing"))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(actions.len(), 1 + 3 + 4);
    }

    #[test]
    fn test_stage_order() {
        let reading = Reading::new(50.0, 7.0, 0.3, 10);
        let actions = compose(RiskTier::Medium, &reading, Severity::Warning, Trend::Rising);

        assert!(actions[0].starts_with("WARNING:"));
        assert!(actions[1].contains("rising"));
        assert_eq!(actions[2], "Increase water quality monitoring frequency");
        assert_eq!(actions.len(), 5);
    }

    #[test]
    fn test_stable_commentary_suppressed_for_high_tier() {
        let reading = Reading::new(50.0, 7.0, 0.3, 10);

        let high = compose(RiskTier::High, &reading, Severity::High, Trend::Stable);
        assert!(!high.iter().any(|a| a.contains("stable")));

        let low = compose(RiskTier::Low, &reading, Severity::Info, Trend::Stable);
        assert_eq!(low[1], "Risk level is stable relative to recent history");
        assert_eq!(low.len(), 4);
    }

    #[test]
    fn test_ph_bounds_are_exclusive() {
        let at_bounds = [Reading::new(0.0, 5.0, 0.0, 0), Reading::new(0.0, 8.5, 0.0, 0)];
        for reading in at_bounds {
            let actions = compose(RiskTier::Low, &reading, Severity::Info, Trend::Falling);
            assert!(!actions.iter().any(|a| a.starts_with("pH")));
        }

        let alkaline = Reading::new(0.0, 8.6, 0.0, 0);
        let actions = compose(RiskTier::Low, &alkaline, Severity::Info, Trend::Falling);
        assert!(actions.iter().any(|a| a.starts_with("pH")));
    }
}
