//! Trend Estimation
//!
//! Compares the current risk ordinal against the mean ordinal of a
//! location's most recent predictions.

use inference_engine::RiskTier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::config::TrendConfig;
use crate::AlertingError;

/// Direction of risk relative to recent history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Rising,
    Stable,
    Falling,
}

impl Trend {
    pub const ALL: [Trend; 3] = [Trend::Rising, Trend::Stable, Trend::Falling];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "RISING",
            Trend::Stable => "STABLE",
            Trend::Falling => "FALLING",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trend {
    type Err = AlertingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RISING" => Ok(Trend::Rising),
            "STABLE" => Ok(Trend::Stable),
            "FALLING" => Ok(Trend::Falling),
            _ => Err(AlertingError::UnknownLabel(s.to_string())),
        }
    }
}

/// Trend estimator with hysteresis
#[derive(Debug, Clone)]
pub struct TrendEstimator {
    config: TrendConfig,
}

impl Default for TrendEstimator {
    fn default() -> Self {
        Self::new(TrendConfig::default())
    }
}

impl TrendEstimator {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    /// How many prior predictions the caller should fetch
    pub fn window(&self) -> usize {
        self.config.window
    }

    /// Estimate the trend of `current` against prior tiers, newest first.
    /// Only the first `window` entries are considered.
    pub fn estimate(&self, current: RiskTier, recent: &[RiskTier]) -> Trend {
        let history = &recent[..recent.len().min(self.config.window)];
        if history.is_empty() {
            return Trend::Stable;
        }

        let mean = history.iter().map(|t| t.ordinal() as f64).sum::<f64>() / history.len() as f64;
        let trend = self.compare(current.ordinal() as f64, mean);
        debug!(
            "Trend {} (current={}, mean={:.3} over {})",
            trend,
            current.ordinal(),
            mean,
            history.len()
        );
        trend
    }

    /// Band comparison of a current value against a historical mean
    pub fn compare(&self, current: f64, mean: f64) -> Trend {
        if current > mean + self.config.band {
            Trend::Rising
        } else if current < mean - self.config.band {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use RiskTier::*;

    #[test]
    fn test_no_history_is_stable() {
        let estimator = TrendEstimator::default();
        for tier in RiskTier::ALL {
            assert_eq!(estimator.estimate(tier, &[]), Trend::Stable);
        }
    }

    #[test]
    fn test_band_boundary() {
        let estimator = TrendEstimator::default();
        assert_eq!(estimator.compare(0.2, 0.0), Trend::Stable);
        assert_eq!(estimator.compare(0.21, 0.0), Trend::Rising);
        assert_eq!(estimator.compare(-0.2, 0.0), Trend::Stable);
        assert_eq!(estimator.compare(-0.21, 0.0), Trend::Falling);
    }

    #[test]
    fn test_history_directions() {
        let estimator = TrendEstimator::default();

        // mean 0.0 -> medium is +1.0
        assert_eq!(estimator.estimate(Medium, &[Low, Low, Low]), Trend::Rising);
        // mean 1.333 -> high is +0.667
        assert_eq!(estimator.estimate(High, &[High, Medium, Medium]), Trend::Rising);
        // mean 1.667 -> high is +0.333
        assert_eq!(estimator.estimate(High, &[High, High, Medium]), Trend::Rising);
        // mean 2.0
        assert_eq!(estimator.estimate(High, &[High, High, High]), Trend::Stable);
        assert_eq!(estimator.estimate(Low, &[Medium, Medium, Low]), Trend::Falling);
        // mean 0.333 -> low is -0.333
        assert_eq!(estimator.estimate(Low, &[Medium, Low, Low]), Trend::Falling);
    }

    #[test]
    fn test_window_truncates_history() {
        let estimator = TrendEstimator::default();
        // Only the three newest count; the old highs are ignored
        assert_eq!(
            estimator.estimate(Low, &[Low, Low, Low, High, High]),
            Trend::Stable
        );

        let wide = TrendEstimator::new(TrendConfig::smoothed());
        assert_eq!(wide.window(), 5);
        assert_eq!(wide.estimate(Low, &[Low, Low, Low, High, High]), Trend::Falling);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Trend::Rising.to_string(), "RISING");
        assert_eq!("falling".parse::<Trend>().unwrap(), Trend::Falling);
        assert!("sideways".parse::<Trend>().is_err());
        assert_eq!(serde_json::to_string(&Trend::Stable).unwrap(), "\"STABLE\"");
    }

    proptest! {
        #[test]
        fn prop_same_tier_history_is_stable(n in 1usize..6, tier in 0usize..3) {
            let tier = RiskTier::ALL[tier];
            let history = vec![tier; n];
            prop_assert_eq!(TrendEstimator::default().estimate(tier, &history), Trend::Stable);
        }
    }
}
