//! Feature Vector Assembly

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Number of features in the vector
pub const FEATURE_DIMENSION: usize = 8;

/// Canonical feature order. The trained classifier is fitted on exactly this
/// order, so any change here invalidates every model artifact.
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = [
    "rainfall",
    "ph_level",
    "contamination",
    "cases_count",
    "ph_deviation",
    "rain_contam_interaction",
    "cases_per_contam",
    "severity_score",
];

/// Neutral water pH
const NEUTRAL_PH: f64 = 7.0;

/// Keeps the cases/contamination ratio finite. Part of the model's decision
/// boundary, must stay exactly 0.01.
const CONTAMINATION_OFFSET: f64 = 0.01;

// Severity score normalisers
const RAINFALL_SCALE: f64 = 400.0;
const PH_DEVIATION_SCALE: f64 = 3.0;
const CASES_SCALE: f64 = 120.0;
const COMPONENT_WEIGHT: f64 = 0.25;

/// Feature vector for ML inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Raw feature values in [`FEATURE_NAMES`] order
    pub values: [f64; FEATURE_DIMENSION],
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            values: [0.0; FEATURE_DIMENSION],
        }
    }
}

impl FeatureVector {
    pub fn rainfall(&self) -> f64 {
        self.values[0]
    }

    pub fn ph_level(&self) -> f64 {
        self.values[1]
    }

    pub fn contamination(&self) -> f64 {
        self.values[2]
    }

    pub fn cases_count(&self) -> f64 {
        self.values[3]
    }

    pub fn ph_deviation(&self) -> f64 {
        self.values[4]
    }

    pub fn rain_contam_interaction(&self) -> f64 {
        self.values[5]
    }

    pub fn cases_per_contam(&self) -> f64 {
        self.values[6]
    }

    /// Weighted composite of the four normalised inputs. Unbounded.
    pub fn severity_score(&self) -> f64 {
        self.values[7]
    }

    /// Values as a slice, in model order
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Iterate `(name, value)` pairs in model order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

/// Build the engineered feature vector from raw readings.
///
/// Pure and total: inputs are expected to be validated upstream.
pub fn engineer(rainfall: f64, ph_level: f64, contamination: f64, cases_count: u32) -> FeatureVector {
    let cases = cases_count as f64;

    let ph_deviation = (ph_level - NEUTRAL_PH).abs();
    let rain_contam_interaction = rainfall * contamination;
    let cases_per_contam = cases / (contamination + CONTAMINATION_OFFSET);

    // Summation order matches the training pipeline so scores are bit-identical
    let severity_score = rainfall / RAINFALL_SCALE * COMPONENT_WEIGHT
        + ph_deviation / PH_DEVIATION_SCALE * COMPONENT_WEIGHT
        + contamination * COMPONENT_WEIGHT
        + cases / CASES_SCALE * COMPONENT_WEIGHT;

    trace!(
        "Engineered features: ph_dev={:.3}, interaction={:.3}, ratio={:.3}, severity={:.3}",
        ph_deviation,
        rain_contam_interaction,
        cases_per_contam,
        severity_score
    );

    FeatureVector {
        values: [
            rainfall,
            ph_level,
            contamination,
            cases,
            ph_deviation,
            rain_contam_interaction,
            cases_per_contam,
            severity_score,
        ],
    }
}
