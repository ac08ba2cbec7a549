//! Feature Attribution
//!
//! Ranks the engineered features by their contribution to one prediction.

use feature_engine::{FeatureVector, FEATURE_DIMENSION, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::outcome::Outcome;
use crate::FallbackError;

const TOP_FACTORS: usize = 2;

/// Signed contribution of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub feature: String,
    pub impact: f64,
    pub absolute_impact: f64,
}

/// Ranked attribution for one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Sorted by absolute impact, largest first
    pub ranked: Vec<FeatureAttribution>,
    pub top_factors: Vec<String>,
    pub summary: String,
}

/// Attribution collaborator. Returns one signed impact per feature in
/// engineered order.
pub trait AttributionProvider: Send + Sync {
    fn explain(&self, features: &FeatureVector) -> Result<Vec<f64>, FallbackError>;

    fn name(&self) -> &str;
}

fn rank(impacts: &[f64]) -> Vec<FeatureAttribution> {
    let mut ranked: Vec<FeatureAttribution> = FEATURE_NAMES
        .iter()
        .zip(impacts.iter())
        .map(|(name, impact)| FeatureAttribution {
            feature: name.to_string(),
            impact: *impact,
            absolute_impact: impact.abs(),
        })
        .collect();
    ranked.sort_by(|a, b| b.absolute_impact.total_cmp(&a.absolute_impact));
    ranked
}

fn summarise(ranked: Vec<FeatureAttribution>, top_factors: Vec<String>) -> Attribution {
    let summary = format!("Primary risk drivers: {}", top_factors.join(", "));
    Attribution {
        ranked,
        top_factors,
        summary,
    }
}

/// Rule-based attribution: rank raw feature magnitudes
pub fn magnitude_attribution(features: &FeatureVector) -> Attribution {
    let ranked = rank(features.as_slice());
    let top_factors = ranked
        .iter()
        .take(TOP_FACTORS)
        .map(|a| a.feature.clone())
        .collect();
    summarise(ranked, top_factors)
}

fn provider_attribution(impacts: &[f64]) -> Attribution {
    let ranked = rank(impacts);
    let top_factors = ranked
        .iter()
        .filter(|a| a.impact > 0.0)
        .take(TOP_FACTORS)
        .map(|a| a.feature.clone())
        .collect();
    summarise(ranked, top_factors)
}

/// Ask the provider, falling back to magnitude ranking
pub fn explain_or_fallback(
    provider: Option<&dyn AttributionProvider>,
    features: &FeatureVector,
) -> Outcome<Attribution> {
    let Some(provider) = provider else {
        return Outcome::degraded(
            magnitude_attribution(features),
            "attribution provider not configured",
        );
    };

    let result = provider.explain(features).and_then(|impacts| {
        if impacts.len() == FEATURE_DIMENSION && impacts.iter().all(|v| v.is_finite()) {
            Ok(impacts)
        } else {
            Err(FallbackError::MalformedResponse(format!(
                "expected {} finite impacts, got {:?}",
                FEATURE_DIMENSION, impacts
            )))
        }
    });

    match result {
        Ok(impacts) => Outcome::ok(provider_attribution(&impacts)),
        Err(e) => {
            warn!("Attribution provider {} failed: {}", provider.name(), e);
            Outcome::degraded(magnitude_attribution(features), e.to_string())
        }
    }
}
