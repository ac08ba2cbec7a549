//! Raw Environmental Reading

use serde::{Deserialize, Serialize};

use crate::features::{engineer, FeatureVector};

/// The four raw inputs for a single location at a single point in time.
///
/// Values are assumed to have passed boundary validation; nothing here
/// clamps or rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Rainfall in millimetres
    pub rainfall: f64,
    /// Water pH (0-14)
    pub ph_level: f64,
    /// Contamination index (0.0-1.0)
    pub contamination: f64,
    /// Recently reported disease cases
    pub cases_count: u32,
}

impl Reading {
    /// Create a new reading
    pub fn new(rainfall: f64, ph_level: f64, contamination: f64, cases_count: u32) -> Self {
        Self {
            rainfall,
            ph_level,
            contamination,
            cases_count,
        }
    }

    /// Engineered feature vector for this reading
    pub fn features(&self) -> FeatureVector {
        engineer(self.rainfall, self.ph_level, self.contamination, self.cases_count)
    }
}
