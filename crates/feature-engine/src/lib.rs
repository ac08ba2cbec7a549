//! Feature Engineering Engine
//!
//! Turns the four raw environmental readings into the fixed-order feature
//! vector the trained risk classifier was fitted on.

mod features;
mod reading;

pub use features::{engineer, FeatureVector, FEATURE_DIMENSION, FEATURE_NAMES};
pub use reading::Reading;
