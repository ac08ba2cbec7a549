//! Reading Validator for Range Checking

use crate::error::ValidationError;
use feature_engine::Reading;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Location used when a submission does not name one
pub const DEFAULT_LOCATION: &str = "Unknown";

/// Maximum accepted location identifier length (characters)
const MAX_LOCATION_LEN: usize = 128;

/// Unvalidated reading as received at the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingInput {
    pub rainfall: f64,
    pub ph_level: f64,
    pub contamination: f64,
    /// Signed so negative counts can be reported instead of failing to parse
    pub cases_count: i64,
    #[serde(default)]
    pub location: Option<String>,
}

impl From<Reading> for ReadingInput {
    fn from(reading: Reading) -> Self {
        Self {
            rainfall: reading.rainfall,
            ph_level: reading.ph_level,
            contamination: reading.contamination,
            cases_count: reading.cases_count as i64,
            location: None,
        }
    }
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Rainfall valid range (mm)
    pub rainfall_range: (f64, f64),
    /// pH valid range
    pub ph_range: (f64, f64),
    /// Contamination index valid range
    pub contamination_range: (f64, f64),
    /// Case count valid range
    pub cases_range: (i64, i64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            rainfall_range: (0.0, f64::MAX),
            ph_range: (0.0, 14.0),
            contamination_range: (0.0, 1.0),
            cases_range: (0, u32::MAX as i64),
        }
    }
}

/// Validator for raw environmental readings
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        // NaN slips through both comparisons below
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate rainfall
    pub fn validate_rainfall(&self, rainfall: f64) -> Result<(), ValidationError> {
        self.validate_range("rainfall", rainfall, self.config.rainfall_range)
    }

    /// Validate pH
    pub fn validate_ph(&self, ph: f64) -> Result<(), ValidationError> {
        self.validate_range("ph_level", ph, self.config.ph_range)
    }

    /// Validate contamination index
    pub fn validate_contamination(&self, contamination: f64) -> Result<(), ValidationError> {
        self.validate_range("contamination", contamination, self.config.contamination_range)
    }

    /// Validate case count, returning it as an unsigned count
    pub fn validate_cases(&self, cases: i64) -> Result<u32, ValidationError> {
        let (min, max) = self.config.cases_range;
        if cases < min || cases > max {
            return Err(ValidationError::OutOfRange {
                field: "cases_count",
                value: cases as f64,
                min: min as f64,
                max: max as f64,
            });
        }
        u32::try_from(cases).map_err(|_| ValidationError::OutOfRange {
            field: "cases_count",
            value: cases as f64,
            min: 0.0,
            max: u32::MAX as f64,
        })
    }

    /// Validate every field of a raw reading. Fails on the first bad field,
    /// checked in feature order.
    pub fn validate_reading(&self, input: &ReadingInput) -> Result<Reading, ValidationError> {
        self.validate_rainfall(input.rainfall)?;
        self.validate_ph(input.ph_level)?;
        self.validate_contamination(input.contamination)?;
        let cases_count = self.validate_cases(input.cases_count)?;

        debug!(
            "Reading accepted: rainfall={}, ph={}, contamination={}, cases={}",
            input.rainfall, input.ph_level, input.contamination, cases_count
        );

        Ok(Reading::new(
            input.rainfall,
            input.ph_level,
            input.contamination,
            cases_count,
        ))
    }

    /// Normalise a location identifier. Blank or missing maps to
    /// [`DEFAULT_LOCATION`].
    pub fn validate_location(&self, location: Option<&str>) -> Result<String, ValidationError> {
        let trimmed = location.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return Ok(DEFAULT_LOCATION.to_string());
        }
        if trimmed.chars().count() > MAX_LOCATION_LEN {
            return Err(ValidationError::InvalidFormat(format!(
                "location longer than {} characters",
                MAX_LOCATION_LEN
            )));
        }
        Ok(trimmed.to_string())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
