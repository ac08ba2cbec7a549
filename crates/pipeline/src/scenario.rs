use data_validator::ReadingInput;
use serde::{Deserialize, Deserializer, Serialize};

/// Adjustments applied to a baseline reading. Multipliers go first; any
/// direct value then replaces the field outright.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contamination_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contamination: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "whole_number"
    )]
    pub cases_count: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Count {
    Integer(i64),
    Float(f64),
}

/// Accepts `90` and `90.0`, rejects `90.5`
fn whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<Count>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(count) => count,
    };
    match count {
        Count::Integer(n) => Ok(Some(n)),
        Count::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Ok(Some(f as i64))
        }
        Count::Float(f) => Err(serde::de::Error::custom(format!(
            "cases_count must be a whole number, got {}",
            f
        ))),
    }
}

impl Scenario {
    /// Apply to a baseline. The result still needs validation.
    pub fn apply(&self, baseline: &ReadingInput) -> ReadingInput {
        let mut modified = baseline.clone();

        if let Some(m) = self.rainfall_multiplier {
            modified.rainfall *= m;
        }
        if let Some(m) = self.contamination_multiplier {
            modified.contamination *= m;
        }

        if let Some(v) = self.rainfall {
            modified.rainfall = v;
        }
        if let Some(v) = self.ph_level {
            modified.ph_level = v;
        }
        if let Some(v) = self.contamination {
            modified.contamination = v;
        }
        if let Some(v) = self.cases_count {
            modified.cases_count = v;
        }

        modified
    }
}
