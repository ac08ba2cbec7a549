//! Reading Validation
//!
//! Rejects malformed readings before they reach the risk engine. Values are
//! never clamped: anything outside the configured ranges is an error.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ReadingInput, ValidationConfig, Validator, DEFAULT_LOCATION};
