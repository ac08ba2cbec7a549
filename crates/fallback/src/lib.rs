//! Collaborator Fallbacks
//!
//! Advice generation and feature attribution are best-effort: when the
//! external service is missing, failing or slow, a deterministic fallback
//! is substituted and the result is marked [`Outcome::Degraded`].

mod advice;
mod attribution;
mod outcome;

pub use advice::{
    advise_or_fallback, static_advice, Advice, AdviceConfig, AdviceProvider, AdviceRequest,
    OllamaAdvisor,
};
pub use attribution::{
    explain_or_fallback, magnitude_attribution, Attribution, AttributionProvider,
    FeatureAttribution,
};
pub use outcome::Outcome;

use thiserror::Error;

/// Collaborator errors. Never fatal to the caller.
#[derive(Error, Debug)]
pub enum FallbackError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}
