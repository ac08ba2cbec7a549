//! Advice Generation
//!
//! Natural-language recommendations from a local text-generation service
//! (Ollama-compatible `/api/generate`), with a static fallback per tier.

use async_trait::async_trait;
use feature_engine::Reading;
use inference_engine::RiskTier;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::outcome::Outcome;
use crate::FallbackError;

/// What the advisor is told about a prediction
#[derive(Debug, Clone, Serialize)]
pub struct AdviceRequest {
    pub tier: RiskTier,
    pub confidence: f64,
    pub top_factors: Vec<String>,
    pub reading: Reading,
}

/// Structured advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub recommendations: Vec<String>,
    pub public_warning: String,
    pub brief_description: String,
    pub final_decision: String,
}

/// Advice collaborator
#[async_trait]
pub trait AdviceProvider: Send + Sync {
    async fn advise(&self, request: &AdviceRequest) -> Result<Advice, FallbackError>;

    fn name(&self) -> &str;
}

/// Static advice used whenever the provider cannot answer
pub fn static_advice(tier: RiskTier) -> Advice {
    match tier {
        RiskTier::High => Advice {
            recommendations: vec![
                "Increase chlorination in community water tanks immediately.".to_string(),
                "Deploy rapid response medical teams to the affected ward.".to_string(),
                "Halt all non-crucial water distribution from suspect sources.".to_string(),
            ],
            public_warning: "HIGH ALERT: Boil all drinking water. Contamination risk in progress."
                .to_string(),
            brief_description: "Critical environmental indicators and surging case counts necessitate an immediate intervention to prevent a widespread outbreak.".to_string(),
            final_decision: "IMMEDIATE DEPLOYMENT: Activate emergency containment protocol for the entire ward.".to_string(),
        },
        RiskTier::Medium | RiskTier::Low => Advice {
            recommendations: vec![
                "Routine monitoring recommended.".to_string(),
                "Ensure water storage is covered.".to_string(),
            ],
            public_warning: "Water quality is currently within safe limits.".to_string(),
            brief_description: "Current data suggests a low-risk environment with no immediate threat to public health.".to_string(),
            final_decision: "MAINTAIN POSTURE: Continue routine surveillance and sensor calibration.".to_string(),
        },
    }
}

/// Ask the provider, substituting static advice on any failure or timeout
pub async fn advise_or_fallback(
    provider: Option<&dyn AdviceProvider>,
    request: &AdviceRequest,
    timeout: Duration,
) -> Outcome<Advice> {
    let Some(provider) = provider else {
        return Outcome::degraded(static_advice(request.tier), "advice provider disabled");
    };

    match tokio::time::timeout(timeout, provider.advise(request)).await {
        Ok(Ok(advice)) => {
            debug!("Advice from {}", provider.name());
            Outcome::ok(advice)
        }
        Ok(Err(e)) => {
            warn!("Advice provider {} failed: {}", provider.name(), e);
            Outcome::degraded(static_advice(request.tier), e.to_string())
        }
        Err(_) => {
            let e = FallbackError::Timeout(timeout.as_millis() as u64);
            warn!("Advice provider {} failed: {}", provider.name(), e);
            Outcome::degraded(static_advice(request.tier), e.to_string())
        }
    }
}

/// Advice service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl AdviceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Client for an Ollama-compatible generation endpoint
#[derive(Debug)]
pub struct OllamaAdvisor {
    endpoint: String,
    model: String,
    http_client: reqwest::Client,
}

impl OllamaAdvisor {
    pub fn new(config: &AdviceConfig) -> Result<Self, FallbackError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| FallbackError::Unavailable(e.to_string()))?;

        let endpoint = format!("{}/api/generate", config.base_url.trim_end_matches('/'));
        info!("Advice endpoint {} (model {})", endpoint, config.model);

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            http_client,
        })
    }

    fn prompt(request: &AdviceRequest) -> String {
        let reading = serde_json::to_string(&request.reading).unwrap_or_default();
        format!(
            "System: You are a water-borne disease prevention and public health advisor.\n\n\
             Context:\n\
             - Risk Level: {} (Confidence: {:.1}%)\n\
             - Primary Drivers: {}\n\
             - Environmental Data: {}\n\n\
             Task:\n\
             Provide 3-4 professional, actionable recommendations for local government and health officials.\n\
             Respond with a JSON object with four keys:\n\
             1. 'recommendations' (a list of strings)\n\
             2. 'public_warning' (a concise string for a public alert)\n\
             3. 'brief_description' (a 2-3 sentence overview of why this level of action is being taken)\n\
             4. 'final_decision' (a single sentence stating the command for the region)",
            request.tier.as_str().to_uppercase(),
            request.confidence * 100.0,
            request.top_factors.join(", "),
            reading
        )
    }
}

#[async_trait]
impl AdviceProvider for OllamaAdvisor {
    async fn advise(&self, request: &AdviceRequest) -> Result<Advice, FallbackError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": Self::prompt(request),
            "stream": false,
            "format": "json"
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| FallbackError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FallbackError::RequestFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FallbackError::MalformedResponse(e.to_string()))?;

        // The generated text is itself a JSON document
        let content = json["response"]
            .as_str()
            .ok_or_else(|| FallbackError::MalformedResponse("missing response".to_string()))?;

        serde_json::from_str(content).map_err(|e| FallbackError::MalformedResponse(e.to_string()))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    fn request(tier: RiskTier) -> AdviceRequest {
        AdviceRequest {
            tier,
            confidence: 0.97,
            top_factors: vec!["contamination".to_string(), "cases_count".to_string()],
            reading: Reading::new(400.0, 4.0, 0.9, 100),
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl AdviceProvider for SlowProvider {
        async fn advise(&self, request: &AdviceRequest) -> Result<Advice, FallbackError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(static_advice(request.tier))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_disabled_provider_degrades() {
        let outcome = advise_or_fallback(None, &request(RiskTier::High), Duration::from_secs(1)).await;
        assert!(outcome.is_degraded());
        assert_eq!(outcome.value(), &static_advice(RiskTier::High));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_degrades() {
        let provider = SlowProvider;
        let outcome = advise_or_fallback(
            Some(&provider),
            &request(RiskTier::Low),
            Duration::from_millis(50),
        )
        .await;
        assert_eq!(outcome.reason(), Some("Timed out after 50 ms"));
        assert_eq!(outcome.value().recommendations.len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_service_degrades() {
        let advisor = OllamaAdvisor::new(&AdviceConfig {
            enabled: true,
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        })
        .unwrap();
        let outcome =
            advise_or_fallback(Some(&advisor), &request(RiskTier::High), Duration::from_secs(5)).await;
        assert!(outcome.is_degraded());
        assert!(outcome.value().public_warning.starts_with("HIGH ALERT"));
    }

    #[tokio::test]
    async fn test_parses_generated_json() {
        let app = Router::new().route(
            "/api/generate",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["stream"], false);
                assert_eq!(body["format"], "json");
                Json(serde_json::json!({
                    "response": serde_json::json!({
                        "recommendations": ["Chlorinate tanks"],
                        "public_warning": "Boil water",
                        "brief_description": "Contamination is high.",
                        "final_decision": "Contain."
                    }).to_string()
                }))
            }),
        );
        let base_url = serve(app).await;
        let advisor = OllamaAdvisor::new(&AdviceConfig {
            enabled: true,
            base_url,
            ..Default::default()
        })
        .unwrap();

        let outcome =
            advise_or_fallback(Some(&advisor), &request(RiskTier::High), Duration::from_secs(5)).await;
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.value().recommendations, vec!["Chlorinate tanks".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_generation_degrades() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async { Json(serde_json::json!({"response": "not json"})) }),
        );
        let base_url = serve(app).await;
        let advisor = OllamaAdvisor::new(&AdviceConfig {
            enabled: true,
            base_url,
            ..Default::default()
        })
        .unwrap();

        let outcome =
            advise_or_fallback(Some(&advisor), &request(RiskTier::Medium), Duration::from_secs(5)).await;
        assert!(outcome.reason().unwrap().starts_with("Malformed response"));
        assert_eq!(outcome.value(), &static_advice(RiskTier::Low));
    }

    #[test]
    fn test_prompt_mentions_context() {
        let prompt = OllamaAdvisor::prompt(&request(RiskTier::High));
        assert!(prompt.contains("Risk Level: HIGH (Confidence: 97.0%)"));
        assert!(prompt.contains("contamination, cases_count"));
        assert!(prompt.contains("public_warning"));
    }
}
