//! Prediction Pipeline Implementation

use alerting::{
    alert_message, compose, join_recommendations, AlertingConfig, SeverityClassifier,
    TrendEstimator,
};
use chrono::Utc;
use data_validator::{ReadingInput, Validator};
use fallback::{
    advise_or_fallback, explain_or_fallback, AdviceProvider, AdviceRequest, AttributionProvider,
};
use feature_engine::Reading;
use inference_engine::{ModelReport, RiskClassifier, RiskTier};
use std::sync::Arc;
use std::time::Duration;
use storage::{AlertRecord, HistoryStore, NewAlert, NewPrediction, StorageError, StoreSummary};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::scenario::Scenario;
use crate::types::{Analysis, AnalysisPrediction, BatchError, BatchReport, Simulation, Submission};
use crate::PipelineError;

/// Upper bound on a single page of history
pub const MAX_PAGE_SIZE: usize = 1000;

const DEFAULT_ADVICE_TIMEOUT: Duration = Duration::from_secs(30);

/// End-to-end prediction pipeline
pub struct PredictionPipeline {
    classifier: RiskClassifier,
    trend: TrendEstimator,
    severity: SeverityClassifier,
    validator: Validator,
    store: Arc<dyn HistoryStore>,
    advisor: Option<Arc<dyn AdviceProvider>>,
    attribution: Option<Arc<dyn AttributionProvider>>,
    advice_timeout: Duration,
}

impl PredictionPipeline {
    /// Create a pipeline with no advice or attribution collaborators
    pub fn new(
        classifier: RiskClassifier,
        store: Arc<dyn HistoryStore>,
        config: AlertingConfig,
    ) -> Self {
        info!(
            "Creating prediction pipeline (store={}, model loaded={}, trend window={}, band={})",
            store.name(),
            classifier.is_loaded(),
            config.trend.window,
            config.trend.band
        );
        Self {
            classifier,
            trend: TrendEstimator::new(config.trend),
            severity: SeverityClassifier::new(config.severity),
            validator: Validator::default(),
            store,
            advisor: None,
            attribution: None,
            advice_timeout: DEFAULT_ADVICE_TIMEOUT,
        }
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn AdviceProvider>, timeout: Duration) -> Self {
        info!("Advice provider: {} (timeout {:?})", advisor.name(), timeout);
        self.advisor = Some(advisor);
        self.advice_timeout = timeout;
        self
    }

    pub fn with_attribution(mut self, provider: Arc<dyn AttributionProvider>) -> Self {
        info!("Attribution provider: {}", provider.name());
        self.attribution = Some(provider);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }

    /// Validate a boundary input into a reading and a location
    pub fn validate(&self, input: &ReadingInput) -> Result<(Reading, String), PipelineError> {
        let reading = self.validator.validate_reading(input)?;
        let location = self.validator.validate_location(input.location.as_deref())?;
        Ok((reading, location))
    }

    /// Classify, persist and alert for one validated reading
    pub async fn submit(&self, reading: Reading, location: &str) -> Result<Submission, PipelineError> {
        let classification = self.classifier.classify(&reading)?;
        let tier = classification.tier;

        let mut unit = self.store.begin().await?;

        // History must be read before this prediction is written
        let history = unit.query_recent(location, self.trend.window()).await?;
        let prior = history
            .iter()
            .map(|p| p.risk_level.parse::<RiskTier>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let trend = self.trend.estimate(tier, &prior);
        let severity = self.severity.classify(tier, classification.confidence, trend);
        let recommendations = compose(tier, &reading, severity, trend);
        let created_at_ms = Utc::now().timestamp_millis();

        let new_prediction = NewPrediction {
            location: location.to_string(),
            rainfall: reading.rainfall,
            ph_level: reading.ph_level,
            contamination: reading.contamination,
            cases_count: reading.cases_count as i64,
            risk_level: tier.to_string(),
            confidence: classification.confidence,
            method: classification.method().to_string(),
            reason: classification.reason().map(str::to_string),
            severity: severity.to_string(),
            trend: trend.to_string(),
            recommendation: join_recommendations(&recommendations),
            created_at_ms,
        };
        let prediction_id = unit.append_prediction(new_prediction.clone()).await?;

        let alert = if severity.raises_alert() {
            let new_alert = NewAlert {
                prediction_id,
                location: location.to_string(),
                severity: severity.to_string(),
                message: alert_message(location, trend, classification.confidence, &reading),
                created_at_ms,
            };
            let alert_id = unit.append_alert(new_alert.clone()).await?;
            Some(new_alert.with_id(alert_id))
        } else {
            None
        };

        unit.commit().await?;

        metrics::counter!(
            "sentinel_predictions_total",
            "risk_level" => tier.as_str(),
            "method" => classification.method()
        )
        .increment(1);
        metrics::histogram!("sentinel_confidence", "risk_level" => tier.as_str())
            .record(classification.confidence);
        if let Some(alert) = &alert {
            metrics::counter!("sentinel_alerts_total", "severity" => alert.severity.clone())
                .increment(1);
            warn!(
                "Alert {} raised at {}: {} ({})",
                alert.id, location, severity, trend
            );
        }
        info!(
            "Prediction {} at {}: {} conf={:.3} via {}, trend {}, severity {}",
            prediction_id,
            location,
            tier,
            classification.confidence,
            classification.method(),
            trend,
            severity
        );

        Ok(Submission {
            prediction: new_prediction.with_id(prediction_id),
            recommendations,
            alert,
        })
    }

    /// Validate then submit one boundary input
    pub async fn submit_input(&self, input: &ReadingInput) -> Result<Submission, PipelineError> {
        let (reading, location) = self.validate(input)?;
        self.submit(reading, &location).await
    }

    /// Submit entries independently, reporting per-index failures
    pub async fn submit_batch(&self, inputs: &[ReadingInput]) -> BatchReport {
        let mut predictions = Vec::with_capacity(inputs.len());
        let mut errors = Vec::new();

        for (index, input) in inputs.iter().enumerate() {
            match self.submit_input(input).await {
                Ok(submission) => predictions.push(submission),
                Err(e) => {
                    debug!("Batch entry {} failed: {}", index, e);
                    errors.push(BatchError {
                        index,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !errors.is_empty() {
            metrics::counter!("sentinel_batch_failures_total").increment(errors.len() as u64);
        }
        info!(
            "Batch of {}: {} ok, {} failed",
            inputs.len(),
            predictions.len(),
            errors.len()
        );

        BatchReport {
            total: inputs.len(),
            successful: predictions.len(),
            failed: errors.len(),
            predictions,
            errors,
        }
    }

    pub async fn list_predictions(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<storage::PredictionRecord>, PipelineError> {
        Ok(self
            .store
            .list_predictions(offset, limit.min(MAX_PAGE_SIZE))
            .await?)
    }

    pub async fn list_alerts(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, PipelineError> {
        Ok(self.store.list_alerts(offset, limit.min(MAX_PAGE_SIZE)).await?)
    }

    /// Mark an alert resolved; the only mutation in the history
    pub async fn resolve_alert(&self, alert_id: i64) -> Result<AlertRecord, PipelineError> {
        let alert = self.store.resolve(alert_id).await?;
        info!("Alert {} resolved", alert_id);
        Ok(alert)
    }

    pub async fn summary(&self) -> Result<StoreSummary, PipelineError> {
        Ok(self.store.summary().await?)
    }

    /// Classify, attribute and advise without persisting anything
    pub async fn analyze(&self, reading: Reading) -> Result<Analysis, PipelineError> {
        let classification = self.classifier.classify(&reading)?;

        let attribution = explain_or_fallback(self.attribution.as_deref(), &classification.features);
        if let Some(reason) = attribution.reason() {
            metrics::counter!("sentinel_degraded_total", "collaborator" => "attribution")
                .increment(1);
            debug!("Attribution degraded: {}", reason);
        }

        let request = AdviceRequest {
            tier: classification.tier,
            confidence: classification.confidence,
            top_factors: attribution.value().top_factors.clone(),
            reading,
        };
        let advice = advise_or_fallback(self.advisor.as_deref(), &request, self.advice_timeout).await;
        if let Some(reason) = advice.reason() {
            metrics::counter!("sentinel_degraded_total", "collaborator" => "advice").increment(1);
            debug!("Advice degraded: {}", reason);
        }

        Ok(Analysis {
            reading,
            prediction: AnalysisPrediction::from(&classification),
            attribution,
            advice,
        })
    }

    /// What-if: adjust a baseline, validate the result, analyse it
    pub async fn simulate(
        &self,
        baseline: &ReadingInput,
        scenario: Scenario,
    ) -> Result<Simulation, PipelineError> {
        let modified = scenario.apply(baseline);
        let reading = self.validator.validate_reading(&modified)?;
        let analysis = self.analyze(reading).await?;
        let simulation_id = Uuid::new_v4();

        info!(
            "Simulation {}: {} at conf={:.3}",
            simulation_id, analysis.prediction.risk_level, analysis.prediction.confidence
        );

        Ok(Simulation {
            simulation_id,
            scenario,
            modified_inputs: reading,
            analysis,
        })
    }

    /// Version, classes and ranked feature importances of the deployed model
    pub fn model_report(&self) -> Result<ModelReport, PipelineError> {
        let artifact = self.classifier.artifact().ok_or_else(|| {
            inference_engine::InferenceError::ModelUnavailable(
                "no model artifact deployed".to_string(),
            )
        })?;
        Ok(artifact.report())
    }
}
