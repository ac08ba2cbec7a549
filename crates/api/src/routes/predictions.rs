//! Prediction Routes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use data_validator::ReadingInput;
use pipeline::{BatchReport, Submission};
use serde::{Deserialize, Serialize};
use storage::PredictionRecord;

use crate::error::ApiError;
use crate::SharedState;

/// Largest batch accepted in one request
pub const MAX_BATCH_SIZE: usize = 1000;

/// Pagination parameters, newest first
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub readings: Vec<ReadingInput>,
}

/// Response for predictions endpoint
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub data: Vec<PredictionRecord>,
    pub count: usize,
}

/// Submit one reading
pub async fn predict(
    State(state): State<SharedState>,
    Json(input): Json<ReadingInput>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let state = state.read().await;
    let submission = state.pipeline.submit_input(&input).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// Submit many readings; failures are reported per entry
pub async fn predict_batch(
    State(state): State<SharedState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchReport>, ApiError> {
    if request.readings.len() > MAX_BATCH_SIZE {
        return Err(ApiError::BadRequest(format!(
            "batch of {} exceeds the limit of {}",
            request.readings.len(),
            MAX_BATCH_SIZE
        )));
    }
    let state = state.read().await;
    Ok(Json(state.pipeline.submit_batch(&request.readings).await))
}

/// List predictions
pub async fn get_predictions(
    State(state): State<SharedState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let state = state.read().await;
    let data = state.pipeline.list_predictions(params.skip, params.limit).await?;

    Ok(Json(PredictionResponse {
        count: data.len(),
        data,
    }))
}
