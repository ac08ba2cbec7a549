use axum::{extract::State, Json};
use inference_engine::ModelReport;
use storage::StoreSummary;

use crate::error::ApiError;
use crate::SharedState;

/// Aggregate prediction and alert counts
pub async fn get_stats(State(state): State<SharedState>) -> Result<Json<StoreSummary>, ApiError> {
    let state = state.read().await;
    Ok(Json(state.pipeline.summary().await?))
}

/// Deployed model version and feature importances
pub async fn get_model_metrics(
    State(state): State<SharedState>,
) -> Result<Json<ModelReport>, ApiError> {
    let state = state.read().await;
    Ok(Json(state.pipeline.model_report()?))
}
