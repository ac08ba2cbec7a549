//! Advisory Routes
//!
//! Analysis and what-if simulation. Nothing here is persisted.

use axum::{extract::State, Json};
use data_validator::ReadingInput;
use pipeline::{Analysis, Scenario, Simulation};
use serde::Deserialize;

use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct SimulationRequest {
    pub baseline: ReadingInput,
    #[serde(default)]
    pub updates: Scenario,
}

pub async fn analyze(
    State(state): State<SharedState>,
    Json(input): Json<ReadingInput>,
) -> Result<Json<Analysis>, ApiError> {
    let state = state.read().await;
    let (reading, _) = state.pipeline.validate(&input)?;
    Ok(Json(state.pipeline.analyze(reading).await?))
}

pub async fn simulate(
    State(state): State<SharedState>,
    Json(request): Json<SimulationRequest>,
) -> Result<Json<Simulation>, ApiError> {
    let state = state.read().await;
    // Baseline must be sane on its own before it is modified
    state.pipeline.validate(&request.baseline)?;
    Ok(Json(
        state
            .pipeline
            .simulate(&request.baseline, request.updates)
            .await?,
    ))
}
