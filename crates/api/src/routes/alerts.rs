//! Alert Routes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use storage::AlertRecord;

use super::predictions::PageQuery;
use crate::error::ApiError;
use crate::SharedState;

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<AlertRecord>,
    pub count: usize,
    pub unresolved_count: usize,
}

/// List alerts
pub async fn get_alerts(
    State(state): State<SharedState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<AlertResponse>, ApiError> {
    let state = state.read().await;
    let alerts = state.pipeline.list_alerts(params.skip, params.limit).await?;
    let unresolved = alerts.iter().filter(|a| !a.resolved).count();

    Ok(Json(AlertResponse {
        count: alerts.len(),
        unresolved_count: unresolved,
        data: alerts,
    }))
}

/// Resolve an alert
pub async fn resolve_alert(
    State(state): State<SharedState>,
    Path(alert_id): Path<i64>,
) -> Result<Json<AlertRecord>, ApiError> {
    let state = state.read().await;
    Ok(Json(state.pipeline.resolve_alert(alert_id).await?))
}
