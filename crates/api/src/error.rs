//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inference_engine::InferenceError;
use pipeline::PipelineError;
use serde_json::json;
use storage::StorageError;
use thiserror::Error;

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Pipeline(PipelineError::Inference(InferenceError::ModelUnavailable(_))) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Pipeline(PipelineError::Inference(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Pipeline(PipelineError::Storage(StorageError::NotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Pipeline(PipelineError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Pipeline(PipelineError::Validation(_)) => "VALIDATION_ERROR",
            ApiError::Pipeline(PipelineError::Inference(InferenceError::ModelUnavailable(_))) => {
                "MODEL_UNAVAILABLE"
            }
            ApiError::Pipeline(PipelineError::Inference(_)) => "INFERENCE_ERROR",
            ApiError::Pipeline(PipelineError::Storage(StorageError::NotFound(_))) => "NOT_FOUND",
            ApiError::Pipeline(PipelineError::Storage(_)) => "STORAGE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();
        metrics::counter!("sentinel_http_errors_total", "code" => code).increment(1);

        if status.is_server_error() {
            tracing::error!(error_code = code, status_code = status.as_u16(), message = %message, "Request error");
        } else {
            tracing::debug!(error_code = code, message = %message, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "status": status.as_u16(),
            }
        }));
        (status, body).into_response()
    }
}
