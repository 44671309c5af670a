//! API error type mapping pipeline failures to HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use intake_pipeline::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::UpstreamFailure(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        let message = e.to_string();
        match e {
            PipelineError::UnsupportedMedia(_) | PipelineError::InputNotFound(_) => {
                ApiError::BadRequest(message)
            }
            PipelineError::InputTooLarge { .. } => ApiError::PayloadTooLarge(message),
            // Remote stage failures are the upstream API's problem, not ours.
            PipelineError::Transcription(_)
            | PipelineError::Analysis(_)
            | PipelineError::Extraction(_) => ApiError::UpstreamFailure(message),
            PipelineError::Synthesis(_)
            | PipelineError::Config(_)
            | PipelineError::Persist(_) => ApiError::InternalServerError(message),
        }
    }
}
