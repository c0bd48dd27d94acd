use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every way a prediction request can fail, from input validation through
/// model loading and inference. The HTTP layer maps each variant to a status
/// code; the core only distinguishes the kinds.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Invalid plant")]
    InvalidPlant,
    #[error("Missing image")]
    MissingImage,
    #[error("Invalid image type")]
    InvalidImageType,
    #[error("Image size too large (Max 5MB)")]
    ImageTooLarge { size: usize },
    #[error("Malformed upload: {0}")]
    InvalidBody(String),
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Model returned {outputs} scores for {labels} labels")]
    LabelMismatch { outputs: usize, labels: usize },
    #[error("{0} timed out")]
    Timeout(&'static str),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPlant
            | Self::MissingImage
            | Self::InvalidImageType
            | Self::ImageTooLarge { .. }
            | Self::InvalidBody(_)
            | Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::ModelLoad(_) | Self::LabelMismatch { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("prediction failed: {}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
