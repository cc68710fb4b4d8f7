//! HTTP error mapping

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use voicebox_core::VoiceboxError;

/// Error returned by request handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Failure inside the synthesis core
    #[error(transparent)]
    Core(#[from] VoiceboxError),

    /// `ref_audio_url` could not be downloaded
    #[error("Failed to fetch reference audio: {0}")]
    Fetch(String),

    /// Malformed multipart upload
    #[error("Invalid upload: {0}")]
    Upload(String),

    /// A blocking worker panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl ApiError {
    /// Status code for this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Core(err) => match err {
                VoiceboxError::InvalidRequest { .. } | VoiceboxError::AudioFormat { .. } => {
                    StatusCode::BAD_REQUEST
                }
                VoiceboxError::PromptNotFound { .. } => StatusCode::NOT_FOUND,
                VoiceboxError::Configuration { .. } => StatusCode::SERVICE_UNAVAILABLE,
                VoiceboxError::ModelUnavailable { .. }
                | VoiceboxError::GenerationFailure { .. }
                | VoiceboxError::PersistenceFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Fetch(_) | Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Fetch(err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Upload(err.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;
