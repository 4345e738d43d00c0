//! Error responses for the HTTP API.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use buildbox_lib::{BuildError, ValidationError};

/// Everything a request can fail with.
///
/// A compile failure is not an `ApiError`: it is a successful request with a
/// failed outcome and has its own response shape.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Body could not be decoded
  #[error("Bad request: {0}")]
  BadRequest(String),

  /// Body exceeded the configured limit
  #[error("Payload too large: {0}")]
  PayloadTooLarge(String),

  /// Request fields failed validation
  #[error("Validation error: {0}")]
  Validation(#[from] ValidationError),

  /// The build pipeline gave up
  #[error(transparent)]
  Build(BuildError),
}

impl ApiError {
  /// Map an extractor rejection, keeping the size-limit case distinct.
  pub fn rejected(status: StatusCode, message: String) -> Self {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
      ApiError::PayloadTooLarge(message)
    } else {
      ApiError::BadRequest(message)
    }
  }
}

impl From<BuildError> for ApiError {
  fn from(err: BuildError) -> Self {
    match err {
      BuildError::Validation(e) => ApiError::Validation(e),
      other => ApiError::Build(other),
    }
  }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
  pub code: String,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code) = match &self {
      ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
      ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
      ApiError::Validation(_) | ApiError::Build(BuildError::Validation(_)) => {
        (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
      }
      ApiError::Build(BuildError::Busy { .. }) => (StatusCode::SERVICE_UNAVAILABLE, "BUSY"),
      ApiError::Build(BuildError::Timeout { .. }) => (StatusCode::GATEWAY_TIMEOUT, "BUILD_TIMEOUT"),
      ApiError::Build(BuildError::ArtifactMissing { .. }) => (StatusCode::INTERNAL_SERVER_ERROR, "ARTIFACT_MISSING"),
      ApiError::Build(BuildError::Workspace(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "WORKSPACE_ERROR"),
      ApiError::Build(BuildError::Spawn { .. } | BuildError::Io(_)) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
      }
    };

    if status.is_server_error() {
      error!(code, error = %self, "request failed");
    }

    let body = ErrorResponse {
      error: self.to_string(),
      code: code.to_string(),
    };

    (status, Json(body)).into_response()
  }
}

pub type ApiResult<T> = Result<T, ApiError>;
