use axum::{
  Json,
  extract::State,
  http::{HeaderName, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::debug;

use buildbox_lib::{Artifact, BuildOutcome, BuildRequest, WorkspaceId};

use super::AppState;
use super::error::ApiResult;
use super::extract::BuildParams;

pub const BUILD_ID_HEADER: &str = "x-build-id";
pub const ARTIFACT_SHA256_HEADER: &str = "x-artifact-sha256";

/// Body returned when the source does not compile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileFailureResponse {
  pub success: bool,
  pub error_message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
  pub status: String,
  pub version: String,
  pub available_slots: usize,
}

/// `POST /buildApp`
pub async fn build_app(State(state): State<AppState>, params: BuildParams) -> ApiResult<Response> {
  let request = BuildRequest::new(params.code, &params.os, &params.arch, &params.bin)?;
  debug!(target = %request.platform(), bin = %request.binary_name(), "build requested");

  let report = state.service.build(&request).await?;

  let response = match report.outcome {
    BuildOutcome::Artifact(artifact) => artifact_response(report.id, artifact),
    BuildOutcome::Failure { diagnostic_text } => (
      StatusCode::UNPROCESSABLE_ENTITY,
      Json(CompileFailureResponse {
        success: false,
        error_message: diagnostic_text,
      }),
    )
      .into_response(),
  };

  Ok(response)
}

fn artifact_response(id: WorkspaceId, artifact: Artifact) -> Response {
  let headers = [
    (header::CONTENT_TYPE, "application/octet-stream".to_string()),
    (
      header::CONTENT_DISPOSITION,
      format!("attachment; filename=\"{}\"", artifact.file_name()),
    ),
    (HeaderName::from_static(BUILD_ID_HEADER), id.to_string()),
    (HeaderName::from_static(ARTIFACT_SHA256_HEADER), artifact.sha256().0),
  ];

  (StatusCode::OK, headers, artifact.bytes).into_response()
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
  Json(HealthResponse {
    status: "healthy".to_string(),
    version: state.version.to_string(),
    available_slots: state.service.available_slots(),
  })
}
