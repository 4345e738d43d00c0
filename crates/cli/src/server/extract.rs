use axum::{
  Form, Json,
  extract::{FromRequest, Request},
  http::header::CONTENT_TYPE,
};
use serde::Deserialize;

use super::error::ApiError;

/// Raw `/buildApp` fields, accepted as JSON or as a urlencoded form.
///
/// Missing fields decode as empty strings so they are reported by request
/// validation instead of by the decoder.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuildParams {
  pub code: String,
  pub os: String,
  pub arch: String,
  pub bin: String,
}

#[axum::async_trait]
impl<S> FromRequest<S> for BuildParams
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    if is_form(&req) {
      let Form(params) = Form::<BuildParams>::from_request(req, state)
        .await
        .map_err(|rejection| ApiError::rejected(rejection.status(), rejection.body_text()))?;
      Ok(params)
    } else {
      let Json(params) = Json::<BuildParams>::from_request(req, state)
        .await
        .map_err(|rejection| ApiError::rejected(rejection.status(), rejection.body_text()))?;
      Ok(params)
    }
  }
}

fn is_form(req: &Request) -> bool {
  req
    .headers()
    .get(CONTENT_TYPE)
    .and_then(|value| value.to_str().ok())
    .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}
