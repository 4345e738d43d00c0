//! API router configuration

use axum::{
  Router,
  extract::DefaultBodyLimit,
  http::{HeaderName, Method, header},
  routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use buildbox_lib::config::ServerConfig;

use super::AppState;
use super::handlers::{self, ARTIFACT_SHA256_HEADER, BUILD_ID_HEADER};

/// Create the service router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
  let router = Router::new()
    .route("/buildApp", post(handlers::build_app))
    .route("/health", get(handlers::health))
    .layer(DefaultBodyLimit::max(config.max_body_size))
    .layer(TraceLayer::new_for_http());

  let router = if config.cors { router.layer(cors_layer()) } else { router };

  router.with_state(state)
}

fn cors_layer() -> CorsLayer {
  CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([
      Method::GET,
      Method::HEAD,
      Method::PUT,
      Method::PATCH,
      Method::POST,
      Method::DELETE,
      Method::OPTIONS,
    ])
    .allow_headers(Any)
    .expose_headers([
      header::CONTENT_DISPOSITION,
      HeaderName::from_static(BUILD_ID_HEADER),
      HeaderName::from_static(ARTIFACT_SHA256_HEADER),
    ])
}
