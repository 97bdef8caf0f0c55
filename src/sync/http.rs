//! HTTP boundary for the sync service.
//!
//! ## Routes
//!
//! - `POST /projects`: body `{ page?, limit?, refresh? }`, returns a page.
//! - `POST /functions/fetch-renewable-projects`: same handler, older path.
//! - `GET /health`: `{ "ok": true }`.
//! - `GET /chart.css`: chart theme stylesheet.
//!
//! Every response carries permissive CORS headers and `OPTIONS` answers the
//! preflight for the POST routes.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};
use tracing::{error, info};

use super::service::ProjectSyncService;
use crate::cache::ProjectStore;
use crate::project::{ErrorResponse, PageRequest};

pub const PROJECTS_PATH: &str = "/projects";
pub const LEGACY_PROJECTS_PATH: &str = "/functions/fetch-renewable-projects";

const FETCH_FAILED_DETAILS: &str = "Failed to fetch renewable energy projects";
const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

pub struct HttpState<S: ProjectStore> {
  service: Arc<ProjectSyncService<S>>,
  chart_css: Arc<str>,
}

impl<S: ProjectStore> Clone for HttpState<S> {
  fn clone(&self) -> Self {
    Self {
      service: self.service.clone(),
      chart_css: self.chart_css.clone(),
    }
  }
}

/// Build the router over a shared service. `chart_css` is served verbatim.
pub fn router<S: ProjectStore + 'static>(
  service: Arc<ProjectSyncService<S>>,
  chart_css: String,
) -> Router {
  let state = HttpState {
    service,
    chart_css: Arc::from(chart_css),
  };

  Router::new()
    .route(
      PROJECTS_PATH,
      post(fetch_projects_handler::<S>).options(preflight_handler),
    )
    .route(
      LEGACY_PROJECTS_PATH,
      post(fetch_projects_handler::<S>).options(preflight_handler),
    )
    .route("/health", get(health_handler))
    .route("/chart.css", get(chart_css_handler::<S>))
    .layer(middleware::map_response(add_cors_headers))
    .with_state(state)
}

/// Serve until ctrl-c.
pub async fn serve<S: ProjectStore + 'static>(
  service: Arc<ProjectSyncService<S>>,
  chart_css: String,
  addr: &str,
) -> Result<()> {
  let app = router(service, chart_css);
  let listener = tokio::net::TcpListener::bind(addr)
    .await
    .map_err(|e| eyre!("Failed to bind {}: {}", addr, e))?;
  let local = listener
    .local_addr()
    .map_err(|e| eyre!("Failed to read listener address: {}", e))?;
  info!(addr = %local, "Serving projects");

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!("Shutting down");
    })
    .await
    .map_err(|e| eyre!("Server error: {}", e))
}

/// `POST /projects`: malformed or missing bodies fall back to the default request.
async fn fetch_projects_handler<S: ProjectStore + 'static>(
  State(state): State<HttpState<S>>,
  body: Bytes,
) -> Response {
  let input: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
  let request = PageRequest::from_json(&input);

  match state.service.fetch_page(request).await {
    Ok(page) => (StatusCode::OK, Json(page)).into_response(),
    Err(e) => {
      error!(page = request.page, "Failed to serve projects: {:#}", e);
      let body = ErrorResponse {
        error: e.to_string(),
        details: Some(FETCH_FAILED_DETAILS.to_string()),
      };
      (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
  }
}

async fn preflight_handler() -> StatusCode {
  StatusCode::OK
}

async fn health_handler() -> impl IntoResponse {
  Json(json!({ "ok": true }))
}

async fn chart_css_handler<S: ProjectStore + 'static>(
  State(state): State<HttpState<S>>,
) -> impl IntoResponse {
  (
    [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
    state.chart_css.to_string(),
  )
}

async fn add_cors_headers(mut response: Response) -> Response {
  let headers = response.headers_mut();
  headers.insert(
    header::ACCESS_CONTROL_ALLOW_ORIGIN,
    HeaderValue::from_static("*"),
  );
  headers.insert(
    header::ACCESS_CONTROL_ALLOW_HEADERS,
    HeaderValue::from_static(ALLOWED_HEADERS),
  );
  headers.insert(
    header::ACCESS_CONTROL_ALLOW_METHODS,
    HeaderValue::from_static("GET, POST, OPTIONS"),
  );
  response
}
