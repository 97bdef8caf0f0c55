//! Where the provider gets its pages from.

use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::cache::ProjectStore;
use crate::project::{ErrorResponse, PageRequest, PageResponse};
use crate::sync::http::PROJECTS_PATH;
use crate::sync::ProjectSyncService;

/// A source of project pages.
///
/// Returned futures own everything they need so they can be spawned.
pub trait ProjectSource: Send + Sync {
  fn fetch_page(&self, request: PageRequest) -> BoxFuture<'static, Result<PageResponse>>;

  /// Short description for the header
  fn describe(&self) -> String;
}

/// Calls a sync service in the same process
pub struct LocalSource<S: ProjectStore> {
  service: Arc<ProjectSyncService<S>>,
  label: String,
}

impl<S: ProjectStore> LocalSource<S> {
  pub fn new(service: Arc<ProjectSyncService<S>>, label: impl Into<String>) -> Self {
    Self {
      service,
      label: label.into(),
    }
  }
}

impl<S: ProjectStore + 'static> ProjectSource for LocalSource<S> {
  fn fetch_page(&self, request: PageRequest) -> BoxFuture<'static, Result<PageResponse>> {
    let service = self.service.clone();
    Box::pin(async move { service.fetch_page(request).await })
  }

  fn describe(&self) -> String {
    format!("local {}", self.label)
  }
}

/// Talks to a `serve` instance over HTTP
#[derive(Clone)]
pub struct RemoteSource {
  http: reqwest::Client,
  endpoint: Url,
}

impl RemoteSource {
  pub fn new(base_url: &str) -> Result<Self> {
    let mut base =
      Url::parse(base_url).map_err(|e| eyre!("Invalid server URL {}: {}", base_url, e))?;
    // Keep any path prefix: "http://host/api" serves at "http://host/api/projects"
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }
    let endpoint = base
      .join(PROJECTS_PATH.trim_start_matches('/'))
      .map_err(|e| eyre!("Invalid server URL {}: {}", base_url, e))?;
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, endpoint })
  }
}

impl ProjectSource for RemoteSource {
  fn fetch_page(&self, request: PageRequest) -> BoxFuture<'static, Result<PageResponse>> {
    let http = self.http.clone();
    let endpoint = self.endpoint.clone();
    Box::pin(async move {
      let response = http
        .post(endpoint)
        .json(&request)
        .send()
        .await
        .map_err(|e| eyre!("Failed to reach server: {}", e))?;

      let status = response.status();
      if !status.is_success() {
        let body: Option<ErrorResponse> = response.json().await.ok();
        return Err(match body {
          Some(ErrorResponse {
            error,
            details: Some(details),
          }) => eyre!("{}: {}", details, error),
          Some(ErrorResponse { error, .. }) => eyre!("{}", error),
          None => eyre!("Server returned {}", status),
        });
      }

      response
        .json::<PageResponse>()
        .await
        .map_err(|e| eyre!("Failed to parse server response: {}", e))
    })
  }

  fn describe(&self) -> String {
    format!("remote {}", self.endpoint)
  }
}
