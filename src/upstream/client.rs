use crate::config::Config;
use crate::upstream::api_types::{ApiFeedResponse, RawProjectRecord, RawUpstreamRecord};
use crate::upstream::UpstreamFeed;
use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Records requested from each feed
const REQUEST_LIMIT: u32 = 50;

/// At most this many wind records are used per pull
const MAX_WIND_RECORDS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
  Wind,
  Solar,
}

impl FeedKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      FeedKind::Wind => "wind",
      FeedKind::Solar => "solar",
    }
  }

  fn max_records(&self) -> usize {
    match self {
      FeedKind::Wind => MAX_WIND_RECORDS,
      FeedKind::Solar => REQUEST_LIMIT as usize,
    }
  }
}

/// NREL-style project feed, authenticated by an `api_key` query parameter
#[derive(Clone)]
pub struct NrelFeed {
  kind: FeedKind,
  url: Url,
  api_key: Option<String>,
  http: reqwest::Client,
}

impl NrelFeed {
  pub fn new(kind: FeedKind, url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
    let url = Url::parse(url).map_err(|e| eyre!("Invalid {} feed URL {}: {}", kind.as_str(), url, e))?;
    let http = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      kind,
      url,
      api_key,
      http,
    })
  }

  /// Build the wind and solar feeds from configuration
  pub fn from_config(config: &Config) -> Result<Vec<Self>> {
    let api_key = Config::get_api_key();
    let timeout = config.upstream.timeout();
    Ok(vec![
      Self::new(FeedKind::Wind, &config.upstream.wind_url, api_key.clone(), timeout)?,
      Self::new(FeedKind::Solar, &config.upstream.solar_url, api_key, timeout)?,
    ])
  }

  pub fn kind(&self) -> FeedKind {
    self.kind
  }

  fn request_url(&self, api_key: &str) -> Url {
    let mut url = self.url.clone();
    url
      .query_pairs_mut()
      .append_pair("api_key", api_key)
      .append_pair("format", "json");
    if self.kind == FeedKind::Wind {
      url
        .query_pairs_mut()
        .append_pair("limit", &REQUEST_LIMIT.to_string());
    }
    url
  }

  async fn fetch_records(&self) -> Result<Vec<RawUpstreamRecord>> {
    let api_key = self
      .api_key
      .as_deref()
      .ok_or_else(|| eyre!("No API key configured for the {} feed", self.kind.as_str()))?;

    let response = self
      .http
      .get(self.request_url(api_key))
      .send()
      .await
      .map_err(|e| eyre!("Failed to reach {} feed: {}", self.kind.as_str(), e))?
      .error_for_status()
      .map_err(|e| eyre!("{} feed returned an error: {}", self.kind.as_str(), e))?;

    let body: ApiFeedResponse = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse {} feed response: {}", self.kind.as_str(), e))?;

    Ok(parse_records(self.kind, body))
  }
}

/// Type each entry of a feed response, dropping entries that are not objects.
fn parse_records(kind: FeedKind, body: ApiFeedResponse) -> Vec<RawUpstreamRecord> {
  let mut records = Vec::new();
  for (index, value) in body.result.into_iter().take(kind.max_records()).enumerate() {
    let record = serde_json::from_value::<RawProjectRecord>(value).map(|record| match kind {
      FeedKind::Wind => RawUpstreamRecord::Wind { index, record },
      FeedKind::Solar => RawUpstreamRecord::Solar { index, record },
    });
    match record {
      Ok(record) => records.push(record),
      Err(e) => debug!(feed = kind.as_str(), index, "Skipping malformed record: {}", e),
    }
  }
  records
}

impl UpstreamFeed for NrelFeed {
  fn name(&self) -> &str {
    self.kind.as_str()
  }

  fn fetch(&self) -> BoxFuture<'_, Result<Vec<RawUpstreamRecord>>> {
    Box::pin(self.fetch_records())
  }
}
