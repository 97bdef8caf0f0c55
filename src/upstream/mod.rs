//! Upstream project feeds.
//!
//! Each feed returns typed raw records; normalization into drafts lives with
//! the raw types in `api_types`.

pub mod api_types;
pub mod client;

pub use api_types::RawUpstreamRecord;
pub use client::NrelFeed;

use color_eyre::{eyre::eyre, Result};
use futures::future::{join_all, BoxFuture};
use std::time::Duration;
use tracing::{info, warn};

/// A read-only source of raw project records
pub trait UpstreamFeed: Send + Sync {
  fn name(&self) -> &str;

  fn fetch(&self) -> BoxFuture<'_, Result<Vec<RawUpstreamRecord>>>;
}

/// Pull every feed concurrently.
///
/// A feed that errors or does not answer within `timeout` contributes no
/// records. Records are returned grouped by feed, in feed order.
pub async fn pull_all(feeds: &[Box<dyn UpstreamFeed>], timeout: Duration) -> Vec<RawUpstreamRecord> {
  let pulls = feeds.iter().map(|feed| async move {
    let result = tokio::time::timeout(timeout, feed.fetch())
      .await
      .map_err(|_| eyre!("timed out after {:?}", timeout))
      .and_then(|r| r);
    match result {
      Ok(records) => {
        info!(feed = feed.name(), count = records.len(), "Fetched upstream records");
        records
      }
      Err(e) => {
        warn!(feed = feed.name(), "Upstream feed failed: {}", e);
        Vec::new()
      }
    }
  });

  join_all(pulls).await.into_iter().flatten().collect()
}
