//! Cache-or-fetch page service.
//!
//! Pages are served from the store when it has rows for the requested range.
//! Otherwise, or when a refresh is forced, every upstream feed is pulled, the
//! result is topped up with synthetic projects and persisted, and the page is
//! cut from the freshly written set.

use color_eyre::{eyre::eyre, Result};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::info;

use super::backfill::ProjectGenerator;
use crate::cache::ProjectStore;
use crate::config::Config;
use crate::project::{seed::seed_projects, PageRequest, PageResponse, Project, ProjectDraft};
use crate::upstream::{pull_all, UpstreamFeed};

#[derive(Debug, Clone)]
pub struct SyncOptions {
  /// Top up pulls with synthetic projects
  pub backfill: bool,
  /// Dataset size backfill aims for
  pub min_projects: usize,
  /// Seed for synthetic values, random when unset
  pub seed: Option<u64>,
  /// Per-feed timeout
  pub feed_timeout: Duration,
}

impl Default for SyncOptions {
  fn default() -> Self {
    Self {
      backfill: true,
      min_projects: 50,
      seed: None,
      feed_timeout: Duration::from_secs(8),
    }
  }
}

impl SyncOptions {
  pub fn from_config(config: &Config) -> Self {
    Self {
      backfill: config.backfill.enabled,
      min_projects: config.backfill.min_projects,
      seed: config.backfill.seed,
      feed_timeout: config.upstream.timeout(),
    }
  }
}

pub struct ProjectSyncService<S: ProjectStore> {
  store: S,
  feeds: Vec<Box<dyn UpstreamFeed>>,
  options: SyncOptions,
  generator: Mutex<ProjectGenerator>,
  /// Held while the dataset is being regenerated
  populate: tokio::sync::Mutex<()>,
}

impl<S: ProjectStore> ProjectSyncService<S> {
  pub fn new(store: S, feeds: Vec<Box<dyn UpstreamFeed>>, options: SyncOptions) -> Self {
    let generator = ProjectGenerator::new(options.seed);
    Self {
      store,
      feeds,
      options,
      generator: Mutex::new(generator),
      populate: tokio::sync::Mutex::new(()),
    }
  }

  #[cfg(test)]
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Return one page of projects, populating the store first if needed.
  pub async fn fetch_page(&self, request: PageRequest) -> Result<PageResponse> {
    let request = request.normalized();

    if !request.refresh {
      if let Some(page) = self.read_cached(&request)? {
        return Ok(page);
      }
    }

    let _populating = self.populate.lock().await;

    // Another request may have filled the store while we waited
    if !request.refresh {
      if let Some(page) = self.read_cached(&request)? {
        return Ok(page);
      }
      info!(page = request.page, "Cache miss, pulling upstream");
    } else {
      info!("Refresh requested, pulling upstream");
    }

    let stored = self.regenerate(request.refresh).await?;
    Ok(slice_page(stored, &request))
  }

  /// Write the built-in demo projects. Returns how many were written.
  pub fn load_seed_data(&self) -> Result<usize> {
    let stored = self.store.upsert(&seed_projects())?;
    info!(count = stored.len(), "Seed projects stored");
    Ok(stored.len())
  }

  fn read_cached(&self, request: &PageRequest) -> Result<Option<PageResponse>> {
    let limit = request.limit as usize;
    let projects = self.store.read_page(request.offset(), limit)?;
    if projects.is_empty() {
      return Ok(None);
    }

    let total = self.store.count()?;
    info!(
      page = request.page,
      count = projects.len(),
      "Returning cached projects"
    );
    Ok(Some(PageResponse {
      has_more: projects.len() == limit,
      projects,
      page: request.page,
      total: total as u64,
    }))
  }

  async fn regenerate(&self, replace: bool) -> Result<Vec<Project>> {
    let raw = pull_all(&self.feeds, self.options.feed_timeout).await;
    let pulled = raw.len();

    let drafts = {
      let mut generator = self.lock_generator()?;
      let mut drafts: Vec<ProjectDraft> = raw
        .into_iter()
        .map(|record| record.into_draft(generator.rng()))
        .collect();
      dedupe_by_external_id(&mut drafts);

      if self.options.backfill {
        let added = generator.backfill(&mut drafts, self.options.min_projects);
        if added > 0 {
          info!(pulled, added, "Backfilled synthetic projects");
        }
      }
      drafts
    };

    let stored = if replace {
      self.store.replace_all(&drafts)?
    } else {
      self.store.upsert(&drafts)?
    };
    info!(count = stored.len(), replace, "Projects stored");
    Ok(stored)
  }

  fn lock_generator(&self) -> Result<MutexGuard<'_, ProjectGenerator>> {
    self
      .generator
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

/// Keep the first draft for each external id.
fn dedupe_by_external_id(drafts: &mut Vec<ProjectDraft>) {
  let mut seen = HashSet::new();
  drafts.retain(|draft| match &draft.external_id {
    Some(id) => seen.insert(id.clone()),
    None => true,
  });
}

fn slice_page(all: Vec<Project>, request: &PageRequest) -> PageResponse {
  let total = all.len();
  let start = request.offset().min(total);
  let end = (start + request.limit as usize).min(total);
  PageResponse {
    projects: all[start..end].to_vec(),
    page: request.page,
    has_more: end < total,
    total: total as u64,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::SqliteStore;
  use crate::upstream::api_types::RawProjectRecord;
  use crate::upstream::RawUpstreamRecord;
  use futures::future::BoxFuture;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::sync::Arc;

  struct StubFeed {
    name: &'static str,
    records: usize,
    fail: bool,
    delay: Duration,
    calls: Arc<AtomicUsize>,
  }

  impl UpstreamFeed for StubFeed {
    fn name(&self) -> &str {
      self.name
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Vec<RawUpstreamRecord>>> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Box::pin(async move {
        tokio::time::sleep(self.delay).await;
        if self.fail {
          return Err(eyre!("feed unavailable"));
        }
        Ok(
          (0..self.records)
            .map(|index| RawUpstreamRecord::Wind {
              index,
              record: RawProjectRecord {
                id: Some(format!("w{}", index)),
                name: Some(format!("Upstream Wind {}", index)),
                capacity: Some(100.0 + index as f64),
                ..Default::default()
              },
            })
            .collect(),
        )
      })
    }
  }

  fn feeds(wind_records: usize, calls: &Arc<AtomicUsize>) -> Vec<Box<dyn UpstreamFeed>> {
    vec![
      Box::new(StubFeed {
        name: "wind",
        records: wind_records,
        fail: false,
        delay: Duration::from_millis(20),
        calls: calls.clone(),
      }),
      Box::new(StubFeed {
        name: "solar",
        records: 0,
        fail: true,
        delay: Duration::ZERO,
        calls: calls.clone(),
      }),
    ]
  }

  fn service(wind_records: usize) -> (ProjectSyncService<SqliteStore>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let options = SyncOptions {
      seed: Some(7),
      ..Default::default()
    };
    let service = ProjectSyncService::new(
      SqliteStore::open_in_memory().unwrap(),
      feeds(wind_records, &calls),
      options,
    );
    (service, calls)
  }

  fn draft(n: usize) -> ProjectDraft {
    let mut generator = ProjectGenerator::new(Some(n as u64));
    let mut draft = generator.generate(n);
    draft.external_id = Some(format!("cached_{}", n));
    draft
  }

  #[tokio::test]
  async fn test_cold_cache_pulls_and_backfills() {
    let (service, calls) = service(10);

    let page = service
      .fetch_page(PageRequest::new(1, 20, false))
      .await
      .unwrap();

    assert_eq!(page.projects.len(), 20);
    assert!(page.has_more);
    assert_eq!(page.total, 50);
    assert_eq!(page.page, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(service.store().count().unwrap(), 50);

    // Upstream records come first, in feed order
    assert_eq!(page.projects[0].external_id.as_deref(), Some("wind_w0"));
    assert_eq!(page.projects[9].external_id.as_deref(), Some("wind_w9"));
    assert_eq!(page.projects[10].external_id.as_deref(), Some("gen_10"));
  }

  #[tokio::test]
  async fn test_cache_hit_does_not_touch_upstream() {
    let (service, calls) = service(10);
    let drafts: Vec<_> = (0..65).map(draft).collect();
    service.store().upsert(&drafts).unwrap();

    let page = service
      .fetch_page(PageRequest::new(4, 20, false))
      .await
      .unwrap();

    assert_eq!(page.projects.len(), 5);
    assert!(!page.has_more);
    assert_eq!(page.total, 65);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_cached_pages_match_generating_slice() {
    let (service, _) = service(10);
    let first = service
      .fetch_page(PageRequest::new(2, 20, false))
      .await
      .unwrap();
    let again = service
      .fetch_page(PageRequest::new(2, 20, false))
      .await
      .unwrap();
    assert_eq!(first.projects, again.projects);
  }

  #[tokio::test]
  async fn test_refresh_replaces_dataset() {
    let (service, calls) = service(10);
    let drafts: Vec<_> = (0..65).map(draft).collect();
    service.store().upsert(&drafts).unwrap();

    let page = service
      .fetch_page(PageRequest::new(1, 20, true))
      .await
      .unwrap();

    assert_eq!(page.total, 50);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(service.store().count().unwrap(), 50);
    let all = service.store().read_page(0, 100).unwrap();
    assert!(all
      .iter()
      .all(|p| !p.external_id.as_deref().unwrap_or("").starts_with("cached_")));
  }

  #[tokio::test]
  async fn test_repeated_sync_has_no_duplicates() {
    let (service, _) = service(10);
    service
      .fetch_page(PageRequest::new(1, 20, true))
      .await
      .unwrap();
    service
      .fetch_page(PageRequest::new(1, 20, true))
      .await
      .unwrap();
    // A page past the end pulls again without a refresh and upserts
    service
      .fetch_page(PageRequest::new(9, 20, false))
      .await
      .unwrap();

    let all = service.store().read_page(0, 1000).unwrap();
    let ids: HashSet<_> = all.iter().map(|p| p.external_id.clone()).collect();
    assert_eq!(all.len(), 50);
    assert_eq!(ids.len(), 50);
  }

  #[tokio::test]
  async fn test_page_past_end_is_empty() {
    let (service, _) = service(10);
    let page = service
      .fetch_page(PageRequest::new(9, 20, false))
      .await
      .unwrap();
    assert!(page.projects.is_empty());
    assert!(!page.has_more);
    assert_eq!(page.total, 50);
  }

  #[tokio::test]
  async fn test_concurrent_cold_requests_pull_once() {
    let (service, calls) = service(10);
    let service = Arc::new(service);

    let a = {
      let service = service.clone();
      tokio::spawn(async move { service.fetch_page(PageRequest::new(1, 20, false)).await })
    };
    let b = {
      let service = service.clone();
      tokio::spawn(async move { service.fetch_page(PageRequest::new(1, 20, false)).await })
    };

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();
    assert_eq!(a.projects, b.projects);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_concurrent_refreshes_are_serialized() {
    let (service, calls) = service(10);
    let service = Arc::new(service);
    let drafts: Vec<_> = (0..65).map(draft).collect();
    service.store().upsert(&drafts).unwrap();

    // Readers must never see the store between delete and insert
    let done = Arc::new(AtomicBool::new(false));
    let reader = {
      let service = service.clone();
      let done = done.clone();
      tokio::spawn(async move {
        let mut reads = 0;
        while !done.load(Ordering::SeqCst) {
          let page = service.store().read_page(0, 20).unwrap();
          assert!(!page.is_empty(), "store read empty during refresh");
          reads += 1;
          tokio::time::sleep(Duration::from_millis(1)).await;
        }
        reads
      })
    };

    let refresh = || {
      let service = service.clone();
      tokio::spawn(async move { service.fetch_page(PageRequest::new(1, 20, true)).await })
    };
    let (a, b) = (refresh(), refresh());
    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();
    done.store(true, Ordering::SeqCst);
    assert!(reader.await.unwrap() > 0);

    assert_eq!(a.total, 50);
    assert_eq!(b.total, 50);
    // Each refresh pulls both feeds, one after the other
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    let all = service.store().read_page(0, 1000).unwrap();
    let ids: HashSet<_> = all.iter().map(|p| p.external_id.clone()).collect();
    assert_eq!(all.len(), 50);
    assert_eq!(ids.len(), 50);
    assert!(all
      .iter()
      .all(|p| !p.external_id.as_deref().unwrap_or("").starts_with("cached_")));
  }

  #[tokio::test]
  async fn test_backfill_disabled() {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = ProjectSyncService::new(
      SqliteStore::open_in_memory().unwrap(),
      feeds(10, &calls),
      SyncOptions {
        backfill: false,
        ..Default::default()
      },
    );

    let page = service
      .fetch_page(PageRequest::new(1, 20, false))
      .await
      .unwrap();
    assert_eq!(page.total, 10);
    assert_eq!(page.projects.len(), 10);
    assert!(!page.has_more);
  }

  #[tokio::test]
  async fn test_all_feeds_failing_and_no_backfill_is_empty() {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = ProjectSyncService::new(
      SqliteStore::open_in_memory().unwrap(),
      feeds(0, &calls),
      SyncOptions {
        backfill: false,
        ..Default::default()
      },
    );

    let page = service.fetch_page(PageRequest::default()).await.unwrap();
    assert!(page.projects.is_empty());
    assert_eq!(page.total, 0);
  }

  #[test]
  fn test_dedupe_keeps_first() {
    let mut a = draft(1);
    a.external_id = Some("x".to_string());
    a.name = "first".to_string();
    let mut b = draft(2);
    b.external_id = Some("x".to_string());
    b.name = "second".to_string();
    let mut drafts = vec![a, b, draft(3)];

    dedupe_by_external_id(&mut drafts);
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].name, "first");
  }

  #[test]
  fn test_seed_data_is_idempotent() {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = ProjectSyncService::new(
      SqliteStore::open_in_memory().unwrap(),
      feeds(0, &calls),
      SyncOptions::default(),
    );
    let written = service.load_seed_data().unwrap();
    service.load_seed_data().unwrap();
    assert_eq!(service.store().count().unwrap(), written);
  }
}
