//! Paginated project list with load-more and refresh.
//!
//! The provider owns one growing, deduplicated sequence of projects. Requests
//! run on spawned tasks and report back over a channel; call `poll()` from the
//! event loop tick to apply finished requests.
//!
//! Every request is tagged with a generation. Starting a refresh bumps the
//! generation and aborts whatever was in flight, so a late answer to an older
//! request can never be spliced into the fresh sequence.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::source::ProjectSource;
use crate::project::{PageRequest, PageResponse, Project};

/// Read-only view of the provider state
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderState {
  pub projects: Vec<Project>,
  /// Last page successfully loaded, 0 before the first load
  pub page: u32,
  pub loading: bool,
  pub error: Option<String>,
  pub has_more: bool,
  /// Reported dataset size, or the loaded count when none was reported
  pub total: u64,
}

impl Default for ProviderState {
  fn default() -> Self {
    Self {
      projects: Vec::new(),
      page: 0,
      loading: false,
      error: None,
      has_more: true,
      total: 0,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
  /// Replace the sequence with page 1
  Reset,
  /// Append the next page
  Append,
}

#[derive(Debug)]
struct Completion {
  generation: u64,
  kind: RequestKind,
  result: Result<PageResponse, String>,
}

pub struct ProjectDataProvider {
  source: Arc<dyn ProjectSource>,
  page_size: u32,
  state: ProviderState,
  seen: HashSet<String>,
  generation: u64,
  initialized: bool,
  tx: mpsc::UnboundedSender<Completion>,
  rx: mpsc::UnboundedReceiver<Completion>,
  task: Option<JoinHandle<()>>,
}

impl ProjectDataProvider {
  pub fn new(source: Arc<dyn ProjectSource>, page_size: u32) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      source,
      page_size: PageRequest::new(1, page_size, false).limit,
      state: ProviderState::default(),
      seen: HashSet::new(),
      generation: 0,
      initialized: false,
      tx,
      rx,
      task: None,
    }
  }

  pub fn snapshot(&self) -> &ProviderState {
    &self.state
  }

  /// Load the first page. Only the first call has an effect.
  pub fn initialize(&mut self) {
    if self.initialized {
      return;
    }
    self.initialized = true;
    self.start(PageRequest::new(1, self.page_size, false), RequestKind::Reset);
  }

  /// Request the next page.
  ///
  /// This is a no-op while a request is in flight or once the source has
  /// reported there is nothing more.
  pub fn load_more(&mut self) {
    if self.state.loading || !self.state.has_more {
      return;
    }
    self.initialized = true;
    let next = self.state.page + 1;
    self.start(PageRequest::new(next, self.page_size, false), RequestKind::Append);
  }

  /// Reload from page 1, forcing the source to refresh its data.
  ///
  /// Supersedes anything in flight. The current sequence stays visible until
  /// the fresh page replaces it in one step.
  pub fn refresh(&mut self) {
    self.initialized = true;
    self.start(PageRequest::new(1, self.page_size, true), RequestKind::Reset);
  }

  /// Apply finished requests.
  ///
  /// Returns `true` if the state changed. Call this in the event loop tick.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;
    while let Ok(completion) = self.rx.try_recv() {
      if completion.generation != self.generation {
        debug!(
          stale = completion.generation,
          current = self.generation,
          "Discarding stale page response"
        );
        continue;
      }
      self.apply(completion);
      changed = true;
    }
    changed
  }

  fn start(&mut self, request: PageRequest, kind: RequestKind) {
    if let Some(task) = self.task.take() {
      task.abort();
    }

    self.generation += 1;
    self.state.loading = true;
    self.state.error = None;

    let generation = self.generation;
    let tx = self.tx.clone();
    let future = self.source.fetch_page(request);
    debug!(generation, page = request.page, refresh = request.refresh, "Requesting projects");

    self.task = Some(tokio::spawn(async move {
      let result = future.await.map_err(|e| e.to_string());
      // Receiver is gone once the provider is dropped
      let _ = tx.send(Completion {
        generation,
        kind,
        result,
      });
    }));
  }

  fn apply(&mut self, completion: Completion) {
    self.task = None;
    self.state.loading = false;

    let response = match completion.result {
      Ok(response) => response,
      Err(error) => {
        self.state.error = Some(error);
        return;
      }
    };

    if completion.kind == RequestKind::Reset {
      self.state.projects.clear();
      self.seen.clear();
    }
    for project in response.projects {
      if self.seen.insert(project.id.clone()) {
        self.state.projects.push(project);
      }
    }

    self.state.page = response.page;
    self.state.has_more = response.has_more;
    self.state.error = None;
    self.state.total = if response.total > 0 {
      response.total
    } else {
      self.state.projects.len() as u64
    };
  }
}

impl Drop for ProjectDataProvider {
  fn drop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}
