//! Persistent store capability for projects.

use color_eyre::Result;

use crate::project::{Project, ProjectDraft};

/// Trait for project store backends.
///
/// The store is the single source of truth for projects. Writes are keyed by
/// `external_id`: writing a draft whose external id already exists updates
/// that row in place and keeps its `id` and `created_at`.
pub trait ProjectStore: Send + Sync {
  /// Read up to `limit` projects starting at `offset`, newest first.
  fn read_page(&self, offset: usize, limit: usize) -> Result<Vec<Project>>;

  /// Number of stored projects.
  fn count(&self) -> Result<usize>;

  /// Insert or update drafts by external id.
  ///
  /// Returns the stored projects in the same order as `drafts`.
  fn upsert(&self, drafts: &[ProjectDraft]) -> Result<Vec<Project>>;

  /// Remove every project. Returns how many rows were removed.
  fn delete_all(&self) -> Result<usize>;

  /// Atomically replace the whole dataset with `drafts`.
  ///
  /// Readers observe either the previous dataset or the new one, never an
  /// empty or partially written table.
  fn replace_all(&self, drafts: &[ProjectDraft]) -> Result<Vec<Project>>;
}
