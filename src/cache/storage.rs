//! SQLite implementation of the project store.

use chrono::{DateTime, SecondsFormat, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::traits::ProjectStore;
use crate::project::{Category, Project, ProjectDraft, ProjectStatus};

/// Schema for the project table.
const PROJECT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    external_id TEXT UNIQUE,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    capacity_mw REAL NOT NULL CHECK (capacity_mw >= 0),
    location TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('operational', 'under-construction', 'planned')),
    commission_year INTEGER NOT NULL,
    developer TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    -- index within the batch that last wrote this row; breaks created_at ties
    position INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_projects_created
    ON projects(created_at DESC, position ASC);
"#;

const PROJECT_COLUMNS: &str = "id, external_id, name, category, capacity_mw, location, status, \
   commission_year, developer, latitude, longitude, created_at, updated_at";

const UPSERT_PROJECT: &str = r#"
INSERT INTO projects (id, external_id, name, category, capacity_mw, location, status,
                      commission_year, developer, latitude, longitude, position,
                      created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
ON CONFLICT(external_id) DO UPDATE SET
    name = excluded.name,
    category = excluded.category,
    capacity_mw = excluded.capacity_mw,
    location = excluded.location,
    status = excluded.status,
    commission_year = excluded.commission_year,
    developer = excluded.developer,
    latitude = excluded.latitude,
    longitude = excluded.longitude,
    position = excluded.position,
    updated_at = excluded.updated_at
RETURNING id, created_at, updated_at
"#;

/// SQLite-backed project store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open (or create) the store at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open project database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open a private in-memory store.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory database: {}", e))?;
    Self::from_connection(conn)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("renewdash").join("projects.db"))
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(PROJECT_SCHEMA)
      .map_err(|e| eyre!("Failed to create project schema: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl ProjectStore for SqliteStore {
  fn read_page(&self, offset: usize, limit: usize) -> Result<Vec<Project>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare_cached(&format!(
        "SELECT {} FROM projects
         ORDER BY created_at DESC, position ASC
         LIMIT ?1 OFFSET ?2",
        PROJECT_COLUMNS
      ))
      .map_err(|e| eyre!("Failed to prepare page query: {}", e))?;

    let projects = stmt
      .query_map(params![limit as i64, offset as i64], project_from_row)
      .map_err(|e| eyre!("Failed to query projects: {}", e))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| eyre!("Failed to read project row: {}", e))?;

    Ok(projects)
  }

  fn count(&self) -> Result<usize> {
    let conn = self.lock()?;
    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))
      .map_err(|e| eyre!("Failed to count projects: {}", e))?;
    Ok(count as usize)
  }

  fn upsert(&self, drafts: &[ProjectDraft]) -> Result<Vec<Project>> {
    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    let stored = write_drafts(&tx, drafts)?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    debug!(count = stored.len(), "upserted projects");
    Ok(stored)
  }

  fn delete_all(&self) -> Result<usize> {
    let conn = self.lock()?;
    let removed = conn
      .execute("DELETE FROM projects", [])
      .map_err(|e| eyre!("Failed to delete projects: {}", e))?;
    Ok(removed)
  }

  fn replace_all(&self, drafts: &[ProjectDraft]) -> Result<Vec<Project>> {
    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    let removed = tx
      .execute("DELETE FROM projects", [])
      .map_err(|e| eyre!("Failed to clear projects: {}", e))?;
    let stored = write_drafts(&tx, drafts)?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    debug!(removed, inserted = stored.len(), "replaced project dataset");
    Ok(stored)
  }
}

/// Upsert every draft inside the caller's transaction, all stamped with the same time.
fn write_drafts(conn: &Connection, drafts: &[ProjectDraft]) -> Result<Vec<Project>> {
  let now = Utc::now();
  let now_str = format_timestamp(now);

  let mut stmt = conn
    .prepare_cached(UPSERT_PROJECT)
    .map_err(|e| eyre!("Failed to prepare upsert: {}", e))?;

  let mut stored = Vec::with_capacity(drafts.len());
  for (position, draft) in drafts.iter().enumerate() {
    draft.validate()?;

    let (id, created_at, updated_at): (String, String, String) = stmt
      .query_row(
        params![
          Uuid::new_v4().to_string(),
          draft.external_id,
          draft.name,
          draft.category.as_str(),
          draft.capacity_mw,
          draft.location,
          draft.status.as_str(),
          draft.commission_year,
          draft.developer,
          draft.latitude,
          draft.longitude,
          position as i64,
          now_str,
        ],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
      )
      .map_err(|e| eyre!("Failed to store project {}: {}", draft.name, e))?;

    stored.push(Project {
      id,
      external_id: draft.external_id.clone(),
      name: draft.name.clone(),
      category: draft.category,
      capacity_mw: draft.capacity_mw,
      location: draft.location.clone(),
      status: draft.status,
      commission_year: draft.commission_year,
      developer: draft.developer.clone(),
      latitude: draft.latitude,
      longitude: draft.longitude,
      created_at: parse_timestamp(&created_at)?,
      updated_at: parse_timestamp(&updated_at)?,
    });
  }

  Ok(stored)
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
  let category: String = row.get(3)?;
  let status: String = row.get(6)?;
  let created_at: String = row.get(11)?;
  let updated_at: String = row.get(12)?;

  Ok(Project {
    id: row.get(0)?,
    external_id: row.get(1)?,
    name: row.get(2)?,
    category: category
      .parse::<Category>()
      .map_err(|e| conversion_error(3, e))?,
    capacity_mw: row.get(4)?,
    location: row.get(5)?,
    status: status
      .parse::<ProjectStatus>()
      .map_err(|e| conversion_error(6, e))?,
    commission_year: row.get(7)?,
    developer: row.get(8)?,
    latitude: row.get(9)?,
    longitude: row.get(10)?,
    created_at: parse_timestamp(&created_at).map_err(|e| conversion_error(11, e))?,
    updated_at: parse_timestamp(&updated_at).map_err(|e| conversion_error(12, e))?,
  })
}

fn conversion_error(column: usize, err: color_eyre::Report) -> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(column, Type::Text, err.to_string().into())
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(ts: DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| eyre!("Failed to parse timestamp '{}': {}", s, e))
}
