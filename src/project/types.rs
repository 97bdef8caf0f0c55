use chrono::{DateTime, Datelike, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Earliest commission year accepted on ingest.
pub const MIN_COMMISSION_YEAR: i32 = 1900;

/// How far into the future a planned project may be dated.
pub const MAX_YEARS_AHEAD: i32 = 10;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Energy type of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Solar,
  Wind,
  Hydro,
  Biomass,
  Geothermal,
  Other,
}

impl Category {
  pub const ALL: [Category; 6] = [
    Category::Solar,
    Category::Wind,
    Category::Hydro,
    Category::Biomass,
    Category::Geothermal,
    Category::Other,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Category::Solar => "solar",
      Category::Wind => "wind",
      Category::Hydro => "hydro",
      Category::Biomass => "biomass",
      Category::Geothermal => "geothermal",
      Category::Other => "other",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Category::Solar => "Solar",
      Category::Wind => "Wind",
      Category::Hydro => "Hydro",
      Category::Biomass => "Biomass",
      Category::Geothermal => "Geothermal",
      Category::Other => "Other",
    }
  }

  /// Lenient parse of upstream type strings such as "Solar PV" or "Offshore wind".
  /// Anything unrecognised is `Other`.
  pub fn parse_lenient(raw: &str) -> Category {
    let lower = raw.to_lowercase();
    if lower.contains("solar") || lower.contains("pv") {
      Category::Solar
    } else if lower.contains("wind") {
      Category::Wind
    } else if lower.contains("hydro") {
      Category::Hydro
    } else if lower.contains("bio") {
      Category::Biomass
    } else if lower.contains("geo") {
      Category::Geothermal
    } else {
      Category::Other
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for Category {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    Category::ALL
      .into_iter()
      .find(|c| c.as_str() == s)
      .ok_or_else(|| eyre!("Unknown project category: {}", s))
  }
}

/// Lifecycle status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
  Operational,
  UnderConstruction,
  Planned,
}

impl ProjectStatus {
  pub const ALL: [ProjectStatus; 3] = [
    ProjectStatus::Operational,
    ProjectStatus::UnderConstruction,
    ProjectStatus::Planned,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ProjectStatus::Operational => "operational",
      ProjectStatus::UnderConstruction => "under-construction",
      ProjectStatus::Planned => "planned",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ProjectStatus::Operational => "Operational",
      ProjectStatus::UnderConstruction => "Under Construction",
      ProjectStatus::Planned => "Planned",
    }
  }

  /// Lenient parse of display forms ("Under Construction", "under_construction", ...).
  pub fn parse_lenient(raw: &str) -> Option<ProjectStatus> {
    let normalized: String = raw
      .trim()
      .to_lowercase()
      .chars()
      .map(|c| if c == '_' || c == '-' { ' ' } else { c })
      .collect();

    match normalized.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
      "operational" | "operating" | "active" | "online" => Some(ProjectStatus::Operational),
      "under construction" | "construction" | "building" => Some(ProjectStatus::UnderConstruction),
      "planned" | "proposed" | "permitted" => Some(ProjectStatus::Planned),
      _ => None,
    }
  }
}

impl fmt::Display for ProjectStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for ProjectStatus {
  type Err = color_eyre::Report;

  fn from_str(s: &str) -> Result<Self> {
    ProjectStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| eyre!("Unknown project status: {}", s))
  }
}

/// A project as produced by normalization, backfill or seed data, before the
/// store has assigned it an id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
  pub external_id: Option<String>,
  pub name: String,
  pub category: Category,
  pub capacity_mw: f64,
  pub location: String,
  pub status: ProjectStatus,
  pub commission_year: i32,
  pub developer: String,
  pub latitude: Option<f64>,
  pub longitude: Option<f64>,
}

impl ProjectDraft {
  /// Reject records that would break store invariants.
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(eyre!("Project name must not be empty"));
    }
    if !is_valid_capacity(self.capacity_mw) {
      return Err(eyre!(
        "Invalid capacity for {}: {}",
        self.name,
        self.capacity_mw
      ));
    }
    if !is_valid_year(self.commission_year) {
      return Err(eyre!(
        "Commission year out of range for {}: {}",
        self.name,
        self.commission_year
      ));
    }
    Ok(())
  }
}

/// A persisted project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub external_id: Option<String>,
  pub name: String,
  pub category: Category,
  #[serde(rename = "capacityMW")]
  pub capacity_mw: f64,
  pub location: String,
  pub status: ProjectStatus,
  pub commission_year: i32,
  pub developer: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub latitude: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub longitude: Option<f64>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub fn is_valid_capacity(capacity_mw: f64) -> bool {
  capacity_mw.is_finite() && capacity_mw >= 0.0
}

pub fn is_valid_year(year: i32) -> bool {
  (MIN_COMMISSION_YEAR..=current_year() + MAX_YEARS_AHEAD).contains(&year)
}

pub fn current_year() -> i32 {
  Utc::now().year()
}

/// Request for one page of projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
  pub page: u32,
  pub limit: u32,
  pub refresh: bool,
}

impl Default for PageRequest {
  fn default() -> Self {
    Self {
      page: 1,
      limit: DEFAULT_PAGE_SIZE,
      refresh: false,
    }
  }
}

impl PageRequest {
  pub fn new(page: u32, limit: u32, refresh: bool) -> Self {
    Self {
      page,
      limit,
      refresh,
    }
    .normalized()
  }

  /// Build a request from an arbitrary JSON body.
  ///
  /// Missing or malformed fields take their defaults instead of failing.
  pub fn from_json(value: &serde_json::Value) -> Self {
    let defaults = Self::default();
    let page = value
      .get("page")
      .and_then(|v| v.as_i64())
      .map(|p| p.clamp(1, u32::MAX as i64) as u32)
      .unwrap_or(defaults.page);
    let limit = value
      .get("limit")
      .and_then(|v| v.as_i64())
      .map(|l| l.clamp(1, MAX_PAGE_SIZE as i64) as u32)
      .unwrap_or(defaults.limit);
    let refresh = value
      .get("refresh")
      .and_then(|v| v.as_bool())
      .unwrap_or(defaults.refresh);

    Self {
      page,
      limit,
      refresh,
    }
  }

  /// Clamp page to >= 1 and limit to 1..=MAX_PAGE_SIZE
  pub fn normalized(self) -> Self {
    Self {
      page: self.page.max(1),
      limit: self.limit.clamp(1, MAX_PAGE_SIZE),
      refresh: self.refresh,
    }
  }

  pub fn offset(&self) -> usize {
    (self.page.saturating_sub(1) as usize) * self.limit as usize
  }
}

/// One page of projects plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
  pub projects: Vec<Project>,
  pub page: u32,
  pub has_more: bool,
  #[serde(default)]
  pub total: u64,
}

/// Error body returned at the invocation boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
  pub error: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub details: Option<String>,
}
