use crate::project::DEFAULT_PAGE_SIZE;
use crate::theme::ChartColor;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Custom title for header
  pub title: Option<String>,
  /// Projects requested per page
  pub page_size: u32,
  /// Database path override (defaults to the platform data directory)
  pub database: Option<PathBuf>,
  pub server: ServerConfig,
  pub upstream: UpstreamConfig,
  pub backfill: BackfillConfig,
  pub chart: ChartConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      title: None,
      page_size: DEFAULT_PAGE_SIZE,
      database: None,
      server: ServerConfig::default(),
      upstream: UpstreamConfig::default(),
      backfill: BackfillConfig::default(),
      chart: ChartConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub addr: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      addr: "127.0.0.1:8787".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
  pub wind_url: String,
  pub solar_url: String,
  /// Per-feed timeout in seconds
  pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self {
      wind_url: "https://developer.nrel.gov/api/wind/windexchange_web/api/projects".to_string(),
      solar_url: "https://developer.nrel.gov/api/solar/projects/v1.json".to_string(),
      timeout_secs: 8,
    }
  }
}

impl UpstreamConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs.max(1))
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
  pub enabled: bool,
  /// Minimum dataset size after a pull
  pub min_projects: usize,
  /// Fixed seed for reproducible synthetic projects
  pub seed: Option<u64>,
}

impl Default for BackfillConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      min_projects: 50,
      seed: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
  pub id: String,
  /// Theme name to selector prefix
  pub themes: BTreeMap<String, String>,
  /// Series key to color
  pub colors: BTreeMap<String, ChartColor>,
}

impl Default for ChartConfig {
  fn default() -> Self {
    Self {
      id: "capacity".to_string(),
      themes: BTreeMap::from([
        ("light".to_string(), String::new()),
        ("dark".to_string(), ".dark".to_string()),
      ]),
      colors: BTreeMap::from([
        ("solar".to_string(), ChartColor::solid("#f59e0b")),
        ("wind".to_string(), ChartColor::solid("#0ea5e9")),
        ("hydro".to_string(), ChartColor::solid("#3b82f6")),
        ("geothermal".to_string(), ChartColor::solid("#ef4444")),
        ("biomass".to_string(), ChartColor::solid("#22c55e")),
      ]),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./renewdash.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/renewdash/config.yaml
  ///
  /// Defaults are used when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("renewdash.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("renewdash").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    // An empty document deserializes to null
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    let mut config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;
    config.page_size = config.page_size.clamp(1, crate::project::MAX_PAGE_SIZE);
    Ok(config)
  }

  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or("Renewable Projects")
  }

  /// Get the upstream API key from environment variables.
  ///
  /// Checks RENEWDASH_NREL_API_KEY first, then NREL_API_KEY as fallback.
  pub fn get_api_key() -> Option<String> {
    std::env::var("RENEWDASH_NREL_API_KEY")
      .or_else(|_| std::env::var("NREL_API_KEY"))
      .ok()
      .filter(|key| !key.trim().is_empty())
  }
}
