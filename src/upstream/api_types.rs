//! Serde-deserializable types matching upstream feed responses.
//!
//! These are kept separate from the domain types: each feed gets a narrow raw
//! record and an explicit conversion into a `ProjectDraft`, which fills any
//! missing or implausible field with a synthetic default.

use rand::Rng;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::project::{
  current_year, is_valid_capacity, is_valid_year, Category, ProjectDraft, ProjectStatus,
};

// ============================================================================
// Response envelope
// ============================================================================

/// Top-level feed response. Records stay untyped here so that one malformed
/// entry does not discard the whole feed.
#[derive(Debug, Deserialize, Default)]
pub struct ApiFeedResponse {
  #[serde(default)]
  pub result: Vec<Value>,
}

// ============================================================================
// Raw records
// ============================================================================

/// One entry of either feed. The solar feed names some fields differently,
/// hence the aliases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProjectRecord {
  #[serde(default, deserialize_with = "lenient_string")]
  pub id: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub name: Option<String>,
  /// Technology string such as "Solar PV" or "Offshore wind"
  #[serde(
    default,
    rename = "type",
    alias = "technology",
    alias = "project_type",
    deserialize_with = "lenient_string"
  )]
  pub technology: Option<String>,
  #[serde(default, alias = "system_capacity", deserialize_with = "lenient_f64")]
  pub capacity: Option<f64>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub state: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub status: Option<String>,
  #[serde(default, deserialize_with = "lenient_i32")]
  pub year: Option<i32>,
  #[serde(default, deserialize_with = "lenient_string")]
  pub developer: Option<String>,
  #[serde(default, alias = "lat", deserialize_with = "lenient_f64")]
  pub latitude: Option<f64>,
  #[serde(default, alias = "lon", deserialize_with = "lenient_f64")]
  pub longitude: Option<f64>,
}

/// A raw record tagged with the feed it came from and its position in that feed.
#[derive(Debug, Clone)]
pub enum RawUpstreamRecord {
  Wind { index: usize, record: RawProjectRecord },
  Solar { index: usize, record: RawProjectRecord },
}

// ============================================================================
// Conversions to domain types
// ============================================================================

/// Per-feed fallbacks for missing or implausible fields
struct FeedDefaults {
  id_prefix: &'static str,
  name_prefix: &'static str,
  category: Category,
  developer: &'static str,
  /// Latitude box as (min, span)
  latitude: (f64, f64),
  /// Longitude box as (min, span)
  longitude: (f64, f64),
}

const WIND_DEFAULTS: FeedDefaults = FeedDefaults {
  id_prefix: "wind",
  name_prefix: "Wind Project",
  category: Category::Wind,
  developer: "Wind Energy Corp",
  latitude: (40.0, 10.0),
  longitude: (-105.0, 10.0),
};

const SOLAR_DEFAULTS: FeedDefaults = FeedDefaults {
  id_prefix: "solar",
  name_prefix: "Solar Project",
  category: Category::Solar,
  developer: "SolarTech Solutions",
  latitude: (32.0, 15.0),
  longitude: (-125.0, 30.0),
};

impl RawUpstreamRecord {
  pub fn into_draft<R: Rng + ?Sized>(self, rng: &mut R) -> ProjectDraft {
    match self {
      RawUpstreamRecord::Wind { index, record } => record.into_draft(&WIND_DEFAULTS, index, rng),
      RawUpstreamRecord::Solar { index, record } => record.into_draft(&SOLAR_DEFAULTS, index, rng),
    }
  }
}

impl RawProjectRecord {
  fn into_draft<R: Rng + ?Sized>(
    self,
    defaults: &FeedDefaults,
    index: usize,
    rng: &mut R,
  ) -> ProjectDraft {
    let (lat_min, lat_span) = defaults.latitude;
    let (lon_min, lon_span) = defaults.longitude;

    ProjectDraft {
      external_id: Some(format!(
        "{}_{}",
        defaults.id_prefix,
        self.id.unwrap_or_else(|| index.to_string())
      )),
      name: non_empty(self.name)
        .unwrap_or_else(|| format!("{} {}", defaults.name_prefix, index + 1)),
      category: resolve_category(self.technology.as_deref(), defaults.category),
      capacity_mw: self
        .capacity
        .filter(|c| is_valid_capacity(*c))
        .unwrap_or_else(|| rng.gen_range(50..550) as f64),
      location: format!(
        "{}, USA",
        non_empty(self.state).unwrap_or_else(|| "Unknown".to_string())
      ),
      status: self
        .status
        .as_deref()
        .and_then(ProjectStatus::parse_lenient)
        .unwrap_or(ProjectStatus::Operational),
      commission_year: self
        .year
        .filter(|y| is_valid_year(*y))
        .unwrap_or_else(|| current_year() - rng.gen_range(0..5)),
      developer: non_empty(self.developer).unwrap_or_else(|| defaults.developer.to_string()),
      latitude: Some(
        self
          .latitude
          .filter(|lat| is_valid_latitude(*lat))
          .unwrap_or_else(|| lat_min + rng.gen::<f64>() * lat_span),
      ),
      longitude: Some(
        self
          .longitude
          .filter(|lon| is_valid_longitude(*lon))
          .unwrap_or_else(|| lon_min + rng.gen::<f64>() * lon_span),
      ),
    }
  }
}

/// A recognised technology string wins; otherwise the feed's own category.
fn resolve_category(technology: Option<&str>, feed: Category) -> Category {
  match technology.map(Category::parse_lenient) {
    Some(Category::Other) | None => feed,
    Some(category) => category,
  }
}

// ============================================================================
// Helpers
// ============================================================================

fn non_empty(value: Option<String>) -> Option<String> {
  value
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
}

fn is_valid_latitude(lat: f64) -> bool {
  lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

fn is_valid_longitude(lon: f64) -> bool {
  lon.is_finite() && (-180.0..=180.0).contains(&lon)
}

/// Accept strings and numbers, treat anything else as missing.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value: Option<Value> = Option::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::String(s)) => Some(s),
    Some(Value::Number(n)) => Some(n.to_string()),
    _ => None,
  })
}

/// Accept numbers and numeric strings ("120.5", " 80 "), treat anything else as missing.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value: Option<Value> = Option::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::Number(n)) => n.as_f64(),
    Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
    _ => None,
  })
}

fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(lenient_f64(deserializer)?.and_then(|f| {
    if f.is_finite() && f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
      Some(f as i32)
    } else {
      None
    }
  }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;
  use serde_json::json;

  #[test]
  fn test_wind_record_with_all_fields() {
    let record: RawProjectRecord = serde_json::from_value(json!({
      "id": 42,
      "name": "Prairie Wind Project",
      "capacity": "400",
      "state": "Kansas",
      "status": "Under Construction",
      "year": 2022,
      "developer": "Prairie Power Co",
      "latitude": 38.5,
      "longitude": -98.0
    }))
    .unwrap();

    let mut rng = StdRng::seed_from_u64(1);
    let draft = RawUpstreamRecord::Wind { index: 0, record }.into_draft(&mut rng);

    assert_eq!(draft.external_id.as_deref(), Some("wind_42"));
    assert_eq!(draft.name, "Prairie Wind Project");
    assert_eq!(draft.category, Category::Wind);
    assert_eq!(draft.capacity_mw, 400.0);
    assert_eq!(draft.location, "Kansas, USA");
    assert_eq!(draft.status, ProjectStatus::UnderConstruction);
    assert_eq!(draft.commission_year, 2022);
    assert_eq!(draft.developer, "Prairie Power Co");
    assert_eq!(draft.latitude, Some(38.5));
    assert_eq!(draft.longitude, Some(-98.0));
    draft.validate().unwrap();
  }

  #[test]
  fn test_wind_record_defaults_for_missing_fields() {
    let record: RawProjectRecord = serde_json::from_value(json!({})).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let draft = RawUpstreamRecord::Wind { index: 4, record }.into_draft(&mut rng);

    assert_eq!(draft.external_id.as_deref(), Some("wind_4"));
    assert_eq!(draft.name, "Wind Project 5");
    assert_eq!(draft.location, "Unknown, USA");
    assert_eq!(draft.status, ProjectStatus::Operational);
    assert_eq!(draft.developer, "Wind Energy Corp");
    assert!((50.0..550.0).contains(&draft.capacity_mw));
    assert!(draft.commission_year <= current_year());
    let lat = draft.latitude.unwrap();
    assert!((40.0..=50.0).contains(&lat));
    draft.validate().unwrap();
  }

  #[test]
  fn test_implausible_values_are_replaced() {
    let record: RawProjectRecord = serde_json::from_value(json!({
      "name": "   ",
      "capacity": -20,
      "year": 1066,
      "latitude": 400.0,
      "status": "mothballed"
    }))
    .unwrap();

    let mut rng = StdRng::seed_from_u64(3);
    let draft = RawUpstreamRecord::Wind { index: 0, record }.into_draft(&mut rng);

    assert_eq!(draft.name, "Wind Project 1");
    assert!(draft.capacity_mw >= 50.0);
    assert!(is_valid_year(draft.commission_year));
    assert!(is_valid_latitude(draft.latitude.unwrap()));
    assert_eq!(draft.status, ProjectStatus::Operational);
  }

  #[test]
  fn test_wrongly_typed_fields_are_treated_as_missing() {
    let record: RawProjectRecord = serde_json::from_value(json!({
      "id": { "nested": true },
      "capacity": [1, 2],
      "year": "soon"
    }))
    .unwrap();
    assert!(record.id.is_none());
    assert!(record.capacity.is_none());
    assert!(record.year.is_none());
  }

  #[test]
  fn test_solar_record_aliases() {
    let record: RawProjectRecord = serde_json::from_value(json!({
      "id": "az-7",
      "system_capacity": 200.5,
      "lat": 33.4,
      "lon": -112.0
    }))
    .unwrap();

    let mut rng = StdRng::seed_from_u64(11);
    let draft = RawUpstreamRecord::Solar { index: 0, record }.into_draft(&mut rng);

    assert_eq!(draft.external_id.as_deref(), Some("solar_az-7"));
    assert_eq!(draft.category, Category::Solar);
    assert_eq!(draft.capacity_mw, 200.5);
    assert_eq!(draft.latitude, Some(33.4));
    assert_eq!(draft.longitude, Some(-112.0));
  }

  #[test]
  fn test_same_seed_same_defaults() {
    let record = || RawUpstreamRecord::Wind {
      index: 0,
      record: RawProjectRecord::default(),
    };
    let a = record().into_draft(&mut StdRng::seed_from_u64(99));
    let b = record().into_draft(&mut StdRng::seed_from_u64(99));
    assert_eq!(a, b);
  }

  #[test]
  fn test_technology_string_sets_category() {
    let mut rng = StdRng::seed_from_u64(5);
    let parse = |value: serde_json::Value| -> RawProjectRecord { serde_json::from_value(value).unwrap() };

    let draft = RawUpstreamRecord::Solar {
      index: 0,
      record: parse(json!({ "type": "Solar PV" })),
    }
    .into_draft(&mut rng);
    assert_eq!(draft.category, Category::Solar);

    let draft = RawUpstreamRecord::Wind {
      index: 0,
      record: parse(json!({ "technology": "Hydroelectric" })),
    }
    .into_draft(&mut rng);
    assert_eq!(draft.category, Category::Hydro);

    // Unrecognised strings fall back to the feed
    let draft = RawUpstreamRecord::Wind {
      index: 0,
      record: parse(json!({ "type": "Offshore array" })),
    }
    .into_draft(&mut rng);
    assert_eq!(draft.category, Category::Wind);
  }

  #[test]
  fn test_solar_defaults_for_missing_fields() {
    let draft = RawUpstreamRecord::Solar {
      index: 2,
      record: RawProjectRecord::default(),
    }
    .into_draft(&mut StdRng::seed_from_u64(8));

    assert_eq!(draft.external_id.as_deref(), Some("solar_2"));
    assert_eq!(draft.name, "Solar Project 3");
    assert_eq!(draft.category, Category::Solar);
    assert_eq!(draft.developer, "SolarTech Solutions");
    assert!((32.0..=47.0).contains(&draft.latitude.unwrap()));
    assert!((-125.0..=-95.0).contains(&draft.longitude.unwrap()));
  }
}
