//! Built-in demo dataset, loadable with `renewdash seed`.

use super::types::{Category, ProjectDraft, ProjectStatus};

struct SeedRow {
  name: &'static str,
  category: Category,
  capacity_mw: f64,
  location: &'static str,
  status: ProjectStatus,
  year: i32,
  developer: &'static str,
}

const SEED_ROWS: &[SeedRow] = &[
  SeedRow {
    name: "Sunfield Solar Farm",
    category: Category::Solar,
    capacity_mw: 150.0,
    location: "California, USA",
    status: ProjectStatus::Operational,
    year: 2023,
    developer: "SolarTech Solutions",
  },
  SeedRow {
    name: "WindPower Ridge",
    category: Category::Wind,
    capacity_mw: 300.0,
    location: "Texas, USA",
    status: ProjectStatus::Operational,
    year: 2022,
    developer: "GreenWind Energy",
  },
  SeedRow {
    name: "Hydroelectric Dam Alpha",
    category: Category::Hydro,
    capacity_mw: 500.0,
    location: "Washington, USA",
    status: ProjectStatus::Operational,
    year: 2021,
    developer: "AquaPower Corp",
  },
  SeedRow {
    name: "Desert Solar Complex",
    category: Category::Solar,
    capacity_mw: 200.0,
    location: "Arizona, USA",
    status: ProjectStatus::UnderConstruction,
    year: 2024,
    developer: "Desert Energy LLC",
  },
  SeedRow {
    name: "Offshore Wind Project",
    category: Category::Wind,
    capacity_mw: 800.0,
    location: "Atlantic Coast, USA",
    status: ProjectStatus::UnderConstruction,
    year: 2024,
    developer: "OceanWind Partners",
  },
  SeedRow {
    name: "Biomass Energy Plant",
    category: Category::Biomass,
    capacity_mw: 75.0,
    location: "Oregon, USA",
    status: ProjectStatus::Operational,
    year: 2020,
    developer: "BioEnergy Solutions",
  },
  SeedRow {
    name: "Mountain Wind Farm",
    category: Category::Wind,
    capacity_mw: 250.0,
    location: "Colorado, USA",
    status: ProjectStatus::Planned,
    year: 2025,
    developer: "Alpine Energy",
  },
  SeedRow {
    name: "Coastal Solar Array",
    category: Category::Solar,
    capacity_mw: 180.0,
    location: "Florida, USA",
    status: ProjectStatus::Operational,
    year: 2023,
    developer: "Coastal Renewables",
  },
  SeedRow {
    name: "River Hydro Station",
    category: Category::Hydro,
    capacity_mw: 120.0,
    location: "Montana, USA",
    status: ProjectStatus::UnderConstruction,
    year: 2024,
    developer: "RiverFlow Energy",
  },
  SeedRow {
    name: "Prairie Wind Project",
    category: Category::Wind,
    capacity_mw: 400.0,
    location: "Kansas, USA",
    status: ProjectStatus::Operational,
    year: 2022,
    developer: "Prairie Power Co",
  },
  SeedRow {
    name: "Urban Solar Initiative",
    category: Category::Solar,
    capacity_mw: 90.0,
    location: "New York, USA",
    status: ProjectStatus::Planned,
    year: 2025,
    developer: "Urban Green Energy",
  },
  SeedRow {
    name: "Geothermal Plant Beta",
    category: Category::Geothermal,
    capacity_mw: 110.0,
    location: "Nevada, USA",
    status: ProjectStatus::Operational,
    year: 2021,
    developer: "GeoThermal Systems",
  },
];

/// Seed projects keyed `seed_<n>` so re-seeding upserts instead of duplicating.
pub fn seed_projects() -> Vec<ProjectDraft> {
  SEED_ROWS
    .iter()
    .enumerate()
    .map(|(idx, row)| ProjectDraft {
      external_id: Some(format!("seed_{}", idx + 1)),
      name: row.name.to_string(),
      category: row.category,
      capacity_mw: row.capacity_mw,
      location: row.location.to_string(),
      status: row.status,
      commission_year: row.year,
      developer: row.developer.to_string(),
      latitude: None,
      longitude: None,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn test_seed_projects_are_valid_and_unique() {
    let seeds = seed_projects();
    assert_eq!(seeds.len(), 12);

    let keys: HashSet<_> = seeds.iter().map(|s| s.external_id.clone()).collect();
    assert_eq!(keys.len(), seeds.len());

    for seed in &seeds {
      seed.validate().unwrap();
    }
  }
}
