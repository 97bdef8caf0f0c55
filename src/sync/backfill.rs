//! Synthetic projects used to top up a thin upstream pull.

use crate::project::{Category, ProjectDraft, ProjectStatus};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const CATEGORIES: [Category; 5] = [
  Category::Solar,
  Category::Wind,
  Category::Hydro,
  Category::Geothermal,
  Category::Biomass,
];

const STATES: [&str; 10] = [
  "California",
  "Texas",
  "Arizona",
  "Nevada",
  "Colorado",
  "Utah",
  "New Mexico",
  "Oregon",
  "Washington",
  "Montana",
];

/// Seedable generator of schema-valid projects.
///
/// The same seed yields the same sequence of drafts, which also drives the
/// defaults filled in during upstream normalization.
pub struct ProjectGenerator {
  rng: StdRng,
}

impl ProjectGenerator {
  pub fn new(seed: Option<u64>) -> Self {
    let rng = match seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };
    Self { rng }
  }

  pub fn rng(&mut self) -> &mut StdRng {
    &mut self.rng
  }

  /// Generate the draft occupying slot `index` of a pull.
  pub fn generate(&mut self, index: usize) -> ProjectDraft {
    let rng = &mut self.rng;
    let category = *CATEGORIES.choose(rng).unwrap_or(&Category::Solar);
    let state = STATES.choose(rng).copied().unwrap_or("California");
    let status = *ProjectStatus::ALL
      .choose(rng)
      .unwrap_or(&ProjectStatus::Operational);
    let kind = if index < 10 { "Facility" } else { "Project" };
    let letter = char::from(b'A' + (index % 26) as u8);

    ProjectDraft {
      external_id: Some(format!("gen_{}", index)),
      name: format!("{} {} {}", category.label(), kind, letter),
      category,
      capacity_mw: rng.gen_range(50..850) as f64,
      location: format!("{}, USA", state),
      status,
      commission_year: rng.gen_range(2020..2025),
      developer: format!("{} Energy Solutions", category.label()),
      latitude: Some(32.0 + rng.gen::<f64>() * 15.0),
      longitude: Some(-125.0 + rng.gen::<f64>() * 30.0),
    }
  }

  /// Append generated drafts until `drafts` holds at least `min` entries.
  /// Returns how many were added.
  pub fn backfill(&mut self, drafts: &mut Vec<ProjectDraft>, min: usize) -> usize {
    let start = drafts.len();
    for index in start..min {
      drafts.push(self.generate(index));
    }
    drafts.len() - start
  }
}
