//! Client-local search, filter and sort over loaded projects.

use super::types::{Category, Project, ProjectStatus};
use std::cmp::Ordering;

/// Field to order the project list by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
  /// Alphabetical, ascending
  #[default]
  Name,
  /// Largest first
  Capacity,
  /// Newest first
  Year,
  /// Alphabetical by status label
  Status,
}

impl SortKey {
  pub const ALL: [SortKey; 4] = [SortKey::Name, SortKey::Capacity, SortKey::Year, SortKey::Status];

  pub fn label(&self) -> &'static str {
    match self {
      SortKey::Name => "Name",
      SortKey::Capacity => "Capacity",
      SortKey::Year => "Year",
      SortKey::Status => "Status",
    }
  }

  pub fn next(self) -> SortKey {
    let idx = SortKey::ALL.iter().position(|k| *k == self).unwrap_or(0);
    SortKey::ALL[(idx + 1) % SortKey::ALL.len()]
  }

  fn compare(&self, a: &Project, b: &Project) -> Ordering {
    match self {
      SortKey::Name => compare_text(&a.name, &b.name),
      SortKey::Capacity => b.capacity_mw.total_cmp(&a.capacity_mw),
      SortKey::Year => b.commission_year.cmp(&a.commission_year),
      SortKey::Status => compare_text(a.status.label(), b.status.label()),
    }
  }
}

fn compare_text(a: &str, b: &str) -> Ordering {
  a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Search query, category/status filters and sort order.
///
/// Applying a filter is pure: the same filter over the same input always
/// yields the same output, and filtering an already filtered list is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
  pub query: String,
  pub category: Option<Category>,
  pub status: Option<ProjectStatus>,
  pub sort: SortKey,
}

impl ProjectFilter {
  /// Whether any narrowing filter is set. Sort order alone does not count.
  pub fn is_active(&self) -> bool {
    !self.query.is_empty() || self.category.is_some() || self.status.is_some()
  }

  pub fn clear(&mut self) {
    *self = Self::default();
  }

  pub fn matches(&self, project: &Project) -> bool {
    self.matches_query(project)
      && self.category.map_or(true, |c| project.category == c)
      && self.status.map_or(true, |s| project.status == s)
  }

  fn matches_query(&self, project: &Project) -> bool {
    let query = self.query.trim().to_lowercase();
    if query.is_empty() {
      return true;
    }
    [&project.name, &project.location, &project.developer]
      .iter()
      .any(|field| field.to_lowercase().contains(&query))
  }

  /// Filter and sort, preserving the input order among equal keys.
  pub fn apply<'a>(&self, projects: &'a [Project]) -> Vec<&'a Project> {
    let mut filtered: Vec<&Project> = projects.iter().filter(|p| self.matches(p)).collect();
    filtered.sort_by(|a, b| self.sort.compare(a, b));
    filtered
  }

  /// Step the category filter: All -> Solar -> ... -> Other -> All
  pub fn cycle_category(&mut self) {
    self.category = cycle(&Category::ALL, self.category);
  }

  /// Step the status filter: All -> Operational -> ... -> Planned -> All
  pub fn cycle_status(&mut self) {
    self.status = cycle(&ProjectStatus::ALL, self.status);
  }

  pub fn cycle_sort(&mut self) {
    self.sort = self.sort.next();
  }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: Option<T>) -> Option<T> {
  match current {
    None => all.first().copied(),
    Some(value) => {
      let idx = all.iter().position(|v| *v == value)?;
      all.get(idx + 1).copied()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn project(name: &str, category: Category, status: ProjectStatus, capacity: f64, year: i32) -> Project {
    let now = Utc::now();
    Project {
      id: name.to_lowercase().replace(' ', "-"),
      external_id: None,
      name: name.to_string(),
      category,
      capacity_mw: capacity,
      location: "Texas, USA".to_string(),
      status,
      commission_year: year,
      developer: "GreenWind Energy".to_string(),
      latitude: None,
      longitude: None,
      created_at: now,
      updated_at: now,
    }
  }

  fn test_projects() -> Vec<Project> {
    vec![
      project("Sunfield Solar Farm", Category::Solar, ProjectStatus::Operational, 150.0, 2023),
      project("WindPower Ridge", Category::Wind, ProjectStatus::Operational, 300.0, 2022),
      project("Desert Solar Complex", Category::Solar, ProjectStatus::UnderConstruction, 200.0, 2024),
      project("Mountain Wind Farm", Category::Wind, ProjectStatus::Planned, 250.0, 2025),
    ]
  }

  fn names(projects: &[&Project]) -> Vec<String> {
    projects.iter().map(|p| p.name.clone()).collect()
  }

  #[test]
  fn test_default_filter_sorts_by_name() {
    let projects = test_projects();
    let filtered = ProjectFilter::default().apply(&projects);
    assert_eq!(
      names(&filtered),
      vec![
        "Desert Solar Complex",
        "Mountain Wind Farm",
        "Sunfield Solar Farm",
        "WindPower Ridge"
      ]
    );
  }

  #[test]
  fn test_search_is_case_insensitive_over_name_location_developer() {
    let mut projects = test_projects();
    projects[0].developer = "SolarTech Solutions".to_string();
    projects[3].location = "Colorado, USA".to_string();

    let filter = ProjectFilter {
      query: "SOLARTECH".to_string(),
      ..Default::default()
    };
    assert_eq!(names(&filter.apply(&projects)), vec!["Sunfield Solar Farm"]);

    let filter = ProjectFilter {
      query: "colorado".to_string(),
      ..Default::default()
    };
    assert_eq!(names(&filter.apply(&projects)), vec!["Mountain Wind Farm"]);
  }

  #[test]
  fn test_category_and_status_filters_combine() {
    let projects = test_projects();
    let filter = ProjectFilter {
      category: Some(Category::Solar),
      status: Some(ProjectStatus::Operational),
      ..Default::default()
    };
    assert_eq!(names(&filter.apply(&projects)), vec!["Sunfield Solar Farm"]);
  }

  #[test]
  fn test_sort_by_capacity_descending() {
    let projects = test_projects();
    let filter = ProjectFilter {
      sort: SortKey::Capacity,
      ..Default::default()
    };
    let capacities: Vec<f64> = filter.apply(&projects).iter().map(|p| p.capacity_mw).collect();
    assert_eq!(capacities, vec![300.0, 250.0, 200.0, 150.0]);
  }

  #[test]
  fn test_sort_by_year_descending() {
    let projects = test_projects();
    let filter = ProjectFilter {
      sort: SortKey::Year,
      ..Default::default()
    };
    let years: Vec<i32> = filter
      .apply(&projects)
      .iter()
      .map(|p| p.commission_year)
      .collect();
    assert_eq!(years, vec![2025, 2024, 2023, 2022]);
  }

  #[test]
  fn test_filter_is_idempotent() {
    let projects = test_projects();
    let filter = ProjectFilter {
      query: "wind".to_string(),
      status: Some(ProjectStatus::Operational),
      sort: SortKey::Capacity,
      ..Default::default()
    };

    let once: Vec<Project> = filter.apply(&projects).into_iter().cloned().collect();
    let twice: Vec<Project> = filter.apply(&once).into_iter().cloned().collect();
    assert_eq!(once, twice);
  }

  #[test]
  fn test_cycle_category_wraps_to_all() {
    let mut filter = ProjectFilter::default();
    for expected in Category::ALL {
      filter.cycle_category();
      assert_eq!(filter.category, Some(expected));
    }
    filter.cycle_category();
    assert_eq!(filter.category, None);
  }

  #[test]
  fn test_sort_alone_is_not_active() {
    let mut filter = ProjectFilter::default();
    filter.cycle_sort();
    assert!(!filter.is_active());

    filter.cycle_status();
    assert!(filter.is_active());

    filter.clear();
    assert_eq!(filter, ProjectFilter::default());
  }
}
