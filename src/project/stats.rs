//! Aggregates shown in the dashboard header and charts.

use super::types::{Category, Project, ProjectStatus};
use std::collections::BTreeMap;

/// How many commission years the capacity chart shows.
pub const CAPACITY_CHART_YEARS: usize = 10;

/// Headline numbers for a set of projects
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DashboardStats {
  pub total_capacity_mw: f64,
  pub total_projects: usize,
  pub operational_projects: usize,
  pub solar_projects: usize,
}

impl DashboardStats {
  pub fn from_projects<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Self {
    projects
      .into_iter()
      .fold(DashboardStats::default(), |mut stats, project| {
        stats.total_capacity_mw += project.capacity_mw;
        stats.total_projects += 1;
        if project.status == ProjectStatus::Operational {
          stats.operational_projects += 1;
        }
        if project.category == Category::Solar {
          stats.solar_projects += 1;
        }
        stats
      })
  }
}

/// Capacity summed per commission year, oldest first, limited to the most
/// recent `CAPACITY_CHART_YEARS` years present.
pub fn capacity_by_year<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Vec<(i32, f64)> {
  let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
  for project in projects {
    *by_year.entry(project.commission_year).or_default() += project.capacity_mw;
  }

  let skip = by_year.len().saturating_sub(CAPACITY_CHART_YEARS);
  by_year.into_iter().skip(skip).collect()
}

/// Project count and capacity for one category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryShare {
  pub category: Category,
  pub count: usize,
  pub capacity_mw: f64,
  /// Share of the project count, 0.0..=1.0
  pub fraction: f64,
}

/// Per-category breakdown in category order, omitting empty categories.
pub fn category_distribution<'a>(
  projects: impl IntoIterator<Item = &'a Project>,
) -> Vec<CategoryShare> {
  let mut totals: BTreeMap<Category, (usize, f64)> = BTreeMap::new();
  let mut overall = 0usize;
  for project in projects {
    let entry = totals.entry(project.category).or_default();
    entry.0 += 1;
    entry.1 += project.capacity_mw;
    overall += 1;
  }

  totals
    .into_iter()
    .map(|(category, (count, capacity_mw))| CategoryShare {
      category,
      count,
      capacity_mw,
      fraction: count as f64 / overall as f64,
    })
    .collect()
}
