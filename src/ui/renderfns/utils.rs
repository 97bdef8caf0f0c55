use crate::project::{Category, ProjectStatus};
use ratatui::prelude::Color;

/// Truncate a string to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a project status
pub fn status_color(status: ProjectStatus) -> Color {
  match status {
    ProjectStatus::Operational => Color::Green,
    ProjectStatus::UnderConstruction => Color::Yellow,
    ProjectStatus::Planned => Color::Blue,
  }
}

/// Display color for an energy category
pub fn category_color(category: Category) -> Color {
  match category {
    Category::Solar => Color::Yellow,
    Category::Wind => Color::Cyan,
    Category::Hydro => Color::Blue,
    Category::Geothermal => Color::Red,
    Category::Biomass => Color::Green,
    Category::Other => Color::Gray,
  }
}

/// Format a capacity in MW, switching to GW above 1000 MW
pub fn format_capacity(mw: f64) -> String {
  if mw >= 1000.0 {
    format!("{:.2} GW", mw / 1000.0)
  } else {
    format!("{:.0} MW", mw)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Énergie Québec", 10), "Énergie...");
  }

  #[test]
  fn test_status_colors() {
    assert_eq!(status_color(ProjectStatus::Operational), Color::Green);
    assert_eq!(status_color(ProjectStatus::UnderConstruction), Color::Yellow);
    assert_eq!(status_color(ProjectStatus::Planned), Color::Blue);
  }

  #[test]
  fn test_format_capacity() {
    assert_eq!(format_capacity(650.0), "650 MW");
    assert_eq!(format_capacity(1250.0), "1.25 GW");
  }
}
