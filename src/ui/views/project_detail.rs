use crate::project::Project;
use crate::ui::renderfns::{category_color, format_capacity, status_color};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Read-only view of a single project
pub struct ProjectDetailView {
  project: Project,
}

impl ProjectDetailView {
  pub fn new(project: Project) -> Self {
    Self { project }
  }

  fn lines(&self) -> Vec<Line<'_>> {
    let p = &self.project;
    let label = |text: &'static str| Span::styled(format!("{:<14}", text), Style::default().fg(Color::DarkGray));

    let coordinates = match (p.latitude, p.longitude) {
      (Some(lat), Some(lon)) => format!("{:.4}, {:.4}", lat, lon),
      _ => "unknown".to_string(),
    };

    vec![
      Line::from(vec![label("Name"), Span::styled(&p.name, Style::default().bold())]),
      Line::from(vec![
        label("Type"),
        Span::styled(p.category.label(), Style::default().fg(category_color(p.category))),
      ]),
      Line::from(vec![
        label("Status"),
        Span::styled(p.status.label(), Style::default().fg(status_color(p.status))),
      ]),
      Line::from(vec![
        label("Capacity"),
        Span::styled(format_capacity(p.capacity_mw), Style::default().fg(Color::White).bold()),
      ]),
      Line::from(vec![label("Location"), Span::raw(&p.location)]),
      Line::from(vec![label("Coordinates"), Span::raw(coordinates)]),
      Line::from(vec![label("Commissioned"), Span::raw(p.commission_year.to_string())]),
      Line::from(vec![label("Developer"), Span::raw(&p.developer)]),
      Line::from(""),
      Line::from(vec![label("ID"), Span::styled(&p.id, Style::default().fg(Color::DarkGray))]),
      Line::from(vec![
        label("Source ID"),
        Span::styled(
          p.external_id.as_deref().unwrap_or("-"),
          Style::default().fg(Color::DarkGray),
        ),
      ]),
      Line::from(vec![
        label("Updated"),
        Span::styled(
          p.updated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
          Style::default().fg(Color::DarkGray),
        ),
      ]),
    ]
  }
}

impl View for ProjectDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc | KeyCode::Backspace => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.project.name))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = Paragraph::new(self.lines())
      .block(block)
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.project.name.clone()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::project::{Category, ProjectStatus};
  use chrono::Utc;
  use crossterm::event::KeyModifiers;

  fn project() -> Project {
    let now = Utc::now();
    Project {
      id: "abc".to_string(),
      external_id: Some("wind_3".to_string()),
      name: "Mesa Ridge".to_string(),
      category: Category::Wind,
      capacity_mw: 240.0,
      location: "Texas, USA".to_string(),
      status: ProjectStatus::UnderConstruction,
      commission_year: 2024,
      developer: "Wind Energy Corp".to_string(),
      latitude: Some(31.5),
      longitude: None,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn test_back_keys_pop() {
    let mut view = ProjectDetailView::new(project());
    for code in [KeyCode::Char('q'), KeyCode::Esc] {
      assert!(matches!(
        view.handle_key(KeyEvent::new(code, KeyModifiers::NONE)),
        ViewAction::Pop
      ));
    }
    assert!(matches!(
      view.handle_key(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE)),
      ViewAction::None
    ));
  }

  #[test]
  fn test_missing_coordinates_shown_as_unknown() {
    let view = ProjectDetailView::new(project());
    let text: String = view
      .lines()
      .iter()
      .flat_map(|line| line.spans.iter().map(|s| s.content.to_string()))
      .collect();
    assert!(text.contains("unknown"));
    assert!(text.contains("wind_3"));
    assert_eq!(view.breadcrumb_label(), "Mesa Ridge");
  }
}
