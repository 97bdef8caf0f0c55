use crate::project::{ProjectFilter, SortKey};
use crate::ui::renderfns::{category_color, status_color, truncate};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Spans describing the active search, filters and sort order
pub fn filter_spans(filter: &ProjectFilter, shown: usize, loaded: usize) -> Vec<Span<'static>> {
  let key = Style::default().fg(Color::Cyan);
  let dim = Style::default().fg(Color::DarkGray);

  let mut spans = vec![Span::styled(" <c>", key), Span::styled(" type ", dim)];
  spans.push(match filter.category {
    Some(category) => Span::styled(
      category.label(),
      Style::default().fg(category_color(category)).bold(),
    ),
    None => Span::raw("All"),
  });

  spans.push(Span::styled("  <s>", key));
  spans.push(Span::styled(" status ", dim));
  spans.push(match filter.status {
    Some(status) => Span::styled(status.label(), Style::default().fg(status_color(status)).bold()),
    None => Span::raw("All"),
  });

  spans.push(Span::styled("  <o>", key));
  spans.push(Span::styled(" sort ", dim));
  let sort_style = if filter.sort == SortKey::default() {
    Style::default()
  } else {
    Style::default().fg(Color::Yellow)
  };
  spans.push(Span::styled(filter.sort.label(), sort_style));

  if !filter.query.is_empty() {
    spans.push(Span::styled("  </>", key));
    spans.push(Span::styled(" ", dim));
    spans.push(Span::styled(
      format!("\"{}\"", truncate(&filter.query, 24)),
      Style::default().fg(Color::Yellow),
    ));
  }

  spans.push(Span::styled(format!("  {} of {} shown", shown, loaded), dim));
  if filter.is_active() {
    spans.push(Span::styled("  <x>", key));
    spans.push(Span::styled(" clear", dim));
  }
  spans
}

/// Render the filter line
pub fn render_filter_bar(
  frame: &mut Frame,
  area: Rect,
  filter: &ProjectFilter,
  shown: usize,
  loaded: usize,
) {
  let paragraph = Paragraph::new(Line::from(filter_spans(filter, shown, loaded)));
  frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::project::{Category, ProjectStatus};

  fn text(spans: &[Span]) -> String {
    spans.iter().map(|s| s.content.as_ref()).collect()
  }

  #[test]
  fn test_default_filter_line() {
    let line = text(&filter_spans(&ProjectFilter::default(), 10, 10));
    assert!(line.contains("type All"));
    assert!(line.contains("status All"));
    assert!(line.contains("10 of 10 shown"));
    assert!(!line.contains("clear"));
  }

  #[test]
  fn test_active_filter_line() {
    let filter = ProjectFilter {
      query: "texas".to_string(),
      category: Some(Category::Wind),
      status: Some(ProjectStatus::Planned),
      sort: SortKey::Capacity,
    };
    let line = text(&filter_spans(&filter, 2, 40));
    assert!(line.contains("type Wind"));
    assert!(line.contains("status Planned"));
    assert!(line.contains("\"texas\""));
    assert!(line.contains("2 of 40 shown"));
    assert!(line.contains("clear"));
  }
}
