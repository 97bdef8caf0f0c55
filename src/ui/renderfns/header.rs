use crate::ui::view::{sorted_shortcuts, ShortcutInfo};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with title, data source, and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  source: &str,
  shortcuts: Vec<ShortcutInfo>,
) {
  let mut spans = vec![
    Span::styled(" renewdash ", Style::default().fg(Color::Green).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", source), Style::default().fg(Color::Yellow)),
    Span::raw(" "),
  ];

  // Keys highlighted, descriptions dimmed
  for shortcut in sorted_shortcuts(shortcuts) {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
