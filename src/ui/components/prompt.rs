use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::commands::{self, Command};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

const MAX_SUGGESTIONS: usize = 8;

/// What a prompt is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
  /// `:` command with autocomplete
  Command,
  /// `/` live search
  Search,
}

impl PromptKind {
  fn trigger(&self) -> char {
    match self {
      PromptKind::Command => ':',
      PromptKind::Search => '/',
    }
  }

  fn title(&self) -> &'static str {
    match self {
      PromptKind::Command => " Command ",
      PromptKind::Search => " Search ",
    }
  }
}

/// Events emitted by a prompt that its parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
  /// Search text changed (also sent with the previous text on cancel)
  Changed(String),
  /// Enter pressed. Commands are resolved against the autocomplete list.
  Submitted(String),
  Cancelled,
}

/// Overlay text prompt, activated by its trigger key
#[derive(Debug, Clone)]
pub struct Prompt {
  kind: PromptKind,
  input: TextInput,
  active: bool,
  /// Search text when the prompt was opened, restored on cancel
  previous: String,
  selected_suggestion: usize,
}

impl Prompt {
  pub fn new(kind: PromptKind) -> Self {
    Self {
      kind,
      input: TextInput::new(),
      active: false,
      previous: String::new(),
      selected_suggestion: 0,
    }
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn value(&self) -> &str {
    self.input.value()
  }

  /// Open the prompt. A search prompt starts from `current`.
  pub fn activate(&mut self, current: &str) {
    self.active = true;
    self.selected_suggestion = 0;
    self.previous = current.to_string();
    match self.kind {
      PromptKind::Command => self.input.clear(),
      PromptKind::Search => self.input.set(current),
    }
  }

  pub fn suggestions(&self) -> Vec<&'static Command> {
    match self.kind {
      PromptKind::Command => commands::get_suggestions(self.input.value()),
      PromptKind::Search => Vec::new(),
    }
  }

  /// Handle a key event.
  ///
  /// Call this regardless of active state; it handles the trigger key too.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PromptEvent> {
    if !self.active {
      if key.code == KeyCode::Char(self.kind.trigger()) {
        let previous = self.previous.clone();
        self.activate(&previous);
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    if self.kind == PromptKind::Command {
      match key.code {
        KeyCode::Tab | KeyCode::Down => {
          self.cycle_suggestion(1);
          return KeyResult::Handled;
        }
        KeyCode::BackTab | KeyCode::Up => {
          self.cycle_suggestion(-1);
          return KeyResult::Handled;
        }
        _ => {}
      }
    }

    match self.input.handle_key(key) {
      InputResult::Edited => {
        self.selected_suggestion = 0;
        match self.kind {
          PromptKind::Command => KeyResult::Handled,
          PromptKind::Search => KeyResult::Event(PromptEvent::Changed(self.input.value().to_string())),
        }
      }
      InputResult::Submitted(value) => {
        self.active = false;
        let submitted = match self.kind {
          PromptKind::Command => self.resolve_command(),
          PromptKind::Search => value.trim().to_string(),
        };
        self.previous = submitted.clone();
        self.input.clear();
        KeyResult::Event(PromptEvent::Submitted(submitted))
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.clear();
        match self.kind {
          PromptKind::Command => KeyResult::Event(PromptEvent::Cancelled),
          PromptKind::Search => KeyResult::Event(PromptEvent::Changed(self.previous.clone())),
        }
      }
      // Swallow everything else while open
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  fn cycle_suggestion(&mut self, direction: i32) {
    let count = self.suggestions().len();
    if count == 0 {
      return;
    }
    self.selected_suggestion = if direction > 0 {
      (self.selected_suggestion + 1) % count
    } else if self.selected_suggestion == 0 {
      count - 1
    } else {
      self.selected_suggestion - 1
    };
  }

  fn resolve_command(&self) -> String {
    self
      .suggestions()
      .get(self.selected_suggestion)
      .map(|cmd| cmd.name.to_string())
      .unwrap_or_else(|| self.input.value().trim().to_lowercase())
  }

  /// Render the overlay at the top-left of `area` if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();
    let shown = suggestions.len().min(MAX_SUGGESTIONS) as u16;
    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width.saturating_sub(2));
    let height = (3 + shown).min(area.height.saturating_sub(1));
    if width == 0 || height < 3 {
      return;
    }
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, height);

    frame.render_widget(Clear, overlay_area);
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(self.kind.title());
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(0)])
      .split(inner);

    let input_line = Line::from(vec![
      Span::styled(self.kind.trigger().to_string(), Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value()),
      Span::styled("_", Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(input_line), chunks[0]);

    if suggestions.is_empty() || chunks[1].height == 0 {
      return;
    }

    let items: Vec<ListItem> = suggestions
      .iter()
      .take(MAX_SUGGESTIONS)
      .map(|cmd| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<12}", cmd.name), Style::default().fg(Color::Cyan)),
          Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
        ]))
      })
      .collect();
    let list = List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default();
    state.select(Some(self.selected_suggestion));
    frame.render_stateful_widget(list, chunks[1], &mut state);
  }
}
