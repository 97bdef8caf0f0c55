use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::provider::{ProjectDataProvider, ProjectSource};
use crate::ui;
use crate::ui::components::{KeyResult, Prompt, PromptEvent, PromptKind};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::DashboardView;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const TICK_RATE: Duration = Duration::from_millis(100);

/// Main application state
pub struct App {
  /// Navigation stack - root is always the dashboard at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` command prompt, shared by every view
  command_prompt: Prompt,

  /// Header title
  title: String,

  /// Where the data comes from, for the header
  source: String,

  /// One-line message for the footer, cleared on the next key
  message: Option<String>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  /// Build the app and start loading the first page from `source`.
  ///
  /// Must be called inside a tokio runtime.
  pub fn new(config: &Config, source: Arc<dyn ProjectSource>) -> Self {
    let description = source.describe();
    let provider = ProjectDataProvider::new(source, config.page_size);

    Self {
      view_stack: vec![Box::new(DashboardView::new(provider))],
      command_prompt: Prompt::new(PromptKind::Command),
      title: config.title().to_string(),
      source: description,
      message: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let result = self.event_loop().await;

    // Cleanup terminal, even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(TICK_RATE);
    info!(source = %self.source, "Dashboard started");

    while !self.should_quit() {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        // Views below the top keep loading in the background
        for view in self.view_stack.iter_mut() {
          view.tick();
        }
      }
      Event::Resize => {} // Redrawn on the next loop iteration
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    self.message = None;

    if self.command_prompt.is_active() {
      if let KeyResult::Event(PromptEvent::Submitted(command)) = self.command_prompt.handle_key(key) {
        self.execute_command(&command);
      }
      return;
    }

    let editing = self.current_view().is_some_and(|v| v.is_editing());
    if !editing && key.code == KeyCode::Char(':') {
      self.command_prompt.activate("");
      return;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => return,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        }
      }
      ViewAction::Quit => self.should_quit = true,
    }
  }

  fn execute_command(&mut self, command: &str) {
    match command {
      "" => {}
      "projects" => self.view_stack.truncate(1),
      "quit" => self.should_quit = true,
      _ => {
        // The current view gets first go, then the dashboard underneath
        let handled = self
          .view_stack
          .iter_mut()
          .rev()
          .any(|view| view.run_command(command));
        if !handled {
          self.message = Some(format!("Unknown command: {}", command));
        }
      }
    }
  }

  // Accessors for UI rendering
  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn command_prompt(&self) -> &Prompt {
    &self.command_prompt
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn message(&self) -> Option<&str> {
    self.message.as_deref()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }
}
