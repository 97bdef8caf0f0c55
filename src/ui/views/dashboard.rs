use crate::project::stats::{capacity_by_year, category_distribution, DashboardStats};
use crate::project::{Project, ProjectFilter};
use crate::provider::{ProjectDataProvider, ProviderState};
use crate::ui::components::{render_filter_bar, KeyResult, Prompt, PromptEvent, PromptKind};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{category_color, format_capacity, status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::ProjectDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, ListState, Paragraph};

/// Rows moved by PageUp/PageDown
const PAGE_JUMP: usize = 10;

/// Root view: headline stats, charts and the filterable project list
pub struct DashboardView {
  provider: ProjectDataProvider,
  filter: ProjectFilter,
  search: Prompt,
  list_state: ListState,
}

impl DashboardView {
  /// Create the view and start loading the first page
  pub fn new(mut provider: ProjectDataProvider) -> Self {
    provider.initialize();
    Self {
      provider,
      filter: ProjectFilter::default(),
      search: Prompt::new(PromptKind::Search),
      list_state: ListState::default(),
    }
  }

  fn state(&self) -> &ProviderState {
    self.provider.snapshot()
  }

  fn visible(&self) -> Vec<&Project> {
    self.filter.apply(&self.provider.snapshot().projects)
  }

  fn move_selection(&mut self, delta: isize) {
    let len = self.visible().len();
    if len == 0 {
      return;
    }
    let current = self.list_state.selected().unwrap_or(0);
    let next = current.saturating_add_signed(delta).min(len - 1);
    self.list_state.select(Some(next));

    // Reaching the bottom pulls the next page
    if delta > 0 && next == len - 1 {
      self.provider.load_more();
    }
  }

  fn update_filter(&mut self, change: impl FnOnce(&mut ProjectFilter)) {
    change(&mut self.filter);
    self.list_state.select(Some(0));
  }

  fn open_selected(&self) -> ViewAction {
    let selected = self.list_state.selected().unwrap_or(0);
    match self.visible().get(selected) {
      Some(project) => ViewAction::Push(Box::new(ProjectDetailView::new((*project).clone()))),
      None => ViewAction::None,
    }
  }

  fn render_stats(&self, frame: &mut Frame, area: Rect) {
    let state = self.state();
    let stats = DashboardStats::from_projects(&state.projects);
    let cards = [
      ("Total Capacity", format_capacity(stats.total_capacity_mw), Color::Green),
      (
        "Projects",
        format!("{} of {}", stats.total_projects, state.total),
        Color::White,
      ),
      (
        "Operational",
        stats.operational_projects.to_string(),
        Color::Green,
      ),
      ("Solar", stats.solar_projects.to_string(), Color::Yellow),
    ];

    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Ratio(1, 4); 4])
      .split(area);

    for ((title, value, color), chunk) in cards.into_iter().zip(chunks.iter()) {
      let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
      let paragraph = Paragraph::new(Span::styled(value, Style::default().fg(color).bold()))
        .alignment(Alignment::Center)
        .block(block);
      frame.render_widget(paragraph, *chunk);
    }
  }

  fn render_charts(&self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
      .split(area);

    let projects = &self.state().projects;

    let by_year = capacity_by_year(projects);
    let bars: Vec<Bar> = by_year
      .iter()
      .map(|(year, capacity)| {
        Bar::default()
          .value(capacity.round() as u64)
          .label(Line::from(year.to_string()))
          .text_value(format!("{:.0}", capacity))
      })
      .collect();
    let chart = BarChart::default()
      .block(
        Block::default()
          .title(" Capacity by year (MW) ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Blue)),
      )
      .data(BarGroup::default().bars(&bars))
      .bar_width(5)
      .bar_gap(1)
      .bar_style(Style::default().fg(Color::Green))
      .value_style(Style::default().fg(Color::Black).bg(Color::Green));
    frame.render_widget(chart, chunks[0]);

    let block = Block::default()
      .title(" By type ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(chunks[1]);
    frame.render_widget(block, chunks[1]);

    let bar_room = inner.width.saturating_sub(22) as f64;
    let lines: Vec<Line> = category_distribution(projects)
      .into_iter()
      .map(|share| {
        let color = category_color(share.category);
        Line::from(vec![
          Span::styled(format!("{:<11}", share.category.label()), Style::default().fg(color)),
          Span::raw(format!("{:>4} ", share.count)),
          Span::styled(
            format!("{:>4.0}% ", share.fraction * 100.0),
            Style::default().fg(Color::DarkGray),
          ),
          Span::styled(
            "█".repeat((share.fraction * bar_room).round() as usize),
            Style::default().fg(color),
          ),
        ])
      })
      .collect();
    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.visible().len();
    ensure_valid_selection(&mut self.list_state, len);

    let state = self.provider.snapshot();
    let title = if state.loading && state.projects.is_empty() {
      " Projects (loading...) ".to_string()
    } else {
      format!(" Projects ({}) ", len)
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = if state.loading {
        "Loading projects..."
      } else if self.filter.is_active() {
        "No projects match the current filters. Press 'x' to clear."
      } else if state.error.is_some() {
        "Failed to load projects. Press 'r' to retry."
      } else {
        "No projects found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .filter
      .apply(&state.projects)
      .into_iter()
      .map(|project| {
        ListItem::new(Line::from(vec![
          Span::raw(format!("{:<32}", truncate(&project.name, 30))),
          Span::styled(
            format!("{:<11}", project.category.label()),
            Style::default().fg(category_color(project.category)),
          ),
          Span::styled(
            format!("{:>10}", format_capacity(project.capacity_mw)),
            Style::default().fg(Color::White).bold(),
          ),
          Span::raw("  "),
          Span::styled(
            format!("{:<19}", project.status.label()),
            Style::default().fg(status_color(project.status)),
          ),
          Span::styled(
            format!("{:<22}", truncate(&project.location, 20)),
            Style::default().fg(Color::Gray),
          ),
          Span::styled(
            project.commission_year.to_string(),
            Style::default().fg(Color::DarkGray),
          ),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_status(&self, frame: &mut Frame, area: Rect) {
    let state = self.state();
    let line = if let Some(error) = &state.error {
      Line::from(vec![
        Span::styled(" Error: ", Style::default().fg(Color::Red).bold()),
        Span::styled(truncate(error, 80), Style::default().fg(Color::Red)),
        Span::styled(
          "  (r: refresh, n: load more)",
          Style::default().fg(Color::DarkGray),
        ),
      ])
    } else if state.loading {
      Line::from(Span::styled(
        " Loading...",
        Style::default().fg(Color::Yellow),
      ))
    } else {
      let more = if state.has_more {
        "more available (n)"
      } else {
        "all loaded"
      };
      Line::from(Span::styled(
        format!(
          " Loaded {} of {}, page {}, {}",
          state.projects.len(),
          state.total,
          state.page,
          more
        ),
        Style::default().fg(Color::DarkGray),
      ))
    };
    frame.render_widget(Paragraph::new(line), area);
  }
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.search.is_active() {
      match self.search.handle_key(key) {
        KeyResult::Event(PromptEvent::Changed(query)) | KeyResult::Event(PromptEvent::Submitted(query)) => {
          self.update_filter(|f| f.query = query);
        }
        _ => {}
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
      KeyCode::PageDown => self.move_selection(PAGE_JUMP as isize),
      KeyCode::PageUp => self.move_selection(-(PAGE_JUMP as isize)),
      KeyCode::Char('g') | KeyCode::Home => self.list_state.select(Some(0)),
      KeyCode::Char('G') | KeyCode::End => self.move_selection(isize::MAX),
      KeyCode::Char('/') => self.search.activate(&self.filter.query),
      KeyCode::Char('c') => self.update_filter(ProjectFilter::cycle_category),
      KeyCode::Char('s') => self.update_filter(ProjectFilter::cycle_status),
      KeyCode::Char('o') => self.update_filter(ProjectFilter::cycle_sort),
      KeyCode::Char('x') => self.update_filter(ProjectFilter::clear),
      KeyCode::Char('n') => self.provider.load_more(),
      KeyCode::Char('r') => self.provider.refresh(),
      KeyCode::Enter => return self.open_selected(),
      KeyCode::Char('q') => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3),  // Stats cards
        Constraint::Length(10), // Charts
        Constraint::Length(1),  // Filter bar
        Constraint::Min(3),     // Project list
        Constraint::Length(1),  // Status line
      ])
      .split(area);

    self.render_stats(frame, chunks[0]);
    self.render_charts(frame, chunks[1]);
    let visible = self.visible().len();
    render_filter_bar(
      frame,
      chunks[2],
      &self.filter,
      visible,
      self.state().projects.len(),
    );
    self.render_list(frame, chunks[3]);
    self.render_status(frame, chunks[4]);

    self.search.render_overlay(frame, chunks[3]);
  }

  fn breadcrumb_label(&self) -> String {
    "Projects".to_string()
  }

  fn tick(&mut self) {
    self.provider.poll();
  }

  fn is_editing(&self) -> bool {
    self.search.is_active()
  }

  fn run_command(&mut self, command: &str) -> bool {
    match command {
      "refresh" => self.provider.refresh(),
      "more" => self.provider.load_more(),
      "clear" => self.update_filter(ProjectFilter::clear),
      _ => return false,
    }
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("c/s/o", "type/status/sort").with_priority(30),
      ShortcutInfo::new("n", "more").with_priority(40),
      ShortcutInfo::new("r", "refresh").with_priority(50),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::project::{Category, PageRequest, PageResponse, ProjectStatus};
  use crate::provider::ProjectSource;
  use chrono::Utc;
  use color_eyre::Result;
  use crossterm::event::KeyModifiers;
  use futures::future::BoxFuture;
  use std::sync::{Arc, Mutex};
  use std::time::Duration;

  struct StubSource {
    total: usize,
    requests: Mutex<Vec<PageRequest>>,
  }

  impl ProjectSource for StubSource {
    fn fetch_page(&self, request: PageRequest) -> BoxFuture<'static, Result<PageResponse>> {
      self.requests.lock().unwrap().push(request);
      let total = self.total;
      Box::pin(async move {
        let start = request.offset().min(total);
        let end = (start + request.limit as usize).min(total);
        let now = Utc::now();
        let projects = (start..end)
          .map(|i| Project {
            id: format!("p{}", i),
            external_id: None,
            name: format!("Site {:02}", i),
            category: if i % 2 == 0 { Category::Solar } else { Category::Wind },
            capacity_mw: 10.0 * (i + 1) as f64,
            location: "Utah, USA".to_string(),
            status: ProjectStatus::Operational,
            commission_year: 2021,
            developer: "Dev".to_string(),
            latitude: None,
            longitude: None,
            created_at: now,
            updated_at: now,
          })
          .collect();
        Ok(PageResponse {
          projects,
          page: request.page,
          has_more: end < total,
          total: total as u64,
        })
      })
    }

    fn describe(&self) -> String {
      "stub".to_string()
    }
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  async fn dashboard(total: usize) -> (DashboardView, Arc<StubSource>) {
    let source = Arc::new(StubSource {
      total,
      requests: Mutex::new(Vec::new()),
    });
    let provider = ProjectDataProvider::new(source.clone(), 5);
    let mut view = DashboardView::new(provider);
    settle(&mut view).await;
    (view, source)
  }

  async fn settle(view: &mut DashboardView) {
    for _ in 0..100 {
      view.tick();
      if !view.state().loading {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("dashboard did not settle");
  }

  #[tokio::test]
  async fn test_scrolling_to_bottom_loads_more() {
    let (mut view, source) = dashboard(12).await;
    assert_eq!(view.state().projects.len(), 5);

    for _ in 0..4 {
      view.handle_key(key(KeyCode::Char('j')));
    }
    settle(&mut view).await;

    assert_eq!(view.state().projects.len(), 10);
    assert_eq!(source.requests.lock().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn test_filter_keys() {
    let (mut view, _) = dashboard(5).await;

    view.handle_key(key(KeyCode::Char('c')));
    assert_eq!(view.filter.category, Some(Category::Solar));
    assert_eq!(view.visible().len(), 3);

    view.handle_key(key(KeyCode::Char('x')));
    assert!(!view.filter.is_active());
    assert_eq!(view.visible().len(), 5);
  }

  #[tokio::test]
  async fn test_live_search() {
    let (mut view, _) = dashboard(5).await;

    view.handle_key(key(KeyCode::Char('/')));
    assert!(view.is_editing());
    view.handle_key(key(KeyCode::Char('0')));
    view.handle_key(key(KeyCode::Char('3')));
    assert_eq!(view.visible().len(), 1);

    view.handle_key(key(KeyCode::Enter));
    assert!(!view.is_editing());
    assert_eq!(view.filter.query, "03");
  }

  #[tokio::test]
  async fn test_refresh_command() {
    let (mut view, source) = dashboard(5).await;
    assert!(view.run_command("refresh"));
    settle(&mut view).await;

    let requests = source.requests.lock().unwrap();
    assert!(requests.last().unwrap().refresh);
    assert!(!view.run_command("nope"));
  }

  #[tokio::test]
  async fn test_enter_opens_detail() {
    let (mut view, _) = dashboard(5).await;
    assert!(matches!(
      view.handle_key(key(KeyCode::Enter)),
      ViewAction::Push(_)
    ));
    assert!(matches!(
      view.handle_key(key(KeyCode::Char('q'))),
      ViewAction::Quit
    ));
  }
}
