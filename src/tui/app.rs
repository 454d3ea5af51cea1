//! Live dashboard view.
//!
//! Shows the overall completion gauge, one card per status bucket and the task table.
//! The view is recomputed whenever the source or configuration file changes on disk,
//! or on demand with `r`.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tracing::{debug, warn};

use project_dashboard::clock::{Clock, FixedClock, SystemClock};
use project_dashboard::config::DashboardConfig;
use project_dashboard::dashboard::{ChangeDetector, Dashboard, DashboardView};
use project_dashboard::display::{delay_label, format_date, format_status, progress_bar, truncate};
use project_dashboard::fields::TaskStatus;
use project_dashboard::source::Workbook;
use project_dashboard::task::{Task, Timestamp};

use crate::tui::colors::Theme;
use crate::tui::enums::{AppState, StatusFilter};

/// Main dashboard application state
pub struct DashboardApp {
    source_path: PathBuf,
    config_path: PathBuf,
    fixed_now: Option<Timestamp>,
    poll_interval: Duration,
    theme: Theme,
    view: Option<DashboardView>,
    load_error: Option<String>,
    state: AppState,
    filter: StatusFilter,
    table_state: TableState,
    detector: ChangeDetector,
    last_poll: Instant,
    status_message: String,
}

impl DashboardApp {
    pub fn new(source_path: &Path, config_path: &Path, poll_interval: Duration, fixed_now: Option<Timestamp>) -> Self {
        let mut app = DashboardApp {
            source_path: source_path.to_path_buf(),
            config_path: config_path.to_path_buf(),
            fixed_now,
            poll_interval,
            theme: Theme::from_palette(&DashboardConfig::default().palette),
            view: None,
            load_error: None,
            state: AppState::Dashboard,
            filter: StatusFilter::default(),
            table_state: TableState::default(),
            detector: ChangeDetector::new([source_path.to_path_buf(), config_path.to_path_buf()]),
            last_poll: Instant::now(),
            status_message: String::new(),
        };
        app.reload();
        app
    }

    /// Recompute everything from the files on disk.
    fn reload(&mut self) {
        let config = DashboardConfig::load(&self.config_path);
        self.theme = Theme::from_palette(&config.palette);

        let clock: Box<dyn Clock> = match self.fixed_now {
            Some(now) => Box::new(FixedClock(now)),
            None => Box::new(SystemClock),
        };
        let result = if config.mapping.is_complete() {
            Workbook::load(&self.source_path)
                .and_then(|wb| Dashboard::default().refresh(&wb, &config, clock.as_ref()))
        } else {
            Ok(DashboardView::NeedsConfig { missing: config.mapping.missing_roles() })
        };

        match result {
            Ok(view) => {
                self.view = Some(view);
                self.load_error = None;
            }
            Err(e) => {
                // Keep showing the last good view.
                warn!(error = %e, "refresh failed");
                self.load_error = Some(e.to_string());
            }
        }
        self.clamp_selection();
    }

    fn visible_tasks(&self) -> Vec<&Task> {
        self.view
            .as_ref()
            .map(|v| v.tasks().iter().filter(|t| self.filter.matches(t.status)).collect())
            .unwrap_or_default()
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            self.table_state.select(None);
        } else {
            let idx = self.table_state.selected().unwrap_or(0).min(len - 1);
            self.table_state.select(Some(idx));
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn check_for_changes(&mut self) {
        if self.last_poll.elapsed() < self.poll_interval {
            return;
        }
        self.last_poll = Instant::now();
        if self.detector.poll() {
            debug!("files changed, reloading");
            self.reload();
            self.set_status_message("Reloaded after file change".to_string());
        }
    }

    /// Handle one input event. Returns true when the user asked to quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(false);
                }
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(true);
                }

                if self.state == AppState::Help {
                    self.state = AppState::Dashboard;
                    return Ok(false);
                }

                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                    KeyCode::Char('r') => {
                        self.reload();
                        self.set_status_message("Refreshed".to_string());
                    }
                    KeyCode::Char('f') => {
                        self.filter = self.filter.next();
                        self.table_state.select(Some(0));
                        self.clamp_selection();
                        self.set_status_message(format!("Filter: {}", self.filter.label()));
                    }
                    KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
                    KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
                    KeyCode::PageDown => self.move_selection(10),
                    KeyCode::PageUp => self.move_selection(-10),
                    KeyCode::Char('g') | KeyCode::Home => self.move_selection(isize::MIN / 2),
                    KeyCode::Char('G') | KeyCode::End => self.move_selection(isize::MAX / 2),
                    KeyCode::Char('h') | KeyCode::Char('?') => self.state = AppState::Help,
                    _ => {}
                }
            }
        }
        Ok(false)
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Header + gauge
                Constraint::Length(3), // Status cards
                Constraint::Min(0),    // Task table
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        match self.view {
            Some(DashboardView::Ready { .. }) => {
                self.render_cards(f, chunks[1]);
                self.render_table(f, chunks[2]);
            }
            _ => {
                let body = Rect::new(chunks[1].x, chunks[1].y, chunks[1].width, chunks[1].height + chunks[2].height);
                self.render_placeholder(f, body);
            }
        }
        self.render_status_bar(f, chunks[3]);

        if self.state == AppState::Help {
            self.render_help_popup(f);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent))
            .title(Span::styled(" PROJECT PROGRESS ", Style::default().add_modifier(Modifier::BOLD)));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(inner);

        let subtitle = match &self.view {
            Some(DashboardView::Ready { summary, generated_at, .. }) => format!(
                "As of {}  |  {} tasks, {} completed",
                format_date(Some(*generated_at)),
                summary.total,
                summary.completed
            ),
            _ => format!("Source: {}", self.source_path.display()),
        };
        f.render_widget(
            Paragraph::new(subtitle).style(Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC)),
            rows[0],
        );

        let rate = match &self.view {
            Some(DashboardView::Ready { summary, .. }) => summary.completion_rate.min(100),
            _ => 0,
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(self.theme.accent).bg(Color::DarkGray))
            .percent(rate as u16)
            .label(format!("{rate}% complete"));
        f.render_widget(gauge, rows[1]);
    }

    fn render_cards(&self, f: &mut Frame, area: Rect) {
        let Some(DashboardView::Ready { summary, .. }) = &self.view else {
            return;
        };
        let cards: [(&str, usize, Color); 5] = [
            ("Total", summary.total, self.theme.accent),
            ("Completed", summary.completed, self.theme.completed),
            ("In progress", summary.in_progress, self.theme.in_progress),
            ("Overdue", summary.overdue, self.theme.overdue),
            ("Not started", summary.not_started, self.theme.not_started),
        ];
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 5); 5])
            .split(area);

        for ((title, count, color), column) in cards.iter().zip(columns.iter()) {
            let card = Paragraph::new(Line::from(Span::styled(
                count.to_string(),
                Style::default().fg(*color).add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(*color))
                    .title(*title),
            );
            f.render_widget(card, *column);
        }
    }

    fn render_table(&mut self, f: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .visible_tasks()
            .into_iter()
            .map(|task| {
                let color = self.theme.status(task.status);
                let status = match delay_label(task) {
                    Some(delay) => format!("{} ({})", format_status(task.status), delay),
                    None => format_status(task.status).to_string(),
                };
                Row::new(vec![
                    Cell::from(truncate(&task.name, 40)),
                    Cell::from(format_date(Some(task.plan_start))),
                    Cell::from(format_date(Some(task.plan_end))),
                    Cell::from(format_date(task.actual_end)),
                    Cell::from(Span::styled(status, Style::default().fg(color))),
                    Cell::from(Span::styled(
                        format!("{} {:>3}%", progress_bar(task.progress, 10), task.progress_percent()),
                        Style::default().fg(color),
                    )),
                ])
            })
            .collect();

        let count = rows.len();
        let header = Row::new(vec!["Task", "Start", "End", "Done", "Status", "Progress"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let widths = [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(28),
            Constraint::Length(15),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Tasks [{}] ({}) ", self.filter.label(), count)),
            )
            .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_placeholder(&self, f: &mut Frame, area: Rect) {
        let mut lines = match &self.view {
            Some(DashboardView::NeedsConfig { missing }) => {
                let roles: Vec<&str> = missing.iter().map(|r| r.label()).collect();
                vec![
                    Line::from(Span::styled("Dashboard not configured", Style::default().add_modifier(Modifier::BOLD))),
                    Line::from(""),
                    Line::from(format!("Missing: {}", roles.join(", "))),
                    Line::from("Run `pdash config set --table <table>` in another terminal."),
                    Line::from("This view refreshes once the configuration is saved."),
                ]
            }
            Some(DashboardView::Empty) => vec![
                Line::from(Span::styled("No valid tasks", Style::default().add_modifier(Modifier::BOLD))),
                Line::from(""),
                Line::from("Every record needs a name, a plan start and a plan end."),
            ],
            _ => vec![Line::from("Loading...")],
        };
        if let Some(err) = &self.load_error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Error: {err}"),
                Style::default().fg(self.theme.overdue),
            )));
        }
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    /// Render the status bar
    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if let Some(err) = &self.load_error {
            format!("Refresh failed: {err}")
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            format!("Filter: {} | f: Filter | r: Refresh | j/k: Move | h: Help | q: Quit", self.filter.label())
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(self.theme.accent).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_help_popup(&self, f: &mut Frame) {
        let popup_area = {
            let area = f.area();
            let popup_width = (area.width * 60) / 100;
            let popup_height = 14.min(area.height);
            let x = (area.width - popup_width) / 2;
            let y = (area.height - popup_height) / 2;
            Rect::new(x, y, popup_width, popup_height)
        };
        f.render_widget(Clear, popup_area);

        let mut lines = vec![
            Line::from("j / Down      Next task"),
            Line::from("k / Up        Previous task"),
            Line::from("g / G         First / last task"),
            Line::from("f             Cycle status filter"),
            Line::from("r             Refresh now"),
            Line::from("h / ?         This help"),
            Line::from("q / Esc       Quit"),
            Line::from(""),
        ];
        lines.extend(TaskStatus::ALL.iter().map(|s| {
            Line::from(Span::styled(format_status(*s), Style::default().fg(self.theme.status(*s))))
        }));

        let popup = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help (any key to close)")
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(self.theme.accent).add_modifier(Modifier::BOLD)),
            )
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, popup_area);
    }

    /// Main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
            self.check_for_changes();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    const DAY: i64 = 86_400_000;

    fn write_fixture(dir: &Path) -> (PathBuf, PathBuf) {
        let source = dir.join("workbook.json");
        let config = dir.join("dashboard.json");
        let start = 20_000 * DAY;
        let workbook = serde_json::json!({
            "tables": [{
                "id": "tbl",
                "name": "Plan",
                "fields": [
                    {"id": "n", "name": "Task", "type": "text"},
                    {"id": "s", "name": "Start", "type": "date-time"},
                    {"id": "e", "name": "End", "type": "date-time"}
                ],
                "records": [
                    {"id": "r1", "fields": {"n": "Design", "s": start, "e": start + 10 * DAY}},
                    {"id": "r2", "fields": {"n": "Build", "s": start + 20 * DAY, "e": start + 30 * DAY}}
                ]
            }]
        });
        std::fs::write(&source, workbook.to_string()).unwrap();
        let cfg = serde_json::json!({
            "table_id": "tbl",
            "task_field_id": "n",
            "plan_start_field_id": "s",
            "plan_end_field_id": "e"
        });
        std::fs::write(&config, cfg.to_string()).unwrap();
        (source, config)
    }

    #[test]
    fn test_ready_view_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        let (source, config) = write_fixture(dir.path());
        let mut app = DashboardApp::new(&source, &config, Duration::from_secs(1), Some(20_005 * DAY));

        assert!(matches!(app.view, Some(DashboardView::Ready { .. })));
        assert_eq!(app.visible_tasks().len(), 2);
        assert_eq!(app.table_state.selected(), Some(0));

        app.filter = StatusFilter(Some(TaskStatus::NotStarted));
        app.clamp_selection();
        let names: Vec<&str> = app.visible_tasks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Build"]);

        app.move_selection(5);
        assert_eq!(app.table_state.selected(), Some(0));
    }

    #[test]
    fn test_missing_config_shows_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("workbook.json");
        let config = dir.path().join("dashboard.json");
        let mut app = DashboardApp::new(&source, &config, Duration::from_secs(1), None);
        assert!(matches!(app.view, Some(DashboardView::NeedsConfig { .. })));
        assert!(app.load_error.is_none());

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let text: String = terminal.backend().buffer().content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Dashboard not configured"));
    }

    #[test]
    fn test_broken_source_keeps_last_view() {
        let dir = tempfile::tempdir().unwrap();
        let (source, config) = write_fixture(dir.path());
        let mut app = DashboardApp::new(&source, &config, Duration::from_secs(1), Some(20_005 * DAY));

        std::fs::write(&source, "{ not json").unwrap();
        app.reload();
        assert!(app.load_error.is_some());
        assert_eq!(app.visible_tasks().len(), 2);

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
    }
}
