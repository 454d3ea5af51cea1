//! Dashboard TUI entry point and setup.

use std::{io, path::Path, time::Duration};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use project_dashboard::task::Timestamp;

use crate::tui::app::DashboardApp;

/// Initialise and run the dashboard terminal user interface.
/// `fixed_now` pins the evaluation instant; otherwise the system clock is read on each refresh.
pub fn run_dashboard_tui(
    source_path: &Path,
    config_path: &Path,
    poll_interval: Duration,
    fixed_now: Option<Timestamp>,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = DashboardApp::new(source_path, config_path, poll_interval, fixed_now);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
