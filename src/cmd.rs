//! Command implementations for the CLI interface.
//!
//! This module contains the handlers behind each subcommand: inspecting the source,
//! editing the persisted field mapping, printing and exporting the computed dashboard,
//! and launching the TUI.

use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;
use clap_complete::{generate, Shell};

use project_dashboard::clock::{Clock, FixedClock, SystemClock};
use project_dashboard::config::DashboardConfig;
use project_dashboard::dashboard::{Dashboard, DashboardView};
use project_dashboard::display::*;
use project_dashboard::fields::{FieldDescriptor, Role, TaskStatus};
use project_dashboard::matcher::{auto_fill, field_options, KeywordRules};
use project_dashboard::source::{FieldMetadataProvider, TableMeta, Workbook};
use project_dashboard::task::{Task, Timestamp};
use project_dashboard::value::{parse_date_value, RawFieldValue};

use crate::tui::run::run_dashboard_tui;

/// File locations for one invocation.
pub struct Paths {
    pub source: PathBuf,
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive dashboard.
    Ui {
        /// Seconds between checks for source or configuration changes.
        #[arg(long, default_value_t = 2)]
        poll_secs: u64,
        /// Evaluate at this date instead of the current time.
        #[arg(long)]
        now: Option<String>,
    },

    /// Print the summary and the task table.
    Show {
        /// Evaluate at this date instead of the current time.
        #[arg(long)]
        now: Option<String>,
        /// Only list tasks with this status.
        #[arg(long, value_enum)]
        status: Option<TaskStatus>,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print only the summary.
    Summary {
        /// Evaluate at this date instead of the current time.
        #[arg(long)]
        now: Option<String>,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List tables in the source.
    Tables,

    /// List fields of the configured (or given) table.
    Fields {
        /// Only fields offered for this role.
        #[arg(long, value_enum)]
        role: Option<Role>,
        /// Table ID or name, instead of the configured one.
        #[arg(long)]
        table: Option<String>,
    },

    /// Manage the dashboard configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Export computed tasks to CSV format.
    Export {
        /// Output file path (default: dashboard.csv)
        #[arg(long, short)]
        output: Option<String>,
        /// Evaluate at this date instead of the current time.
        #[arg(long)]
        now: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current configuration.
    Show,
    /// Update bindings and colors. Tables and fields accept an ID or a name.
    Set {
        /// Source table. Switching tables clears every field binding.
        #[arg(long)]
        table: Option<String>,
        /// Field holding the task name.
        #[arg(long)]
        task: Option<String>,
        /// Field holding the planned start.
        #[arg(long)]
        plan_start: Option<String>,
        /// Field holding the planned end.
        #[arg(long)]
        plan_end: Option<String>,
        /// Field holding the actual completion (optional).
        #[arg(long)]
        actual_end: Option<String>,
        /// Unbind the actual completion field.
        #[arg(long)]
        clear_actual_end: bool,
        #[arg(long)]
        accent_color: Option<String>,
        #[arg(long)]
        completed_color: Option<String>,
        #[arg(long)]
        in_progress_color: Option<String>,
        #[arg(long)]
        overdue_color: Option<String>,
        #[arg(long)]
        not_started_color: Option<String>,
    },
    /// Fill empty roles by matching field names against keywords.
    AutoMatch,
    /// Restore the default configuration.
    Reset,
}

/// Launch the terminal user interface.
pub fn cmd_ui(paths: &Paths, poll_secs: u64, now: Option<String>) {
    let fixed_now = now.map(|s| parse_now(&s));
    let poll = Duration::from_secs(poll_secs.max(1));
    if let Err(e) = run_dashboard_tui(&paths.source, &paths.config, poll, fixed_now) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Print the summary and the task table.
pub fn cmd_show(paths: &Paths, now: Option<String>, status: Option<TaskStatus>, limit: Option<usize>, json: bool) {
    let (tasks, summary, generated_at) = match load_view(paths, now) {
        DashboardView::Ready { tasks, summary, generated_at } => (tasks, summary, generated_at),
        view => {
            report_unready(&view);
            return;
        }
    };

    let mut filtered: Vec<&Task> = tasks
        .iter()
        .filter(|t| status.map_or(true, |s| t.status == s))
        .collect();
    if let Some(n) = limit {
        filtered.truncate(n);
    }

    if json {
        print_json(&serde_json::json!({
            "generated_at": generated_at,
            "summary": summary,
            "tasks": filtered,
        }));
    } else {
        print_summary(&summary, generated_at);
        println!();
        print_table(&filtered);
    }
}

/// Print only the summary.
pub fn cmd_summary(paths: &Paths, now: Option<String>, json: bool) {
    let (summary, generated_at) = match load_view(paths, now) {
        DashboardView::Ready { summary, generated_at, .. } => (summary, generated_at),
        view => {
            report_unready(&view);
            return;
        }
    };
    if json {
        print_json(&summary);
    } else {
        print_summary(&summary, generated_at);
    }
}

/// List the tables of the source, marking the selected one.
pub fn cmd_tables(paths: &Paths) {
    let workbook = load_workbook(paths);
    let config = DashboardConfig::load(&paths.config);
    let tables = workbook.list_tables().unwrap_or_else(|e| fail(e));
    if tables.is_empty() {
        println!("No tables found.");
        return;
    }
    println!("  {:<20} {}", "ID", "Name");
    for table in tables {
        let marker = if table.id == config.mapping.table_id { "*" } else { " " };
        println!("{} {:<20} {}", marker, truncate(&table.id, 20), table.name);
    }
}

/// List fields with their type and the roles bound to them.
pub fn cmd_fields(paths: &Paths, role: Option<Role>, table: Option<String>) {
    let workbook = load_workbook(paths);
    let config = DashboardConfig::load(&paths.config);
    let table_id = match table {
        Some(identifier) => resolve_table(&workbook, &identifier),
        None => config.mapping.table_id.clone(),
    };
    if table_id.is_empty() {
        eprintln!("No table selected. Use --table or `pdash config set --table <table>`.");
        std::process::exit(1);
    }
    let fields = workbook.list_fields(&table_id).unwrap_or_else(|e| fail(e));
    let shown: Vec<&FieldDescriptor> = match role {
        Some(r) => field_options(&fields, r),
        None => fields.iter().collect(),
    };
    if shown.is_empty() {
        println!("No matching fields.");
        return;
    }

    println!("{:<16} {:<24} {:<14} {}", "ID", "Name", "Type", "Bound to");
    for field in shown {
        let bound: Vec<&str> = Role::FIELDS
            .iter()
            .filter(|r| table_id == config.mapping.table_id && config.mapping.get(**r) == Some(field.id.as_str()))
            .map(|r| r.label())
            .collect();
        println!(
            "{:<16} {:<24} {:<14} {}",
            truncate(&field.id, 16),
            truncate(&field.name, 24),
            format!("{:?}", field.field_type),
            if bound.is_empty() { "-".to_string() } else { bound.join(", ") }
        );
    }
}

/// Handle configuration commands.
pub fn cmd_config(paths: &Paths, action: ConfigAction) {
    match action {
        ConfigAction::Show => {
            let config = DashboardConfig::load(&paths.config);
            let fields = Workbook::load(&paths.source)
                .ok()
                .and_then(|wb| wb.list_fields(&config.mapping.table_id).ok())
                .unwrap_or_default();
            let describe = |role: Role| match config.mapping.get(role) {
                None => "-".to_string(),
                Some(id) => match fields.iter().find(|f| f.id == id) {
                    Some(f) if role != Role::Table => format!("{} ({})", id, f.name),
                    _ => id.to_string(),
                },
            };
            println!("Config file:       {}", paths.config.display());
            println!("Table:             {}", describe(Role::Table));
            println!("Task name:         {}", describe(Role::TaskName));
            println!("Plan start:        {}", describe(Role::PlanStart));
            println!("Plan end:          {}", describe(Role::PlanEnd));
            println!("Actual end:        {}", describe(Role::ActualEnd));
            println!("Accent color:      {}", config.palette.accent_color);
            println!("Completed color:   {}", config.palette.completed_color);
            println!("In progress color: {}", config.palette.in_progress_color);
            println!("Overdue color:     {}", config.palette.overdue_color);
            println!("Not started color: {}", config.palette.not_started_color);
            report_missing(&config);
        },

        ConfigAction::Set {
            table, task, plan_start, plan_end, actual_end, clear_actual_end,
            accent_color, completed_color, in_progress_color, overdue_color, not_started_color,
        } => {
            let mut config = DashboardConfig::load(&paths.config);
            let needs_source = table.is_some() || task.is_some() || plan_start.is_some()
                || plan_end.is_some() || actual_end.is_some();
            let mut table_changed = false;

            if needs_source {
                let workbook = load_workbook(paths);
                if let Some(identifier) = table {
                    let table_id = resolve_table(&workbook, &identifier);
                    table_changed = table_id != config.mapping.table_id;
                    config.mapping.select_table(&table_id);
                }
                if config.mapping.table_id.is_empty() {
                    eprintln!("No table selected. Use --table to pick one first.");
                    std::process::exit(1);
                }
                let fields = workbook.list_fields(&config.mapping.table_id).unwrap_or_else(|e| fail(e));
                for (role, identifier) in [
                    (Role::TaskName, task),
                    (Role::PlanStart, plan_start),
                    (Role::PlanEnd, plan_end),
                    (Role::ActualEnd, actual_end),
                ] {
                    if let Some(identifier) = identifier {
                        let field_id = resolve_field(&fields, &identifier);
                        config.mapping.set(role, &field_id);
                    }
                }
                if table_changed {
                    let filled = auto_fill(&mut config.mapping, &fields, &KeywordRules::default());
                    report_filled(&filled);
                }
            }

            if clear_actual_end {
                config.mapping.clear(Role::ActualEnd);
            }
            let palette = &mut config.palette;
            for (slot, value) in [
                (&mut palette.accent_color, accent_color),
                (&mut palette.completed_color, completed_color),
                (&mut palette.in_progress_color, in_progress_color),
                (&mut palette.overdue_color, overdue_color),
                (&mut palette.not_started_color, not_started_color),
            ] {
                if let Some(value) = value {
                    *slot = value;
                }
            }

            save_config(paths, &config);
            println!("Saved configuration to {}", paths.config.display());
            report_missing(&config);
        },

        ConfigAction::AutoMatch => {
            let mut config = DashboardConfig::load(&paths.config);
            if config.mapping.table_id.is_empty() {
                eprintln!("No table selected. Use `pdash config set --table <table>` first.");
                std::process::exit(1);
            }
            let workbook = load_workbook(paths);
            let fields = workbook.list_fields(&config.mapping.table_id).unwrap_or_else(|e| fail(e));
            let filled = auto_fill(&mut config.mapping, &fields, &KeywordRules::default());
            if filled.is_empty() {
                println!("No empty role matched a field name.");
                return;
            }
            save_config(paths, &config);
            report_filled(&filled);
            report_missing(&config);
        },

        ConfigAction::Reset => {
            save_config(paths, &DashboardConfig::default());
            println!("Configuration reset to defaults.");
        },
    }
}

/// Export computed tasks to CSV format.
pub fn cmd_export(paths: &Paths, output: Option<String>, now: Option<String>) {
    let output_path = output.unwrap_or_else(|| "dashboard.csv".to_string());
    let view = load_view(paths, now);
    if let DashboardView::NeedsConfig { missing } = view {
        fail::<()>(project_dashboard::Error::IncompleteMapping(missing));
        return;
    }
    let tasks = view.tasks();

    match std::fs::write(&output_path, tasks_to_csv(tasks)) {
        Ok(_) => {
            println!("Exported {} task(s) to {}", tasks.len(), output_path);
        },
        Err(e) => {
            eprintln!("Failed to write CSV file: {}", e);
            std::process::exit(1);
        }
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Parse a `--now` argument with the same rules as source dates.
pub fn parse_now(input: &str) -> Timestamp {
    match parse_date_value(&RawFieldValue::from(input)) {
        Some(ts) => ts,
        None => {
            eprintln!("Could not parse date '{}'. Use YYYY-MM-DD.", input);
            std::process::exit(1);
        }
    }
}

fn load_view(paths: &Paths, now: Option<String>) -> DashboardView {
    let config = DashboardConfig::load(&paths.config);
    let clock: Box<dyn Clock> = match now {
        Some(s) => Box::new(FixedClock(parse_now(&s))),
        None => Box::new(SystemClock),
    };
    if !config.mapping.is_complete() {
        return DashboardView::NeedsConfig { missing: config.mapping.missing_roles() };
    }
    let workbook = load_workbook(paths);
    Dashboard::default()
        .refresh(&workbook, &config, clock.as_ref())
        .unwrap_or_else(|e| fail(e))
}

fn load_workbook(paths: &Paths) -> Workbook {
    match Workbook::load(&paths.source) {
        Ok(wb) => wb,
        Err(e) => {
            eprintln!("Failed to load source {}: {}", paths.source.display(), e);
            std::process::exit(1);
        }
    }
}

fn save_config(paths: &Paths, config: &DashboardConfig) {
    if let Err(e) = config.save(&paths.config) {
        eprintln!("Failed to save configuration: {e}");
        std::process::exit(1);
    }
}

fn fail<T>(e: project_dashboard::Error) -> T {
    eprintln!("Error: {e}");
    std::process::exit(1);
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("Failed to encode JSON: {e}");
            std::process::exit(1);
        }
    }
}

fn report_unready(view: &DashboardView) {
    match view {
        DashboardView::NeedsConfig { missing } => {
            let roles: Vec<&str> = missing.iter().map(|r| r.label()).collect();
            println!("Dashboard is not configured yet (missing: {}).", roles.join(", "));
            println!("Run `pdash config set --table <table>` to choose a table and match its fields.");
        },
        DashboardView::Empty => {
            println!("No valid tasks found. Every record needs a name, a plan start and a plan end.");
        },
        DashboardView::Ready { .. } => {},
    }
}

fn report_missing(config: &DashboardConfig) {
    let missing = config.mapping.missing_roles();
    if !missing.is_empty() {
        let roles: Vec<&str> = missing.iter().map(|r| r.label()).collect();
        println!("Still missing: {}", roles.join(", "));
    }
}

fn report_filled(filled: &[Role]) {
    for role in filled {
        println!("Auto-matched {}", role.label());
    }
}

fn resolve_table(workbook: &Workbook, identifier: &str) -> String {
    let tables = workbook.list_tables().unwrap_or_else(|e| fail(e));
    resolve_identifier(identifier, &tables, |t: &TableMeta| (&t.id, &t.name), "table")
        .unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(1);
        })
}

fn resolve_field(fields: &[FieldDescriptor], identifier: &str) -> String {
    resolve_identifier(identifier, fields, |f: &FieldDescriptor| (&f.id, &f.name), "field")
        .unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(1);
        })
}

/// Resolve an identifier (either ID or name) to an ID.
/// Returns an error if the name has multiple matches and suggests using the ID instead.
pub fn resolve_identifier<T>(
    identifier: &str,
    items: &[T],
    id_and_name: impl Fn(&T) -> (&String, &String),
    what: &str,
) -> Result<String, String> {
    let identifier = identifier.trim();
    if let Some(item) = items.iter().find(|i| id_and_name(i).0 == identifier) {
        return Ok(id_and_name(item).0.clone());
    }

    // Search by name (case-insensitive)
    let wanted = identifier.to_lowercase();
    let matches: Vec<&T> = items
        .iter()
        .filter(|i| id_and_name(i).1.to_lowercase() == wanted)
        .collect();

    match matches.len() {
        0 => Err(format!("No {} found with ID or name '{}'", what, identifier)),
        1 => Ok(id_and_name(matches[0]).0.clone()),
        _ => {
            let mut error_msg = format!("Multiple {}s found with name '{}':\n", what, identifier);
            for item in matches {
                let (id, name) = id_and_name(item);
                error_msg.push_str(&format!("  ID {}: {}\n", id, name));
            }
            error_msg.push_str("Please use the specific ID instead.");
            Err(error_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use project_dashboard::fields::FieldType;

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("f1", "Start", FieldType::DateTime),
            FieldDescriptor::new("f2", "Task", FieldType::Text),
            FieldDescriptor::new("f3", "task", FieldType::Text),
        ]
    }

    fn resolve(identifier: &str) -> Result<String, String> {
        resolve_identifier(identifier, &fields(), |f: &FieldDescriptor| (&f.id, &f.name), "field")
    }

    #[test]
    fn test_resolve_identifier_by_id_and_name() {
        assert_eq!(resolve("f2"), Ok("f2".to_string()));
        assert_eq!(resolve(" start "), Ok("f1".to_string()));
    }

    #[test]
    fn test_resolve_identifier_errors() {
        assert!(resolve("Budget").unwrap_err().starts_with("No field found"));
        let err = resolve("TASK").unwrap_err();
        assert!(err.contains("ID f2: Task"));
        assert!(err.contains("ID f3: task"));
    }
}
