//! Formatting helpers shared by the CLI and the TUI.

use chrono::{Local, TimeZone};

use crate::fields::TaskStatus;
use crate::summary::Summary;
use crate::task::{Task, Timestamp};

/// Format an instant as `YYYY-MM-DD` in local time, `--` when absent.
pub fn format_date(value: Option<Timestamp>) -> String {
    format_date_in(value, &Local)
}

/// Format an instant as `YYYY-MM-DD` in `tz`, `--` when absent or out of range.
pub fn format_date_in<Tz: TimeZone>(value: Option<Timestamp>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    value
        .and_then(|ms| tz.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "--".into())
}

/// Format a task status for display.
pub fn format_status(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::NotStarted => "Not started",
        TaskStatus::InProgress => "In progress",
        TaskStatus::Overdue => "Overdue",
        TaskStatus::Completed => "Completed",
        TaskStatus::OverdueCompleted => "Completed late",
    }
}

/// Delay note for late tasks ("3d overdue", "2d late").
pub fn delay_label(task: &Task) -> Option<String> {
    let days = task.delay_days?;
    match task.status {
        TaskStatus::Overdue => Some(format!("{days}d overdue")),
        _ => Some(format!("{days}d late")),
    }
}

/// Text progress bar of `width` cells.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Print the summary header.
pub fn print_summary(summary: &Summary, now: Timestamp) {
    println!("Project progress as of {}", format_date(Some(now)));
    println!(
        "Overall: {} {}%",
        progress_bar(summary.completion_rate as f64 / 100.0, 20),
        summary.completion_rate
    );
    println!(
        "Total {}  Completed {}  In progress {}  Overdue {}  Not started {}",
        summary.total, summary.completed, summary.in_progress, summary.overdue, summary.not_started
    );
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<4} {:<28} {:<10} {:<10} {:<10} {:<26} {}",
        "#", "Task", "Start", "End", "Done", "Status", "Progress"
    );
    for (i, t) in tasks.iter().enumerate() {
        let status = match delay_label(t) {
            Some(delay) => format!("{} ({})", format_status(t.status), delay),
            None => format_status(t.status).to_string(),
        };
        println!(
            "{:<4} {:<28} {:<10} {:<10} {:<10} {:<26} {} {:>3}%",
            i + 1,
            truncate(&t.name, 28),
            format_date(Some(t.plan_start)),
            format_date(Some(t.plan_end)),
            format_date(t.actual_end),
            status,
            progress_bar(t.progress, 10),
            t.progress_percent()
        );
    }
}

/// Render tasks as CSV, one row per task.
pub fn tasks_to_csv(tasks: &[Task]) -> String {
    let mut csv = String::from("ID,Task,PlanStart,PlanEnd,ActualEnd,Status,ProgressPercent,DelayDays\n");
    for t in tasks {
        let delay = t.delay_days.map(|d| d.to_string()).unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            escape_csv(&t.id),
            escape_csv(&t.name),
            format_date(Some(t.plan_start)),
            format_date(Some(t.plan_end)),
            format_date(t.actual_end),
            format_status(t.status),
            t.progress_percent(),
            delay
        ));
    }
    csv
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const DAY: i64 = 86_400_000;

    #[test]
    fn test_format_date() {
        let ms = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap().timestamp_millis();
        assert_eq!(format_date_in(Some(ms), &Utc), "2024-01-05");
        assert_eq!(format_date_in(None, &Utc), "--");
        assert_eq!(format_date(None), "--");
    }

    #[test]
    fn test_delay_label() {
        let overdue = Task::new("a", "A", 0, 10 * DAY, None, 13 * DAY).unwrap();
        assert_eq!(delay_label(&overdue).as_deref(), Some("3d overdue"));
        let late = Task::new("b", "B", 0, 10 * DAY, Some(12 * DAY), 13 * DAY).unwrap();
        assert_eq!(delay_label(&late).as_deref(), Some("2d late"));
        let on_time = Task::new("c", "C", 0, 10 * DAY, Some(9 * DAY), 13 * DAY).unwrap();
        assert_eq!(delay_label(&on_time), None);
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(0.5, 4), "██░░");
        assert_eq!(progress_bar(1.7, 4), "████");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Design", 10), "Design");
        assert_eq!(truncate("Implementation", 6), "Imple…");
    }

    #[test]
    fn test_tasks_to_csv_escapes() {
        let t = Task::new("r1", "Design, \"v2\"", 0, 10 * DAY, None, 5 * DAY).unwrap();
        let csv = tasks_to_csv(&[t]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("r1,\"Design, \"\"v2\"\"\","));
        assert!(row.ends_with(",In progress,50,"));
    }
}
