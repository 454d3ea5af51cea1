//! Enumerations for TUI state management.

use project_dashboard::display::format_status;
use project_dashboard::fields::TaskStatus;

/// Application state for the terminal user interface.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    Dashboard,
    Help,
}

/// Which tasks the table shows. `None` shows everything.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct StatusFilter(pub Option<TaskStatus>);

impl StatusFilter {
    /// Cycle all -> each status in order -> all.
    pub fn next(self) -> Self {
        match self.0 {
            None => StatusFilter(Some(TaskStatus::ALL[0])),
            Some(current) => {
                let idx = TaskStatus::ALL.iter().position(|s| *s == current).unwrap_or(0);
                StatusFilter(TaskStatus::ALL.get(idx + 1).copied())
            }
        }
    }

    pub fn matches(self, status: TaskStatus) -> bool {
        self.0.map_or(true, |s| s == status)
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            None => "All",
            Some(status) => format_status(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_cycles_through_every_status() {
        let mut filter = StatusFilter::default();
        let mut seen = Vec::new();
        for _ in 0..TaskStatus::ALL.len() {
            filter = filter.next();
            seen.push(filter.0.unwrap());
        }
        assert_eq!(seen, TaskStatus::ALL.to_vec());
        assert_eq!(filter.next(), StatusFilter(None));
    }

    #[test]
    fn test_filter_matches() {
        assert!(StatusFilter(None).matches(TaskStatus::Overdue));
        assert!(StatusFilter(Some(TaskStatus::Overdue)).matches(TaskStatus::Overdue));
        assert!(!StatusFilter(Some(TaskStatus::Overdue)).matches(TaskStatus::OverdueCompleted));
        assert_eq!(StatusFilter(None).label(), "All");
        assert_eq!(StatusFilter(Some(TaskStatus::OverdueCompleted)).label(), "Completed late");
    }
}
