//! Aggregate statistics over a task list.

use serde::Serialize;

use crate::fields::TaskStatus;
use crate::task::Task;

/// Per-status counts and the overall completion rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub overdue: usize,
    pub completed_on_time: usize,
    pub overdue_completed: usize,
    /// On-time plus late completions.
    pub completed: usize,
    /// Whole percentage of completed tasks, 0 for an empty list.
    pub completion_rate: u32,
}

impl Summary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut summary = Summary {
            total: tasks.len(),
            ..Summary::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::NotStarted => summary.not_started += 1,
                TaskStatus::InProgress => summary.in_progress += 1,
                TaskStatus::Overdue => summary.overdue += 1,
                TaskStatus::Completed => summary.completed_on_time += 1,
                TaskStatus::OverdueCompleted => summary.overdue_completed += 1,
            }
        }
        summary.completed = summary.completed_on_time + summary.overdue_completed;
        summary.completion_rate = completion_rate(summary.completed, summary.total);
        summary
    }

    /// Count for one status bucket.
    pub fn count(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::NotStarted => self.not_started,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Overdue => self.overdue,
            TaskStatus::Completed => self.completed_on_time,
            TaskStatus::OverdueCompleted => self.overdue_completed,
        }
    }
}

/// `round(100 * completed / total)` with halves rounded up, 0 when `total` is 0.
fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * completed + total) / (2 * total)) as u32
}
