//! Task data structure.
//!
//! This module defines the canonical `Task` built from one source record. Its status,
//! progress and delay are derived at construction from the plan window, the actual
//! completion instant and the evaluation instant, and never set independently.

use serde::Serialize;

use crate::classify::{classify, Classification};
use crate::fields::TaskStatus;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// A tracked work item with its derived temporal state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub plan_start: Timestamp,
    pub plan_end: Timestamp,
    pub actual_end: Option<Timestamp>,
    pub status: TaskStatus,
    pub progress: f64,
    pub delay_days: Option<u32>,
}

impl Task {
    /// Build a task evaluated at `now`. Returns `None` when `name` is empty.
    pub fn new(
        id: &str,
        name: &str,
        plan_start: Timestamp,
        plan_end: Timestamp,
        actual_end: Option<Timestamp>,
        now: Timestamp,
    ) -> Option<Self> {
        if name.is_empty() {
            return None;
        }
        let derived = classify(plan_start, plan_end, actual_end, now);
        Some(Task::with_classification(
            id.to_string(),
            name.to_string(),
            plan_start,
            plan_end,
            actual_end,
            derived,
        ))
    }

    /// Assemble a task from an already validated name and a classification of its window.
    pub fn with_classification(
        id: String,
        name: String,
        plan_start: Timestamp,
        plan_end: Timestamp,
        actual_end: Option<Timestamp>,
        derived: Classification,
    ) -> Self {
        Task {
            id,
            name,
            plan_start,
            plan_end,
            actual_end,
            status: derived.status,
            progress: derived.progress,
            delay_days: derived.delay_days,
        }
    }

    /// Progress as a whole percentage.
    pub fn progress_percent(&self) -> u8 {
        (self.progress * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Timestamp = 86_400_000;

    #[test]
    fn test_new_rejects_empty_name() {
        assert!(Task::new("r1", "", 0, DAY, None, 0).is_none());
    }

    #[test]
    fn test_new_derives_state() {
        let t = Task::new("r1", "Design", 0, 10 * DAY, None, 5 * DAY).unwrap();
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.progress_percent(), 50);
        assert_eq!(t.delay_days, None);

        let t = Task::new("r2", "Ship", 0, 10 * DAY, Some(13 * DAY), 5 * DAY).unwrap();
        assert_eq!(t.status, TaskStatus::OverdueCompleted);
        assert_eq!(t.progress_percent(), 100);
        assert_eq!(t.delay_days, Some(3));
    }
}
