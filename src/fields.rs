//! Enumerations and field types for the dashboard.
//!
//! This module defines the derived task statuses, the field types a data source can
//! declare, and the logical roles a source field can be mapped to.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Temporal status of a task, derived from its plan window and completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Overdue,
    Completed,
    OverdueCompleted,
}

impl TaskStatus {
    /// Every status, in display order.
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Overdue,
        TaskStatus::Completed,
        TaskStatus::OverdueCompleted,
    ];

    /// Whether the task has an actual completion instant.
    pub fn is_done(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::OverdueCompleted)
    }

    /// Whether the task ran (or is running) past its planned end.
    pub fn is_late(self) -> bool {
        matches!(self, TaskStatus::Overdue | TaskStatus::OverdueCompleted)
    }
}

/// Data type declared by a source field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Number,
    DateTime,
    Formula,
    SingleSelect,
    MultiSelect,
    Checkbox,
    User,
    Url,
    Attachment,
    #[serde(other)]
    Other,
}

/// Logical roles a source field can play for the dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Table,
    TaskName,
    PlanStart,
    PlanEnd,
    ActualEnd,
}

impl Role {
    /// Roles that bind to a field of the selected table.
    pub const FIELDS: [Role; 4] = [Role::TaskName, Role::PlanStart, Role::PlanEnd, Role::ActualEnd];

    /// Whether the dashboard can render anything without this role.
    pub fn is_required(self) -> bool {
        !matches!(self, Role::ActualEnd)
    }

    /// Whether this role holds a date-like value.
    pub fn is_date(self) -> bool {
        matches!(self, Role::PlanStart | Role::PlanEnd | Role::ActualEnd)
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Table => "table",
            Role::TaskName => "task name",
            Role::PlanStart => "plan start",
            Role::PlanEnd => "plan end",
            Role::ActualEnd => "actual end",
        }
    }
}

/// Metadata of one source field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDescriptor {
    pub fn new(id: &str, name: &str, field_type: FieldType) -> Self {
        FieldDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            field_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_groups() {
        let done: Vec<_> = TaskStatus::ALL.iter().filter(|s| s.is_done()).collect();
        assert_eq!(done, [&TaskStatus::Completed, &TaskStatus::OverdueCompleted]);
        let late: Vec<_> = TaskStatus::ALL.iter().filter(|s| s.is_late()).collect();
        assert_eq!(late, [&TaskStatus::Overdue, &TaskStatus::OverdueCompleted]);
    }

    #[test]
    fn test_field_type_deserialises_unknown_as_other() {
        let f: FieldDescriptor =
            serde_json::from_str(r#"{"id":"f1","name":"Owner","type":"lookup"}"#).unwrap();
        assert_eq!(f.field_type, FieldType::Other);
        let f: FieldDescriptor =
            serde_json::from_str(r#"{"id":"f2","name":"Due","type":"date-time"}"#).unwrap();
        assert_eq!(f.field_type, FieldType::DateTime);
    }

    #[test]
    fn test_status_serialises_snake_case() {
        let s = serde_json::to_string(&TaskStatus::OverdueCompleted).unwrap();
        assert_eq!(s, "\"overdue_completed\"");
    }
}
