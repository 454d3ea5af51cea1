//! Persisted dashboard configuration.
//!
//! The configuration binds each [`Role`] to a source field and carries the display
//! palette. It is stored as a flat JSON document. Loading is forgiving: a missing file,
//! a corrupt file, a missing key or a value of the wrong type all fall back to defaults.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::fields::{Role, TaskStatus};
use crate::value::normalize_color;
use crate::Result;

pub const DEFAULT_ACCENT_COLOR: &str = "#3370FF";
pub const DEFAULT_COMPLETED_COLOR: &str = "#34C724";
pub const DEFAULT_IN_PROGRESS_COLOR: &str = "#FF8800";
pub const DEFAULT_OVERDUE_COLOR: &str = "#F54A45";
pub const DEFAULT_NOT_STARTED_COLOR: &str = "#8F959E";

/// Source field bound to each role. An empty string means unmapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    pub table_id: String,
    pub task_field_id: String,
    pub plan_start_field_id: String,
    pub plan_end_field_id: String,
    pub actual_end_field_id: String,
}

impl RoleMapping {
    /// The identifier bound to `role`, if any.
    pub fn get(&self, role: Role) -> Option<&str> {
        let id = match role {
            Role::Table => &self.table_id,
            Role::TaskName => &self.task_field_id,
            Role::PlanStart => &self.plan_start_field_id,
            Role::PlanEnd => &self.plan_end_field_id,
            Role::ActualEnd => &self.actual_end_field_id,
        };
        Some(id.as_str()).filter(|id| !id.is_empty())
    }

    fn slot_mut(&mut self, role: Role) -> &mut String {
        match role {
            Role::Table => &mut self.table_id,
            Role::TaskName => &mut self.task_field_id,
            Role::PlanStart => &mut self.plan_start_field_id,
            Role::PlanEnd => &mut self.plan_end_field_id,
            Role::ActualEnd => &mut self.actual_end_field_id,
        }
    }

    /// Bind a field role. Use [`RoleMapping::select_table`] for the table.
    pub fn set(&mut self, role: Role, id: &str) {
        if role == Role::Table {
            self.select_table(id);
        } else {
            *self.slot_mut(role) = id.trim().to_string();
        }
    }

    pub fn clear(&mut self, role: Role) {
        self.slot_mut(role).clear();
    }

    /// Select a table. Switching to a different table clears every field binding.
    pub fn select_table(&mut self, table_id: &str) {
        let table_id = table_id.trim();
        if self.table_id == table_id {
            return;
        }
        self.table_id = table_id.to_string();
        for role in Role::FIELDS {
            self.clear(role);
        }
    }

    /// Required roles that are still unmapped.
    pub fn missing_roles(&self) -> Vec<Role> {
        [Role::Table, Role::TaskName, Role::PlanStart, Role::PlanEnd]
            .into_iter()
            .filter(|r| self.get(*r).is_none())
            .collect()
    }

    /// Whether task name, plan start and plan end are mapped.
    pub fn has_required_fields(&self) -> bool {
        Role::FIELDS
            .iter()
            .filter(|r| r.is_required())
            .all(|r| self.get(*r).is_some())
    }

    /// Whether the dashboard has everything it needs to load tasks.
    pub fn is_complete(&self) -> bool {
        self.missing_roles().is_empty()
    }
}

/// Display colors, one per summary concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub accent_color: String,
    pub completed_color: String,
    pub in_progress_color: String,
    pub overdue_color: String,
    pub not_started_color: String,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            completed_color: DEFAULT_COMPLETED_COLOR.to_string(),
            in_progress_color: DEFAULT_IN_PROGRESS_COLOR.to_string(),
            overdue_color: DEFAULT_OVERDUE_COLOR.to_string(),
            not_started_color: DEFAULT_NOT_STARTED_COLOR.to_string(),
        }
    }
}

impl Palette {
    /// Color for a status. Late completions share the overdue color.
    pub fn status_color(&self, status: TaskStatus) -> &str {
        match status {
            TaskStatus::NotStarted => &self.not_started_color,
            TaskStatus::InProgress => &self.in_progress_color,
            TaskStatus::Overdue | TaskStatus::OverdueCompleted => &self.overdue_color,
            TaskStatus::Completed => &self.completed_color,
        }
    }

    /// Replace blank colors with the defaults.
    pub fn normalized(self) -> Self {
        Palette {
            accent_color: normalize_color(Some(&self.accent_color), DEFAULT_ACCENT_COLOR),
            completed_color: normalize_color(Some(&self.completed_color), DEFAULT_COMPLETED_COLOR),
            in_progress_color: normalize_color(Some(&self.in_progress_color), DEFAULT_IN_PROGRESS_COLOR),
            overdue_color: normalize_color(Some(&self.overdue_color), DEFAULT_OVERDUE_COLOR),
            not_started_color: normalize_color(Some(&self.not_started_color), DEFAULT_NOT_STARTED_COLOR),
        }
    }
}

/// Role mapping plus palette, persisted together as one flat document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(flatten)]
    pub mapping: RoleMapping,
    #[serde(flatten)]
    pub palette: Palette,
}

impl DashboardConfig {
    /// Load configuration from a JSON file, falling back to defaults if it is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return DashboardConfig::default();
        }
        match fs::read_to_string(path) {
            Ok(buf) => match serde_json::from_str::<Value>(&buf) {
                Ok(value) => DashboardConfig::from_value(&value),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "error parsing config, using defaults");
                    DashboardConfig::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "error reading config, using defaults");
                DashboardConfig::default()
            }
        }
    }

    /// Merge a partial stored document over the defaults.
    ///
    /// Keys that are missing or not strings take their default; blank colors revert to
    /// the default palette.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str);
        let id = |key: &str| text(key).map(|s| s.trim().to_string()).unwrap_or_default();
        let defaults = Palette::default();
        DashboardConfig {
            mapping: RoleMapping {
                table_id: id("table_id"),
                task_field_id: id("task_field_id"),
                plan_start_field_id: id("plan_start_field_id"),
                plan_end_field_id: id("plan_end_field_id"),
                actual_end_field_id: id("actual_end_field_id"),
            },
            palette: Palette {
                accent_color: normalize_color(text("accent_color"), &defaults.accent_color),
                completed_color: normalize_color(text("completed_color"), &defaults.completed_color),
                in_progress_color: normalize_color(text("in_progress_color"), &defaults.in_progress_color),
                overdue_color: normalize_color(text("overdue_color"), &defaults.overdue_color),
                not_started_color: normalize_color(text("not_started_color"), &defaults.not_started_color),
            },
        }
    }

    /// Save configuration to a JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let normalized = DashboardConfig {
            mapping: self.mapping.clone(),
            palette: self.palette.clone().normalized(),
        };
        let data = serde_json::to_string_pretty(&normalized)?;
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}
