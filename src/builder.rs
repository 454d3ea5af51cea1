//! Building canonical tasks from raw records.
//!
//! Each record is read through the [`RoleMapping`]: the name is extracted as text, the
//! plan window and the optional completion are parsed as dates, and the result is
//! classified at the evaluation instant. Records that cannot produce a valid task are
//! dropped, never represented as partial tasks.

use std::collections::HashMap;

use chrono::{Local, TimeZone};
use serde::Deserialize;
use tracing::debug;

use crate::classify::classify_in;
use crate::config::RoleMapping;
use crate::fields::Role;
use crate::task::{Task, Timestamp};
use crate::value::{extract_text, parse_date_value_in, RawFieldValue};

/// One row of the data source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub fields: HashMap<String, RawFieldValue>,
}

impl RawRecord {
    pub fn new(id: &str) -> Self {
        RawRecord {
            id: id.to_string(),
            fields: HashMap::new(),
        }
    }

    /// Builder-style helper to attach a field value.
    pub fn with(mut self, field_id: &str, value: impl Into<RawFieldValue>) -> Self {
        self.fields.insert(field_id.to_string(), value.into());
        self
    }

    /// Value of the field bound to `role`, if the role is mapped and the cell is present.
    fn value_for(&self, mapping: &RoleMapping, role: Role) -> Option<&RawFieldValue> {
        mapping.get(role).and_then(|id| self.fields.get(id))
    }
}

/// Why a record did not become a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    UnmappedRoles,
    EmptyName,
    InvalidPlanStart,
    InvalidPlanEnd,
}

/// Build one task, reading wall-clock dates in `tz`.
pub fn build_task<Tz: TimeZone>(
    record: &RawRecord,
    mapping: &RoleMapping,
    now: Timestamp,
    tz: &Tz,
) -> Result<Task, DropReason> {
    if !mapping.has_required_fields() {
        return Err(DropReason::UnmappedRoles);
    }
    let date = |role: Role| {
        record
            .value_for(mapping, role)
            .and_then(|v| parse_date_value_in(v, tz))
    };

    let name = record
        .value_for(mapping, Role::TaskName)
        .map(extract_text)
        .unwrap_or_default();
    if name.is_empty() {
        return Err(DropReason::EmptyName);
    }
    let plan_start = date(Role::PlanStart).ok_or(DropReason::InvalidPlanStart)?;
    let plan_end = date(Role::PlanEnd).ok_or(DropReason::InvalidPlanEnd)?;
    let actual_end = date(Role::ActualEnd);

    let derived = classify_in(plan_start, plan_end, actual_end, now, tz);
    Ok(Task::with_classification(record.id.clone(), name, plan_start, plan_end, actual_end, derived))
}

/// Build every well-formed task, sorted by plan start. Dates are read in local time.
pub fn build_tasks(records: &[RawRecord], mapping: &RoleMapping, now: Timestamp) -> Vec<Task> {
    build_tasks_in(records, mapping, now, &Local)
}

/// Build every well-formed task, sorted by plan start, reading dates in `tz`.
pub fn build_tasks_in<Tz: TimeZone>(
    records: &[RawRecord],
    mapping: &RoleMapping,
    now: Timestamp,
    tz: &Tz,
) -> Vec<Task> {
    if !mapping.has_required_fields() {
        debug!("required roles unmapped, no tasks built");
        return Vec::new();
    }
    let mut tasks: Vec<Task> = records
        .iter()
        .filter_map(|record| match build_task(record, mapping, now, tz) {
            Ok(task) => Some(task),
            Err(reason) => {
                debug!(record = %record.id, ?reason, "dropping record");
                None
            }
        })
        .collect();
    tasks.sort_by_key(|t| t.plan_start);
    tasks
}
