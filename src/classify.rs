//! Status, progress and delay derivation.
//!
//! All functions take the evaluation instant explicitly, so the same inputs always give
//! the same answer. Results are time-relative and must be recomputed whenever `now`
//! moves.

use chrono::{Local, TimeZone};

use crate::fields::TaskStatus;
use crate::task::Timestamp;

/// Milliseconds in one day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Everything derived for one task at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: TaskStatus,
    pub progress: f64,
    pub delay_days: Option<u32>,
}

/// Derive status, progress and delay for a plan window evaluated at `now`.
/// Delay days are counted on the local calendar.
pub fn classify(
    plan_start: Timestamp,
    plan_end: Timestamp,
    actual_end: Option<Timestamp>,
    now: Timestamp,
) -> Classification {
    classify_in(plan_start, plan_end, actual_end, now, &Local)
}

/// Same as [`classify`], counting delay days on the calendar of `tz`.
pub fn classify_in<Tz: TimeZone>(
    plan_start: Timestamp,
    plan_end: Timestamp,
    actual_end: Option<Timestamp>,
    now: Timestamp,
    tz: &Tz,
) -> Classification {
    let status = derive_status(plan_start, plan_end, actual_end, now);
    Classification {
        status,
        progress: derive_progress(plan_start, plan_end, actual_end, now),
        delay_days: derive_delay_days_in(plan_end, actual_end, status, now, tz),
    }
}

/// Derive the status. A recorded completion always wins over the calendar.
pub fn derive_status(
    plan_start: Timestamp,
    plan_end: Timestamp,
    actual_end: Option<Timestamp>,
    now: Timestamp,
) -> TaskStatus {
    if let Some(actual) = actual_end {
        return if actual > plan_end {
            TaskStatus::OverdueCompleted
        } else {
            TaskStatus::Completed
        };
    }
    if now < plan_start {
        TaskStatus::NotStarted
    } else if now > plan_end {
        TaskStatus::Overdue
    } else {
        TaskStatus::InProgress
    }
}

/// Derive elapsed progress through the plan window, in `[0, 1]`.
///
/// Completed tasks are at 1. A zero-length or inverted window jumps from 0 to 1
/// at `plan_end`.
pub fn derive_progress(
    plan_start: Timestamp,
    plan_end: Timestamp,
    actual_end: Option<Timestamp>,
    now: Timestamp,
) -> f64 {
    if actual_end.is_some() {
        return 1.0;
    }
    if plan_end <= plan_start {
        return if now >= plan_end { 1.0 } else { 0.0 };
    }
    let ratio = (now as f64 - plan_start as f64) / (plan_end as f64 - plan_start as f64);
    ratio.clamp(0.0, 1.0)
}

/// Derive whole days past `plan_end` for late tasks, on the local calendar.
///
/// Overdue tasks count up to `now`, late completions up to `actual_end`. Anything
/// under one whole day is not reported.
pub fn derive_delay_days(
    plan_end: Timestamp,
    actual_end: Option<Timestamp>,
    status: TaskStatus,
    now: Timestamp,
) -> Option<u32> {
    derive_delay_days_in(plan_end, actual_end, status, now, &Local)
}

/// Same as [`derive_delay_days`] on the calendar of `tz`. A day that gains or loses an
/// hour to a UTC offset change still counts as one day.
pub fn derive_delay_days_in<Tz: TimeZone>(
    plan_end: Timestamp,
    actual_end: Option<Timestamp>,
    status: TaskStatus,
    now: Timestamp,
    tz: &Tz,
) -> Option<u32> {
    if !status.is_late() {
        return None;
    }
    let end = actual_end.unwrap_or(now);
    let days = wall_clock_days(plan_end, end, tz);
    if days > 0 {
        Some(u32::try_from(days).unwrap_or(u32::MAX))
    } else {
        None
    }
}

/// Whole days between two instants, measured on the wall clock of `tz`.
fn wall_clock_days<Tz: TimeZone>(from: Timestamp, to: Timestamp, tz: &Tz) -> i64 {
    let local = |ms: Timestamp| tz.timestamp_millis_opt(ms).single().map(|dt| dt.naive_local());
    match (local(from), local(to)) {
        (Some(a), Some(b)) => (b - a).num_milliseconds().div_euclid(MS_PER_DAY),
        _ => to.saturating_sub(from).div_euclid(MS_PER_DAY),
    }
}
