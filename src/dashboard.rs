//! One dashboard refresh, and detection of when the next one is due.
//!
//! A refresh is always a full recomputation: fetch records, build and classify tasks,
//! aggregate. Nothing is carried over from the previous refresh.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{info, warn};

use crate::builder::build_tasks;
use crate::clock::Clock;
use crate::config::DashboardConfig;
use crate::fields::Role;
use crate::source::{RecordProvider, DEFAULT_PAGE_SIZE};
use crate::summary::Summary;
use crate::task::{Task, Timestamp};
use crate::Result;

/// What the dashboard should show after a refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    /// Required roles are unmapped; prompt for configuration.
    NeedsConfig { missing: Vec<Role> },
    /// The source was read but no record produced a valid task.
    Empty,
    Ready {
        tasks: Vec<Task>,
        summary: Summary,
        generated_at: Timestamp,
    },
}

impl DashboardView {
    pub fn tasks(&self) -> &[Task] {
        match self {
            DashboardView::Ready { tasks, .. } => tasks,
            _ => &[],
        }
    }
}

/// Refresh settings.
#[derive(Debug, Clone, Copy)]
pub struct Dashboard {
    page_size: usize,
}

impl Default for Dashboard {
    fn default() -> Self {
        Dashboard {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Dashboard {
    pub fn with_page_size(page_size: usize) -> Self {
        Dashboard { page_size }
    }

    /// Recompute the view from scratch.
    pub fn refresh<P, C>(&self, provider: &P, config: &DashboardConfig, clock: &C) -> Result<DashboardView>
    where
        P: RecordProvider + ?Sized,
        C: Clock + ?Sized,
    {
        let mapping = &config.mapping;
        if !mapping.is_complete() {
            return Ok(DashboardView::NeedsConfig {
                missing: mapping.missing_roles(),
            });
        }
        let records = provider.fetch_records(&mapping.table_id, self.page_size)?;
        let now = clock.now();
        let tasks = build_tasks(&records, mapping, now);
        info!(records = records.len(), tasks = tasks.len(), "dashboard refreshed");
        if tasks.is_empty() {
            warn!(table = %mapping.table_id, "no valid tasks found");
            return Ok(DashboardView::Empty);
        }
        let summary = Summary::from_tasks(&tasks);
        Ok(DashboardView::Ready {
            tasks,
            summary,
            generated_at: now,
        })
    }
}

/// Tracks modification times of the files a view depends on.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    watched: Vec<(PathBuf, Option<SystemTime>)>,
}

impl ChangeDetector {
    /// Start watching `paths`, taking their current state as the baseline.
    pub fn new<I: IntoIterator<Item = PathBuf>>(paths: I) -> Self {
        ChangeDetector {
            watched: paths
                .into_iter()
                .map(|p| {
                    let seen = modified(&p);
                    (p, seen)
                })
                .collect(),
        }
    }

    /// Whether any watched file appeared, vanished or was modified since the last poll.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for (path, seen) in self.watched.iter_mut() {
            let current = modified(path);
            if current != *seen {
                info!(path = %path.display(), "change detected");
                *seen = current;
                changed = true;
            }
        }
        changed
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
