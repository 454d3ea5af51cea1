//! # Project Dashboard
//!
//! Derives the temporal status of project tasks from rows of a tabular data source and
//! summarises them for display.
//!
//! ## Pipeline
//!
//! - **Value normalisation** ([`value`]): raw field values of heterogeneous shape become
//!   plain text and millisecond timestamps.
//! - **Task building** ([`builder`]): each raw record is mapped through a [`config::RoleMapping`]
//!   into a [`task::Task`]. Records without a name or plan window are dropped.
//! - **Classification** ([`classify`]): status, progress and delay are pure functions of the
//!   plan window, the actual completion instant and the evaluation instant.
//! - **Aggregation** ([`summary`]): per-status counts and the completion rate.
//! - **Field auto-matching** ([`matcher`]): a keyword guess used to pre-fill empty mappings.
//!
//! Everything above is synchronous and free of I/O. The data source ([`source`]), the
//! persisted configuration ([`config`]) and the evaluation clock ([`clock`]) sit at the
//! boundary, and [`dashboard`] wires them together for one refresh.
//!
//! ```
//! use project_dashboard::classify::classify;
//! use project_dashboard::fields::TaskStatus;
//!
//! let day = 86_400_000;
//! let c = classify(0, 9 * day, None, 4 * day);
//! assert_eq!(c.status, TaskStatus::InProgress);
//! assert!((c.progress - 4.0 / 9.0).abs() < 1e-9);
//! assert_eq!(c.delay_days, None);
//! ```

pub mod builder;
pub mod classify;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod fields;
pub mod matcher;
pub mod source;
pub mod summary;
pub mod task;
pub mod value;

pub use error::{Error, Result};
