//! Error types for the boundary layer.
//!
//! The derivation core never fails; only reading the data source and persisting the
//! configuration can.

use thiserror::Error;

use crate::fields::Role;

/// Result alias used by boundary operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Reading or writing a file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document could not be parsed or produced.
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured table does not exist in the data source.
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    /// Required roles are not mapped to any field.
    #[error("Incomplete field mapping, missing: {}", format_roles(.0))]
    IncompleteMapping(Vec<Role>),
}

fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>()
        .join(", ")
}
