//! Data source boundary.
//!
//! The dashboard reads records and field metadata through two traits so that any tabular
//! store can back it. [`Workbook`] implements both over a JSON snapshot of a base:
//!
//! ```json
//! { "tables": [ { "id": "tbl1", "name": "Plan",
//!     "fields": [ { "id": "f1", "name": "Task", "type": "text" } ],
//!     "records": [ { "id": "rec1", "fields": { "f1": "Design" } } ] } ] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::RawRecord;
use crate::fields::FieldDescriptor;
use crate::{Error, Result};

/// Records fetched per refresh.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Identifier and display name of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    pub id: String,
    pub name: String,
}

/// Supplies raw records for a table.
pub trait RecordProvider {
    /// Fetch at most `limit` records of `table_id`.
    fn fetch_records(&self, table_id: &str, limit: usize) -> Result<Vec<RawRecord>>;
}

/// Supplies table and field metadata.
pub trait FieldMetadataProvider {
    fn list_tables(&self) -> Result<Vec<TableMeta>>;
    fn list_fields(&self, table_id: &str) -> Result<Vec<FieldDescriptor>>;
}

/// One table of a workbook snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkbookTable {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub records: Vec<RawRecord>,
}

/// A JSON snapshot of a base, used as record and metadata provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub tables: Vec<WorkbookTable>,
}

impl Workbook {
    /// Load a workbook snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let buf = fs::read_to_string(path)?;
        let workbook = Workbook::from_json(&buf)?;
        debug!(path = %path.display(), tables = workbook.tables.len(), "loaded workbook");
        Ok(workbook)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn table(&self, table_id: &str) -> Result<&WorkbookTable> {
        self.tables
            .iter()
            .find(|t| t.id == table_id)
            .ok_or_else(|| Error::TableNotFound(table_id.to_string()))
    }
}

impl RecordProvider for Workbook {
    fn fetch_records(&self, table_id: &str, limit: usize) -> Result<Vec<RawRecord>> {
        let table = self.table(table_id)?;
        let records: Vec<RawRecord> = table.records.iter().take(limit).cloned().collect();
        debug!(table = table_id, count = records.len(), "fetched records");
        Ok(records)
    }
}

impl FieldMetadataProvider for Workbook {
    fn list_tables(&self) -> Result<Vec<TableMeta>> {
        Ok(self
            .tables
            .iter()
            .map(|t| TableMeta {
                id: t.id.clone(),
                name: t.name.clone(),
            })
            .collect())
    }

    fn list_fields(&self, table_id: &str) -> Result<Vec<FieldDescriptor>> {
        Ok(self.table(table_id)?.fields.clone())
    }
}
