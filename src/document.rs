//! File-backed column catalog.
//!
//! A document file describes the data source the form is bound to:
//!
//! ```yaml
//! table: Orders
//! tables:
//!   - id: Orders
//!     columns:
//!       - id: Customer
//!         type: Ref:Customers
//!       - id: Status
//!         type: Choice
//!         widget_options: '{"choices": ["open", "closed"]}'
//!   - id: Customers
//!     columns:
//!       - id: Name
//!         type: Text
//!     records:
//!       - id: 1
//!         Name: Acme
//! ```

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::catalog::{
    ColumnCatalog, MANUAL_SORT_COLUMN, ROW_ID_COLUMN, RawColumnDef, ReferenceChoice,
    is_internal_column,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableDef {
    pub id: String,
    #[serde(default)]
    pub columns: Vec<RawColumnDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<BTreeMap<String, Value>>,
}

impl TableDef {
    /// First column usable as a display label for this table's rows.
    pub fn label_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .map(|c| c.id.as_str())
            .find(|id| *id != ROW_ID_COLUMN && *id != MANUAL_SORT_COLUMN)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Table the form creates records in.
    pub table: String,
    pub tables: Vec<TableDef>,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening document file {path:?}"))?;
        let reader = BufReader::new(file);
        let document: Document =
            serde_yaml::from_reader(reader).context("Parsing document YAML")?;
        document.bound_table()?;
        Ok(document)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating document file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing document YAML")
    }

    pub fn table(&self, table_id: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    pub fn bound_table(&self) -> Result<&TableDef> {
        self.table(&self.table)
            .ok_or_else(|| anyhow!("Document does not define bound table '{}'", self.table))
    }
}

impl ColumnCatalog for Document {
    fn list_columns(&self) -> Result<Vec<String>> {
        Ok(self
            .bound_table()?
            .columns
            .iter()
            .filter(|c| !is_internal_column(&c.id))
            .map(|c| c.id.clone())
            .collect())
    }

    fn list_raw_column_defs(&self) -> Result<Vec<RawColumnDef>> {
        Ok(self.bound_table()?.columns.clone())
    }

    fn fetch_reference_choices(&self, table_id: &str) -> Result<Vec<ReferenceChoice>> {
        let table = self
            .table(table_id)
            .ok_or_else(|| anyhow!("Unknown reference table '{table_id}'"))?;
        let label_column = table.label_column();
        table
            .records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let id = record
                    .get(ROW_ID_COLUMN)
                    .and_then(Value::as_i64)
                    .ok_or_else(|| {
                        anyhow!("Record {} of table '{table_id}' has no integer id", idx + 1)
                    })?;
                let label = label_column
                    .and_then(|column| record.get(column))
                    .and_then(display_label)
                    .unwrap_or_else(|| id.to_string());
                Ok(ReferenceChoice { id, label })
            })
            .collect()
    }
}

fn display_label(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
