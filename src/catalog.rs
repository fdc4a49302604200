use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const ROW_ID_COLUMN: &str = "id";
pub const MANUAL_SORT_COLUMN: &str = "manualSort";
pub const HELPER_COLUMN_PREFIX: &str = "gristHelper";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawColumnDef {
    pub id: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_options: Option<String>,
}

impl RawColumnDef {
    pub fn new(id: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            widget_options: None,
        }
    }

    pub fn with_widget_options(mut self, raw: impl Into<String>) -> Self {
        self.widget_options = Some(raw.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceChoice {
    pub id: i64,
    pub label: String,
}

pub trait ColumnCatalog {
    fn list_columns(&self) -> Result<Vec<String>>;

    fn list_raw_column_defs(&self) -> Result<Vec<RawColumnDef>>;

    fn fetch_reference_choices(&self, table_id: &str) -> Result<Vec<ReferenceChoice>>;
}

pub fn is_internal_column(column_id: &str) -> bool {
    column_id == ROW_ID_COLUMN
        || column_id == MANUAL_SORT_COLUMN
        || column_id.starts_with(HELPER_COLUMN_PREFIX)
}

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    columns: Vec<RawColumnDef>,
    references: Vec<(String, Vec<ReferenceChoice>)>,
}

impl StaticCatalog {
    pub fn new(columns: Vec<RawColumnDef>) -> Self {
        Self {
            columns,
            references: Vec::new(),
        }
    }

    pub fn with_reference_table(
        mut self,
        table_id: impl Into<String>,
        choices: Vec<ReferenceChoice>,
    ) -> Self {
        self.references.push((table_id.into(), choices));
        self
    }
}

impl ColumnCatalog for StaticCatalog {
    fn list_columns(&self) -> Result<Vec<String>> {
        Ok(self
            .columns
            .iter()
            .filter(|c| !is_internal_column(&c.id))
            .map(|c| c.id.clone())
            .collect())
    }

    fn list_raw_column_defs(&self) -> Result<Vec<RawColumnDef>> {
        Ok(self.columns.clone())
    }

    fn fetch_reference_choices(&self, table_id: &str) -> Result<Vec<ReferenceChoice>> {
        self.references
            .iter()
            .find(|(id, _)| id == table_id)
            .map(|(_, choices)| choices.clone())
            .ok_or_else(|| anyhow::anyhow!("Unknown reference table '{table_id}'"))
    }
}
