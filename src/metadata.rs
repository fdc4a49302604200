//! Column metadata resolution.
//!
//! Derives, per catalog column, the normalized descriptor the rest of the
//! engine works from: the type class of the column, its enumerated choices,
//! its reference target and the rows offered by that target.
//!
//! ## Type tags
//!
//! | Tag | Kind |
//! |---|---|
//! | `Bool` | [`ColumnKind::Bool`] |
//! | `Date` | [`ColumnKind::Date`] |
//! | `DateTime`, `DateTime:<zone>` | [`ColumnKind::DateTime`] |
//! | `Numeric` | [`ColumnKind::Numeric`] |
//! | `Int` | [`ColumnKind::Int`] |
//! | `Choice` | [`ColumnKind::Choice`] |
//! | `ChoiceList` | [`ColumnKind::ChoiceList`] |
//! | `Ref:<table>` | [`ColumnKind::Ref`] |
//! | `RefList:<table>` | [`ColumnKind::RefList`] |
//! | `Text` | [`ColumnKind::Text`] |
//! | anything else | [`ColumnKind::Other`] (handled as plain text) |

use std::{collections::BTreeMap, fmt};

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::{
    catalog::{ColumnCatalog, RawColumnDef, ReferenceChoice},
    data::InputShape,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Bool,
    Date,
    DateTime,
    Numeric,
    Int,
    Choice,
    ChoiceList,
    Ref(String),
    RefList(String),
    Other(String),
}

impl ColumnKind {
    pub fn from_type_tag(tag: &str) -> Self {
        let tag = tag.trim();
        if let Some(table) = tag.strip_prefix("RefList:") {
            return ColumnKind::RefList(table.to_string());
        }
        if let Some(table) = tag.strip_prefix("Ref:") {
            return ColumnKind::Ref(table.to_string());
        }
        match tag {
            "Text" => ColumnKind::Text,
            "Bool" => ColumnKind::Bool,
            "Date" => ColumnKind::Date,
            "Numeric" => ColumnKind::Numeric,
            "Int" => ColumnKind::Int,
            "Choice" => ColumnKind::Choice,
            "ChoiceList" => ColumnKind::ChoiceList,
            other if other == "DateTime" || other.starts_with("DateTime:") => {
                ColumnKind::DateTime
            }
            other => ColumnKind::Other(other.to_string()),
        }
    }

    pub fn ref_table(&self) -> Option<&str> {
        match self {
            ColumnKind::Ref(table) | ColumnKind::RefList(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Bool => "bool",
            ColumnKind::Date => "date",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Int => "int",
            ColumnKind::Choice => "choice",
            ColumnKind::ChoiceList => "choice-list",
            ColumnKind::Ref(_) => "ref",
            ColumnKind::RefList(_) => "ref-list",
            ColumnKind::Other(tag) => tag,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Ref(table) => write!(f, "ref({table})"),
            ColumnKind::RefList(table) => write!(f, "ref-list({table})"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub type_tag: String,
    pub kind: ColumnKind,
    /// Enumerated choices from the widget configuration, when present.
    pub choices: Option<Vec<String>>,
    /// Rows offered by the reference target; empty for non-reference columns.
    pub ref_choices: Vec<ReferenceChoice>,
}

static PLAIN_TEXT: ColumnMetadata = ColumnMetadata {
    type_tag: String::new(),
    kind: ColumnKind::Text,
    choices: None,
    ref_choices: Vec::new(),
};

impl ColumnMetadata {
    pub fn new(type_tag: impl Into<String>) -> Self {
        let type_tag = type_tag.into();
        Self {
            kind: ColumnKind::from_type_tag(&type_tag),
            type_tag,
            choices: None,
            ref_choices: Vec::new(),
        }
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_ref_choices(mut self, choices: Vec<ReferenceChoice>) -> Self {
        self.ref_choices = choices;
        self
    }

    pub fn plain_text() -> &'static ColumnMetadata {
        &PLAIN_TEXT
    }

    pub fn is_bool(&self) -> bool {
        self.kind == ColumnKind::Bool
    }

    pub fn is_date(&self) -> bool {
        matches!(self.kind, ColumnKind::Date | ColumnKind::DateTime)
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    pub fn is_int(&self) -> bool {
        self.kind == ColumnKind::Int
    }

    pub fn is_ref(&self) -> bool {
        matches!(self.kind, ColumnKind::Ref(_) | ColumnKind::RefList(_))
    }

    /// Multi-choice and multi-reference columns hold a list, never a scalar.
    pub fn is_multiple(&self) -> bool {
        matches!(self.kind, ColumnKind::ChoiceList | ColumnKind::RefList(_))
    }

    pub fn ref_table(&self) -> Option<&str> {
        self.kind.ref_table()
    }

    pub fn has_choices(&self) -> bool {
        self.choices.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn shape(&self) -> InputShape {
        if self.is_bool() {
            InputShape::Toggle
        } else if self.is_date() {
            InputShape::DatePicker
        } else if self.is_numeric() || self.is_int() {
            InputShape::Numeric {
                integer: self.is_int(),
            }
        } else if self.is_multiple() {
            InputShape::MultiSelect
        } else if self.is_ref() || self.has_choices() {
            InputShape::SingleSelect
        } else {
            InputShape::FreeText
        }
    }

    /// `(value, label)` options a select input offers for this column.
    ///
    /// Reference rows win over enumerated choices; reference ids are rendered
    /// as text so they can round-trip through the live input.
    pub fn options(&self) -> Vec<(String, String)> {
        if !self.ref_choices.is_empty() {
            return self
                .ref_choices
                .iter()
                .map(|choice| (choice.id.to_string(), choice.label.clone()))
                .collect();
        }
        self.choices
            .iter()
            .flatten()
            .map(|choice| (choice.clone(), choice.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogMetadata {
    columns: BTreeMap<String, ColumnMetadata>,
}

impl CatalogMetadata {
    pub fn get(&self, column_id: &str) -> Option<&ColumnMetadata> {
        self.columns.get(column_id)
    }

    pub fn get_or_plain(&self, column_id: &str) -> &ColumnMetadata {
        self.get(column_id)
            .unwrap_or_else(|| ColumnMetadata::plain_text())
    }

    pub fn insert(&mut self, column_id: impl Into<String>, metadata: ColumnMetadata) {
        self.columns.insert(column_id.into(), metadata);
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<(String, ColumnMetadata)> for CatalogMetadata {
    fn from_iter<T: IntoIterator<Item = (String, ColumnMetadata)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Resolves metadata for every raw column definition of the catalog.
///
/// A reference target that cannot be read degrades that column to an empty
/// choice set; only a failure to list the definitions themselves is an error.
pub fn resolve_metadata(catalog: &dyn ColumnCatalog) -> Result<CatalogMetadata> {
    let defs = catalog
        .list_raw_column_defs()
        .context("Listing raw column definitions")?;
    let mut reference_cache: BTreeMap<String, Vec<ReferenceChoice>> = BTreeMap::new();
    let mut resolved = CatalogMetadata::default();
    for def in &defs {
        let metadata = resolve_column(def, catalog, &mut reference_cache);
        resolved.insert(def.id.clone(), metadata);
    }
    debug!(
        "Resolved metadata for {} column(s), {} reference table(s)",
        resolved.len(),
        reference_cache.len()
    );
    Ok(resolved)
}

fn resolve_column(
    def: &RawColumnDef,
    catalog: &dyn ColumnCatalog,
    reference_cache: &mut BTreeMap<String, Vec<ReferenceChoice>>,
) -> ColumnMetadata {
    let mut metadata = ColumnMetadata::new(def.type_tag.clone());
    metadata.choices = def.widget_options.as_deref().and_then(parse_widget_choices);

    if let Some(table) = metadata.ref_table().map(str::to_string) {
        let choices = reference_cache.entry(table.clone()).or_insert_with(|| {
            catalog
                .fetch_reference_choices(&table)
                .unwrap_or_else(|err| {
                    warn!(
                        "Reference table '{table}' for column '{}' is unreadable; offering no choices: {err:#}",
                        def.id
                    );
                    Vec::new()
                })
        });
        metadata.ref_choices = choices.clone();
    }
    metadata
}

/// Extracts the `choices` list from a raw widget-configuration JSON text.
///
/// Unparseable configuration yields `None`; non-string entries are kept in
/// their JSON text form.
pub fn parse_widget_choices(raw: &str) -> Option<Vec<String>> {
    if raw.trim().is_empty() {
        return None;
    }
    let parsed: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            debug!("Ignoring unparseable widget options: {err}");
            return None;
        }
    };
    let choices = parsed.get("choices")?.as_array()?;
    Some(
        choices
            .iter()
            .map(|choice| match choice {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    )
}
