use std::fmt;

use anyhow::{Result, bail};
use serde::{Serialize, Serializer, ser::SerializeSeq};

use crate::metadata::ColumnMetadata;

pub const LIST_MARKER: &str = "L";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    Toggle,
    DatePicker,
    Numeric { integer: bool },
    MultiSelect,
    SingleSelect,
    FreeText,
}

impl InputShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputShape::Toggle => "toggle",
            InputShape::DatePicker => "date",
            InputShape::Numeric { integer: false } => "numeric",
            InputShape::Numeric { integer: true } => "integer",
            InputShape::MultiSelect => "multi-select",
            InputShape::SingleSelect => "select",
            InputShape::FreeText => "text",
        }
    }

    pub fn accepts_max_length(&self) -> bool {
        !matches!(
            self,
            InputShape::Toggle | InputShape::DatePicker | InputShape::MultiSelect
        )
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub shape: InputShape,
    pub options: Vec<(String, String)>,
    pub placeholder: bool,
}

pub fn input_spec(metadata: &ColumnMetadata) -> InputSpec {
    let shape = metadata.shape();
    let options = match shape {
        InputShape::MultiSelect | InputShape::SingleSelect => metadata.options(),
        _ => Vec::new(),
    };
    InputSpec {
        shape,
        options,
        placeholder: shape == InputShape::SingleSelect,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputValue {
    Text(String),
    Flag(bool),
    Selection(Vec<String>),
}

impl InputValue {
    pub fn as_text(&self) -> &str {
        match self {
            InputValue::Text(s) => s,
            InputValue::Flag(true) => "true",
            InputValue::Flag(false) => "false",
            InputValue::Selection(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn selection_len(&self) -> usize {
        match self {
            InputValue::Selection(values) => values.len(),
            InputValue::Text(s) if s.is_empty() => 0,
            _ => 1,
        }
    }

    pub fn is_checked(&self) -> bool {
        match self {
            InputValue::Flag(flag) => *flag,
            InputValue::Text(s) => parse_flag(s).unwrap_or(false),
            InputValue::Selection(_) => false,
        }
    }

    pub fn empty_for(shape: InputShape) -> Self {
        match shape {
            InputShape::Toggle => InputValue::Flag(false),
            InputShape::MultiSelect => InputValue::Selection(Vec::new()),
            _ => InputValue::Text(String::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
    List(Vec<CellValue>),
}

impl CellValue {
    pub fn as_display(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::List(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len() + 1))?;
                seq.serialize_element(LIST_MARKER)?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn parse_flag(value: &str) -> Result<bool> {
    let lowered = value.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "true" | "t" | "yes" | "y" | "1" | "on" => Ok(true),
        "false" | "f" | "no" | "n" | "0" | "off" | "" => Ok(false),
        _ => bail!("Failed to parse '{value}' as a toggle state"),
    }
}

pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

pub fn parse_row_id(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

fn reference_or_null(raw: &str) -> CellValue {
    parse_row_id(raw).map_or(CellValue::Null, CellValue::Int)
}

pub fn extract_value(metadata: &ColumnMetadata, input: Option<&InputValue>) -> CellValue {
    let shape = metadata.shape();
    let empty = InputValue::empty_for(shape);
    let input = input.unwrap_or(&empty);
    match shape {
        InputShape::Toggle => CellValue::Bool(input.is_checked()),
        InputShape::MultiSelect => {
            let selected: Vec<&str> = match input {
                InputValue::Selection(values) => values.iter().map(String::as_str).collect(),
                other if other.as_text().is_empty() => Vec::new(),
                other => vec![other.as_text()],
            };
            let items = selected
                .into_iter()
                .map(|raw| {
                    if metadata.is_ref() {
                        reference_or_null(raw)
                    } else {
                        CellValue::Text(raw.to_string())
                    }
                })
                .collect();
            CellValue::List(items)
        }
        _ if metadata.is_ref() => {
            let raw = input.as_text();
            if raw.is_empty() {
                CellValue::Null
            } else {
                reference_or_null(raw)
            }
        }
        InputShape::Numeric { .. } => {
            let raw = input.as_text();
            if raw.trim().is_empty() {
                CellValue::Null
            } else {
                parse_number(raw).map_or(CellValue::Null, CellValue::Number)
            }
        }
        InputShape::SingleSelect => {
            let raw = input.as_text();
            if raw.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(raw.to_string())
            }
        }
        InputShape::DatePicker | InputShape::FreeText => {
            CellValue::Text(input.as_text().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ReferenceChoice;

    #[test]
    fn list_values_serialize_with_marker() {
        let value = CellValue::List(vec![CellValue::Int(7), CellValue::Int(9)]);
        assert_eq!(value.to_json(), serde_json::json!(["L", 7, 9]));
        assert_eq!(value.as_display(), r#"["L",7,9]"#);
    }

    #[test]
    fn numeric_extraction_keeps_fraction_for_integer_columns() {
        let meta = ColumnMetadata::new("Int");
        let value = extract_value(&meta, Some(&InputValue::Text("12.5".to_string())));
        assert_eq!(value, CellValue::Number(12.5));
        assert_eq!(
            extract_value(&meta, Some(&InputValue::Text("  ".to_string()))),
            CellValue::Null
        );
    }

    #[test]
    fn single_reference_extracts_row_id_or_null() {
        let meta = ColumnMetadata::new("Ref:People").with_ref_choices(vec![ReferenceChoice {
            id: 3,
            label: "Ada".to_string(),
        }]);
        assert_eq!(
            extract_value(&meta, Some(&InputValue::Text("3".to_string()))),
            CellValue::Int(3)
        );
        assert_eq!(
            extract_value(&meta, Some(&InputValue::Text(String::new()))),
            CellValue::Null
        );
        assert_eq!(extract_value(&meta, None), CellValue::Null);
    }

    #[test]
    fn toggle_and_text_extraction() {
        let toggle = ColumnMetadata::new("Bool");
        assert_eq!(
            extract_value(&toggle, Some(&InputValue::Flag(true))),
            CellValue::Bool(true)
        );
        assert_eq!(extract_value(&toggle, None), CellValue::Bool(false));

        let date = ColumnMetadata::new("Date");
        assert_eq!(
            extract_value(&date, Some(&InputValue::Text("2024-05-06".to_string()))),
            CellValue::Text("2024-05-06".to_string())
        );
    }

    #[test]
    fn parse_flag_accepts_common_tokens() {
        assert!(parse_flag("Yes").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn input_spec_offers_placeholder_only_for_single_select() {
        let spec = input_spec(&ColumnMetadata::new("Choice").with_choices(["a", "b"]));
        assert_eq!(spec.shape, InputShape::SingleSelect);
        assert!(spec.placeholder);
        assert_eq!(spec.options[1], ("b".to_string(), "b".to_string()));

        let multi = input_spec(&ColumnMetadata::new("ChoiceList").with_choices(["a"]));
        assert!(!multi.placeholder);
        assert_eq!(multi.options.len(), 1);
    }
}
