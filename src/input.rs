use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::data::{InputShape, InputValue, parse_flag};

pub trait LiveInputs {
    fn current_value(&self, column_id: &str) -> Option<&InputValue>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    values: BTreeMap<String, InputValue>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column_id: impl Into<String>, value: InputValue) {
        self.values.insert(column_id.into(), value);
    }

    pub fn set_text(&mut self, column_id: impl Into<String>, value: impl Into<String>) {
        self.set(column_id, InputValue::Text(value.into()));
    }

    pub fn remove(&mut self, column_id: &str) -> Option<InputValue> {
        self.values.remove(column_id)
    }

    pub fn assign(&mut self, column_id: &str, raw: &str, shape: InputShape) -> Result<()> {
        match shape {
            InputShape::Toggle => {
                let flag = parse_flag(raw)
                    .with_context(|| format!("Assigning toggle column '{column_id}'"))?;
                self.set(column_id, InputValue::Flag(flag));
            }
            InputShape::MultiSelect => {
                let entry = self
                    .values
                    .entry(column_id.to_string())
                    .or_insert_with(|| InputValue::Selection(Vec::new()));
                if !matches!(entry, InputValue::Selection(_)) {
                    *entry = InputValue::Selection(Vec::new());
                }
                if let InputValue::Selection(values) = entry
                    && !raw.is_empty()
                {
                    values.push(raw.to_string());
                }
            }
            _ => self.set_text(column_id, raw),
        }
        Ok(())
    }

    pub fn reset(&mut self, column_id: &str, shape: InputShape) {
        self.values
            .insert(column_id.to_string(), InputValue::empty_for(shape));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl LiveInputs for InputState {
    fn current_value(&self, column_id: &str) -> Option<&InputValue> {
        self.values.get(column_id)
    }
}
