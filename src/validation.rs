use thiserror::Error;

use crate::{
    conditional,
    data::{InputShape, InputValue, parse_number},
    element::{FieldElement, FormConfig},
    input::LiveInputs,
    metadata::{CatalogMetadata, ColumnMetadata},
};

pub const SUMMARY_MESSAGE: &str =
    "There are one or more errors in the form, please check the fields";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("This field is required")]
    Required,
    #[error("A numeric value is required")]
    NotNumeric,
    #[error("An integer value is required")]
    NotInteger,
    #[error("This field must contain at most {max} characters")]
    TooLong { max: u32 },
}

pub fn validate_field(
    field: &FieldElement,
    metadata: &ColumnMetadata,
    input: Option<&InputValue>,
) -> Result<(), ValidationFailure> {
    let shape = metadata.shape();
    let empty = InputValue::empty_for(shape);
    let input = input.unwrap_or(&empty);

    if field.required {
        match shape {
            InputShape::Toggle => {}
            InputShape::MultiSelect => {
                if input.selection_len() == 0 {
                    return Err(ValidationFailure::Required);
                }
            }
            _ => {
                if input.as_text().trim().is_empty() {
                    return Err(ValidationFailure::Required);
                }
            }
        }
    }

    if let InputShape::Numeric { integer } = shape {
        let raw = input.as_text().trim();
        if raw.is_empty() {
            return Ok(());
        }
        let number = parse_number(raw).ok_or(ValidationFailure::NotNumeric)?;
        if integer && number.fract() != 0.0 {
            return Err(ValidationFailure::NotInteger);
        }
    }

    if let Some(max) = field.max_length
        && shape.accepts_max_length()
        && input.as_text().chars().count() > max as usize
    {
        return Err(ValidationFailure::TooLong { max });
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub index: usize,
    pub column: String,
    pub label: String,
    pub failure: ValidationFailure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub failures: Vec<FieldFailure>,
    pub checked: usize,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> Option<&'static str> {
        (!self.is_valid()).then_some(SUMMARY_MESSAGE)
    }

    pub fn failure_for(&self, column_id: &str) -> Option<&ValidationFailure> {
        self.failures
            .iter()
            .find(|failure| failure.column == column_id)
            .map(|failure| &failure.failure)
    }
}

pub fn validate_form(
    config: &FormConfig,
    metadata: &CatalogMetadata,
    inputs: &dyn LiveInputs,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (index, field) in config.fields() {
        if !conditional::should_show(field, config, metadata, inputs) {
            continue;
        }
        report.checked += 1;
        let column_meta = metadata.get_or_plain(&field.field_name);
        if let Err(failure) =
            validate_field(field, column_meta, inputs.current_value(&field.field_name))
        {
            report.failures.push(FieldFailure {
                index,
                column: field.field_name.clone(),
                label: field.label().to_string(),
                failure,
            });
        }
    }
    report
}
