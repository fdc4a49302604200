mod common;

use tabform::data::InputValue;
use tabform::element::{Conditional, FormConfig};
use tabform::input::InputState;
use tabform::metadata::ColumnMetadata;
use tabform::validation::{SUMMARY_MESSAGE, ValidationFailure, validate_field, validate_form};

use common::{columns, sample_metadata};

fn text(value: &str) -> InputValue {
    InputValue::Text(value.to_string())
}

#[test]
fn required_numeric_field_with_empty_value_fails_as_required() {
    let mut config = FormConfig::bootstrap(&columns(&["Count"]));
    config.set_required(0, true);
    let field = config.field_at(0).unwrap();
    let meta = ColumnMetadata::new("Numeric");

    assert_eq!(
        validate_field(field, &meta, Some(&text("  "))),
        Err(ValidationFailure::Required)
    );
    assert_eq!(
        validate_field(field, &meta, None),
        Err(ValidationFailure::Required)
    );
}

#[test]
fn fractional_value_on_integer_field_fails() {
    let config = FormConfig::bootstrap(&columns(&["Count"]));
    let failure = validate_field(
        config.field_at(0).unwrap(),
        &ColumnMetadata::new("Int"),
        Some(&text("12.5")),
    )
    .unwrap_err();
    assert_eq!(failure, ValidationFailure::NotInteger);
    assert_eq!(failure.to_string(), "An integer value is required");
}

#[test]
fn text_longer_than_max_length_fails() {
    let mut config = FormConfig::bootstrap(&columns(&["Reason"]));
    config.set_max_length(0, Some(5), tabform::data::InputShape::FreeText);
    let field = config.field_at(0).unwrap();
    let meta = ColumnMetadata::new("Text");

    let failure = validate_field(field, &meta, Some(&text("abcdef"))).unwrap_err();
    assert_eq!(
        failure.to_string(),
        "This field must contain at most 5 characters"
    );
    assert!(validate_field(field, &meta, Some(&text("abcde"))).is_ok());
}

#[test]
fn hidden_field_never_blocks_submission() {
    let mut config = FormConfig::bootstrap(&columns(&["Status", "Reason"]));
    config.set_required(1, true);
    config.set_max_length(1, Some(5), tabform::data::InputShape::FreeText);
    config.set_conditional(1, Some(Conditional::new("Status", "closed")));
    let metadata = sample_metadata();

    let mut inputs = InputState::new();
    inputs.set_text("Status", "open");
    inputs.set_text("Reason", "abcdef");
    let report = validate_form(&config, &metadata, &inputs);
    assert!(report.is_valid());
    assert_eq!(report.checked, 1);
    assert_eq!(report.summary(), None);

    inputs.set_text("Status", "closed");
    let report = validate_form(&config, &metadata, &inputs);
    assert_eq!(report.summary(), Some(SUMMARY_MESSAGE));
    assert_eq!(
        report.failure_for("Reason"),
        Some(&ValidationFailure::TooLong { max: 5 })
    );
}

#[test]
fn every_visible_field_is_checked_after_a_failure() {
    let mut config = FormConfig::bootstrap(&columns(&["Status", "Reason", "Count"]));
    config.set_required(0, true);
    config.set_required(1, true);
    let metadata = sample_metadata();

    let mut inputs = InputState::new();
    inputs.set_text("Count", "x");
    let report = validate_form(&config, &metadata, &inputs);
    let failed = report
        .failures
        .iter()
        .map(|failure| (failure.index, failure.failure.clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        failed,
        vec![
            (0, ValidationFailure::Required),
            (1, ValidationFailure::Required),
            (2, ValidationFailure::NotNumeric),
        ]
    );
}
