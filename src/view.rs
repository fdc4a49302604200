use std::fmt::Write as _;

use itertools::Itertools;

use crate::{
    data::{InputShape, InputSpec, InputValue, input_spec},
    element::{Conditional, ElementKind, FormConfig, FormElement},
    input::LiveInputs,
    metadata::CatalogMetadata,
    table,
    validation::ValidationReport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub index: usize,
    pub column: String,
    pub label: String,
    pub required: bool,
    pub max_length: Option<u32>,
    pub input: InputSpec,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormNode {
    Separator,
    Title(String),
    Text(String),
    Field(FieldView),
}

pub fn form_view(
    config: &FormConfig,
    metadata: &CatalogMetadata,
    visible: &[bool],
) -> Vec<FormNode> {
    config
        .elements()
        .iter()
        .enumerate()
        .map(|(index, element)| match element {
            FormElement::Separator {} => FormNode::Separator,
            FormElement::Title { content } => FormNode::Title(content.clone()),
            FormElement::Text { content } => FormNode::Text(content.clone()),
            FormElement::Field(field) => FormNode::Field(FieldView {
                index,
                column: field.field_name.clone(),
                label: field.label().to_string(),
                required: field.required,
                max_length: field.max_length,
                input: input_spec(metadata.get_or_plain(&field.field_name)),
                // missing entries count as visible
                hidden: !visible.get(index).copied().unwrap_or(true),
            }),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorRow {
    pub index: usize,
    pub kind: ElementKind,
    pub caption: String,
    pub column: Option<String>,
    pub column_type: Option<String>,
    pub required: bool,
    pub max_length: Option<u32>,
    pub conditional: Option<Conditional>,
    pub offers_max_length: bool,
}

pub fn editor_rows(config: &FormConfig, metadata: &CatalogMetadata) -> Vec<EditorRow> {
    config
        .elements()
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let mut row = EditorRow {
                index,
                kind: element.kind(),
                caption: String::new(),
                column: None,
                column_type: None,
                required: false,
                max_length: None,
                conditional: None,
                offers_max_length: false,
            };
            match element {
                FormElement::Field(field) => {
                    let meta = metadata.get_or_plain(&field.field_name);
                    row.caption = field.label().to_string();
                    row.column = Some(field.field_name.clone());
                    row.column_type = Some(meta.type_tag.clone());
                    row.required = field.required;
                    row.max_length = field.max_length;
                    row.conditional = field.conditional.clone();
                    row.offers_max_length =
                        matches!(meta.shape(), InputShape::FreeText | InputShape::Numeric { .. });
                }
                FormElement::Title { content } | FormElement::Text { content } => {
                    row.caption = content.clone();
                }
                FormElement::Separator {} => {}
            }
            row
        })
        .collect()
}

pub fn render_editor(rows: &[EditorRow]) -> String {
    let headers = ["#", "Kind", "Caption", "Column", "Type", "Required", "Max", "Shown when"];
    let body = rows
        .iter()
        .map(|row| {
            vec![
                row.index.to_string(),
                row.kind.to_string(),
                row.caption.clone(),
                row.column.clone().unwrap_or_default(),
                row.column_type.clone().unwrap_or_default(),
                if row.required { "yes" } else { "" }.to_string(),
                row.max_length.map(|m| m.to_string()).unwrap_or_default(),
                row.conditional
                    .as_ref()
                    .map(|rule| format!("{} = {}", rule.field, rule.value))
                    .unwrap_or_default(),
            ]
        })
        .collect::<Vec<_>>();
    table::render_table(&headers, &body)
}

pub fn render_form(
    nodes: &[FormNode],
    inputs: &dyn LiveInputs,
    report: Option<&ValidationReport>,
) -> String {
    let mut out = String::new();
    if let Some(summary) = report.and_then(ValidationReport::summary) {
        let _ = writeln!(out, "! {summary}");
    }
    for node in nodes {
        match node {
            FormNode::Separator => {
                let _ = writeln!(out, "{}", "-".repeat(40));
            }
            FormNode::Title(content) => {
                let _ = writeln!(out, "# {content}");
            }
            FormNode::Text(content) => {
                let _ = writeln!(out, "{content}");
            }
            FormNode::Field(field) if field.hidden => {}
            FormNode::Field(field) => {
                let marker = if field.required { " *" } else { "" };
                let value = inputs
                    .current_value(&field.column)
                    .map(describe_input)
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "{}{marker} [{}]: {value}",
                    field.label, field.input.shape
                );
                if !field.input.options.is_empty() {
                    let options = field
                        .input
                        .options
                        .iter()
                        .map(|(value, label)| {
                            if value == label {
                                value.clone()
                            } else {
                                format!("{value}={label}")
                            }
                        })
                        .join(", ");
                    let _ = writeln!(out, "    options: {options}");
                }
                if let Some(failure) = report.and_then(|r| r.failure_for(&field.column)) {
                    let _ = writeln!(out, "    ! {failure}");
                }
            }
        }
    }
    out
}

fn describe_input(value: &InputValue) -> String {
    match value {
        InputValue::Text(text) => text.clone(),
        InputValue::Flag(flag) => flag.to_string(),
        InputValue::Selection(values) => values.iter().join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{input::InputState, metadata::ColumnMetadata, validation::validate_form};

    fn sample() -> (FormConfig, CatalogMetadata) {
        let mut config = FormConfig::bootstrap(&["Status".to_string(), "Reason".to_string()]);
        config.add_static(crate::element::StaticKind::Title, "Intake").unwrap();
        config.set_conditional(1, Some(Conditional::new("Status", "closed")));
        config.set_required(1, true);
        let metadata = [
            (
                "Status".to_string(),
                ColumnMetadata::new("Choice").with_choices(["open", "closed"]),
            ),
            ("Reason".to_string(), ColumnMetadata::new("Text")),
        ]
        .into_iter()
        .collect();
        (config, metadata)
    }

    #[test]
    fn form_view_marks_hidden_fields() {
        let (config, metadata) = sample();
        let nodes = form_view(&config, &metadata, &[true, false, true]);
        assert_eq!(nodes.len(), 3);
        let FormNode::Field(status) = &nodes[0] else {
            panic!("expected field node");
        };
        assert_eq!(status.input.shape, InputShape::SingleSelect);
        assert!(status.input.placeholder);
        assert!(!status.hidden);
        let FormNode::Field(reason) = &nodes[1] else {
            panic!("expected field node");
        };
        assert!(reason.hidden);
        assert_eq!(nodes[2], FormNode::Title("Intake".to_string()));
    }

    #[test]
    fn editor_rows_offer_max_length_for_text_only() {
        let (config, metadata) = sample();
        let rows = editor_rows(&config, &metadata);
        assert!(!rows[0].offers_max_length);
        assert!(rows[1].offers_max_length);
        assert_eq!(rows[1].conditional, Some(Conditional::new("Status", "closed")));
        assert_eq!(rows[2].kind, ElementKind::Title);
        assert_eq!(rows[2].caption, "Intake");
        assert!(render_editor(&rows).contains("Status = closed"));
    }

    #[test]
    fn rendered_form_skips_hidden_fields_and_shows_errors() {
        let (config, metadata) = sample();
        let mut inputs = InputState::new();
        inputs.set_text("Status", "closed");
        let report = validate_form(&config, &metadata, &inputs);
        let visible = crate::conditional::visibility(&config, &metadata, &inputs);
        let text = render_form(&form_view(&config, &metadata, &visible), &inputs, Some(&report));
        assert!(text.starts_with("! There are one or more errors"));
        assert!(text.contains("Reason * [text]: "));
        assert!(text.contains("    ! This field is required"));

        inputs.set_text("Status", "open");
        let visible = crate::conditional::visibility(&config, &metadata, &inputs);
        let text = render_form(&form_view(&config, &metadata, &visible), &inputs, None);
        assert!(!text.contains("Reason"));
        assert!(text.contains("options: open, closed"));
    }
}
