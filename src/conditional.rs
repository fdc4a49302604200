use crate::{
    data::parse_row_id,
    element::{Conditional, FieldElement, FormConfig},
    input::LiveInputs,
    metadata::CatalogMetadata,
};

pub fn should_show(
    field: &FieldElement,
    config: &FormConfig,
    metadata: &CatalogMetadata,
    inputs: &dyn LiveInputs,
) -> bool {
    let Some(rule) = &field.conditional else {
        return true;
    };
    // A rule whose target left the form fails open.
    if config.field_by_column(&rule.field).is_none() {
        return true;
    }
    let Some(target) = metadata.get(&rule.field) else {
        return true;
    };
    let live = inputs
        .current_value(&rule.field)
        .map(|value| value.as_text())
        .unwrap_or("");
    rule_matches(rule, live, target.is_ref())
}

pub fn rule_matches(rule: &Conditional, live: &str, is_reference: bool) -> bool {
    if is_reference {
        match (parse_row_id(live), parse_row_id(&rule.value)) {
            (Some(current), Some(expected)) => current == expected,
            _ => false,
        }
    } else {
        live == rule.value
    }
}

pub fn visibility(
    config: &FormConfig,
    metadata: &CatalogMetadata,
    inputs: &dyn LiveInputs,
) -> Vec<bool> {
    config
        .elements()
        .iter()
        .map(|element| match element.as_field() {
            Some(field) => should_show(field, config, metadata, inputs),
            None => true,
        })
        .collect()
}

pub fn conditional_targets<'a>(
    config: &'a FormConfig,
    metadata: &CatalogMetadata,
    for_index: usize,
) -> Vec<&'a FieldElement> {
    config
        .fields()
        .filter(|(idx, _)| *idx != for_index)
        .map(|(_, field)| field)
        .filter(|field| {
            metadata.get(&field.field_name).is_some_and(|meta| {
                !meta.is_multiple()
                    && (meta.has_choices() || (meta.is_ref() && !meta.ref_choices.is_empty()))
            })
        })
        .collect()
}

pub fn conditional_values(metadata: &CatalogMetadata, column_id: &str) -> Vec<(String, String)> {
    metadata
        .get(column_id)
        .map(|meta| meta.options())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_rules_compare_as_row_ids() {
        let rule = Conditional::new("Owner", "3");
        assert!(rule_matches(&rule, "3", true));
        assert!(rule_matches(&rule, " 3", true));
        assert!(!rule_matches(&rule, "4", true));
        assert!(!rule_matches(&rule, "", true));
        assert!(!rule_matches(&Conditional::new("Owner", "x"), "x", true));
    }

    #[test]
    fn plain_rules_compare_as_text() {
        let rule = Conditional::new("Status", "03");
        assert!(rule_matches(&rule, "03", false));
        assert!(!rule_matches(&rule, "3", false));
    }
}
