mod common;

use tabform::conditional::{conditional_targets, conditional_values, should_show, visibility};
use tabform::element::{Conditional, FormConfig, StaticKind};
use tabform::input::InputState;

use common::{columns, sample_metadata};

/// Status, Owner, Reason, Count, with Reason shown only for owner 3.
fn owner_rule_form() -> FormConfig {
    let mut config = FormConfig::bootstrap(&columns(&["Status", "Owner", "Reason", "Count"]));
    assert!(config.set_conditional(2, Some(Conditional::new("Owner", "3"))));
    config
}

#[test]
fn reference_rule_truth_table() {
    let config = owner_rule_form();
    let metadata = sample_metadata();
    let reason = config.field_at(2).expect("reason field").clone();

    let mut inputs = InputState::new();
    inputs.set_text("Owner", "3");
    assert!(should_show(&reason, &config, &metadata, &inputs));

    inputs.set_text("Owner", "4");
    assert!(!should_show(&reason, &config, &metadata, &inputs));

    inputs.set_text("Owner", "three");
    assert!(!should_show(&reason, &config, &metadata, &inputs));

    inputs.remove("Owner");
    assert!(!should_show(&reason, &config, &metadata, &inputs));
}

#[test]
fn rule_on_removed_field_fails_open() {
    let mut config = owner_rule_form();
    let metadata = sample_metadata();
    config.remove_at(1).expect("remove owner");

    let mut inputs = InputState::new();
    inputs.set_text("Owner", "4");
    let reason = config.field_at(1).expect("reason field").clone();
    assert_eq!(reason.conditional, Some(Conditional::new("Owner", "3")));
    assert!(should_show(&reason, &config, &metadata, &inputs));
}

#[test]
fn choice_rules_compare_text_exactly() {
    let mut config = FormConfig::bootstrap(&columns(&["Status", "Reason"]));
    config.set_conditional(1, Some(Conditional::new("Status", "closed")));
    let metadata = sample_metadata();

    let mut inputs = InputState::new();
    inputs.set_text("Status", "closed");
    assert_eq!(visibility(&config, &metadata, &inputs), vec![true, true]);
    inputs.set_text("Status", "Closed");
    assert_eq!(visibility(&config, &metadata, &inputs), vec![true, false]);
}

#[test]
fn static_elements_are_always_visible() {
    let mut config = owner_rule_form();
    config.add_static(StaticKind::Separator, "").unwrap();
    let flags = visibility(&config, &sample_metadata(), &InputState::new());
    assert_eq!(flags, vec![true, true, false, true, true]);
}

#[test]
fn targets_are_single_selects_with_options_excluding_self() {
    let config = owner_rule_form();
    let metadata = sample_metadata();

    let names = |index| {
        conditional_targets(&config, &metadata, index)
            .into_iter()
            .map(|field| field.field_name.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(2), ["Status", "Owner"]);
    assert_eq!(names(0), ["Owner"]);

    assert_eq!(
        conditional_values(&metadata, "Owner"),
        vec![
            ("3".to_string(), "Ada".to_string()),
            ("4".to_string(), "Grace".to_string())
        ]
    );
    assert!(conditional_values(&metadata, "Reason").is_empty());
}
