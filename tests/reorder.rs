use proptest::prelude::*;
use tabform::element::{FormConfig, FormElement};
use tabform::reorder::{DropHalf, apply_drop, insertion_position};

fn letters() -> Vec<char> {
    vec!['a', 'b', 'c', 'd', 'e']
}

#[test]
fn dropping_on_own_top_half_is_a_noop() {
    let mut items = letters();
    assert!(!apply_drop(&mut items, 2, 2, DropHalf::Top));
    assert_eq!(items, letters());
}

#[test]
fn dropping_first_below_fourth_shifts_the_rest_up() {
    let mut items = letters();
    assert!(apply_drop(&mut items, 0, 3, DropHalf::Bottom));
    assert_eq!(items, vec!['b', 'c', 'd', 'a', 'e']);
}

#[test]
fn dropping_upwards_needs_no_compensation() {
    assert_eq!(insertion_position(4, 1, DropHalf::Top), 1);
    assert_eq!(insertion_position(4, 1, DropHalf::Bottom), 2);
    let mut items = letters();
    assert!(apply_drop(&mut items, 4, 1, DropHalf::Bottom));
    assert_eq!(items, vec!['a', 'b', 'e', 'c', 'd']);
}

#[test]
fn form_config_reorders_elements() {
    let mut config = FormConfig::new(vec![
        FormElement::field("A"),
        FormElement::title("Intro"),
        FormElement::field("B"),
    ]);
    assert!(config.reorder(1, 0, DropHalf::Top));
    assert_eq!(
        config.elements(),
        &[
            FormElement::title("Intro"),
            FormElement::field("A"),
            FormElement::field("B"),
        ]
    );
    assert!(!config.reorder(0, 7, DropHalf::Top));
}

proptest! {
    #[test]
    fn drop_is_a_permutation_landing_at_the_computed_position(
        len in 1usize..12,
        from_seed in any::<usize>(),
        to_seed in any::<usize>(),
        bottom in any::<bool>(),
    ) {
        let from = from_seed % len;
        let to = to_seed % len;
        let half = if bottom { DropHalf::Bottom } else { DropHalf::Top };
        let original = (0..len).collect::<Vec<_>>();
        let mut items = original.clone();

        let moved = apply_drop(&mut items, from, to, half);
        let position = insertion_position(from, to, half);

        prop_assert_eq!(items.len(), len);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        prop_assert_eq!(&sorted, &original);
        prop_assert_eq!(items[position.min(len - 1)], from);
        prop_assert_eq!(moved, position != from);

        let mut rest = items.clone();
        rest.retain(|item| *item != from);
        let mut expected_rest = original.clone();
        expected_rest.retain(|item| *item != from);
        prop_assert_eq!(rest, expected_rest);
    }

    #[test]
    fn dropping_just_below_self_never_moves(len in 1usize..12, seed in any::<usize>()) {
        let index = seed % len;
        let mut items = (0..len).collect::<Vec<_>>();
        prop_assert!(!apply_drop(&mut items, index, index, DropHalf::Bottom));
        prop_assert!(!apply_drop(&mut items, index, index, DropHalf::Top));
    }
}
