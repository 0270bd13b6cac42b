// Property-based tests for the batch composition string

use inspection_forms::forms::common::MaterialLine;
use inspection_forms::lifecycle::derived::composition;
use proptest::prelude::*;

fn field_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("  ".to_string()),
        "[A-Za-z][A-Za-z0-9 ]{0,11}",
        "[0-9]{1,3}(\\.[0-9])?",
    ]
}

fn line_strategy() -> impl Strategy<Value = MaterialLine> {
    (
        field_strategy(),
        field_strategy(),
        field_strategy(),
        field_strategy(),
    )
        .prop_map(|(name, weight, batch_no, quantity)| MaterialLine {
            name,
            weight,
            batch_no,
            quantity,
            ..MaterialLine::default()
        })
}

fn filled(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

proptest! {
    #[test]
    fn composition_joins_complete_lines_in_order(lines in prop::collection::vec(line_strategy(), 0..8)) {
        let expected: Vec<String> = lines
            .iter()
            .filter(|line| filled(&line.name).is_some())
            .filter_map(|line| {
                filled(&line.weight)
                    .or_else(|| filled(&line.batch_no))
                    .or_else(|| filled(&line.quantity))
                    .map(|value| format!("{} {}", line.name, value))
            })
            .collect();

        prop_assert_eq!(composition(&lines), expected.join(" "));
    }

    #[test]
    fn lines_without_a_name_never_contribute(
        weight in "[0-9]{1,3}",
        lines in prop::collection::vec(line_strategy(), 0..5),
    ) {
        let mut with_blank = lines.clone();
        with_blank.push(MaterialLine {
            name: "   ".to_string(),
            weight,
            ..MaterialLine::default()
        });
        prop_assert_eq!(composition(&with_blank), composition(&lines));
    }
}

#[test]
fn empty_line_set_gives_empty_string() {
    assert_eq!(composition(&Vec::<MaterialLine>::new()), "");
}
