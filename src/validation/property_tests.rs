//! Property tests for validation module
//!
//! Property 1: The validator never panics on arbitrary JSON
//! Property 2: Trees built from the mapping table validate cleanly
//! Property 3: Trees that validate also evaluate without error
//! Property 4: The evaluator only fails on group operators and nesting

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::condition::{conditions_met_json, ConditionNode};
use crate::error::LogicError;
use crate::validation::rule::check_conditions;
use crate::validation::validate_property_logic;

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

/// Arbitrary JSON, biased towards the keys a logic tree uses
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-50i64..50).prop_map(Value::from),
        "[a-z_\\[(]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(
                (
                    prop_oneof![
                        Just("operatorIdentifier".to_string()),
                        Just("children".to_string()),
                        Just("identifier".to_string()),
                        Just("value".to_string()),
                        Just("operator".to_string()),
                        Just("property_meta".to_string()),
                        Just("type".to_string()),
                        Just("id".to_string()),
                    ],
                    inner
                ),
                0..5
            )
            .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
        ]
    })
}

/// Well-formed leaves, one per field-type family
fn valid_leaf_strategy() -> impl Strategy<Value = ConditionNode> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(|s| ConditionNode::leaf("t", "text", "contains", s)),
        (-100i64..100).prop_map(|n| ConditionNode::leaf("n", "number", "less_than", n)),
        (-100i64..100).prop_map(|n| ConditionNode::leaf("r", "rating", "equals", n)),
        Just(ConditionNode::leaf("c", "checkbox", "is_not_checked", true)),
        "[a-c]".prop_map(|s| ConditionNode::leaf("s", "select", "does_not_equal", s)),
        prop::collection::vec("[a-c]", 1..3)
            .prop_map(|v| ConditionNode::leaf("m", "multi_select", "contains", v)),
        Just(ConditionNode::leaf(
            "d",
            "date",
            "past_month",
            crate::condition::FieldValue::from(json!({}))
        )),
        Just(ConditionNode::leaf("d", "date", "on_or_after", "2024-02-29")),
        Just(ConditionNode::leaf("f", "files", "is_not_empty", true)),
    ]
}

fn valid_tree_strategy() -> impl Strategy<Value = ConditionNode> {
    valid_leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        (prop::collection::vec(inner, 1..4), any::<bool>()).prop_map(|(children, or)| {
            if or {
                ConditionNode::or(children)
            } else {
                ConditionNode::and(children)
            }
        })
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// Property 1: Any input yields a report, never a panic
    #[test]
    fn prop_validator_total(conditions in json_strategy(), actions in json_strategy()) {
        let property = json!({
            "id": "f",
            "name": "Field",
            "type": "text",
            "logic": {"conditions": conditions, "actions": actions}
        });
        let report = validate_property_logic(&property);
        prop_assert_eq!(report.passed(), report.messages().is_empty());
    }

    /// Property 2: Generated well-formed trees have no violations
    #[test]
    fn prop_valid_trees_pass(tree in valid_tree_strategy()) {
        let violations = check_conditions(&tree.to_value());
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }

    /// Property 3.1: Valid trees evaluate without structural errors
    #[test]
    fn prop_valid_trees_evaluate(tree in valid_tree_strategy(), data in json_strategy()) {
        let result = conditions_met_json(&tree.to_value(), &data);
        prop_assert!(result.is_ok());
    }

    /// Property 3.2: Whatever the validator accepts, the evaluator accepts
    #[test]
    fn prop_accepted_input_evaluates(conditions in json_strategy(), data in json_strategy()) {
        if check_conditions(&conditions).is_empty() {
            let result = conditions_met_json(&conditions, &data);
            prop_assert!(result.is_ok(), "{} -> {:?}", conditions, result);
        }
    }

    /// Property 4: Runtime errors are limited to corrupt groups
    #[test]
    fn prop_evaluator_errors_are_structural(conditions in json_strategy(), data in json_strategy()) {
        if let Err(err) = conditions_met_json(&conditions, &data) {
            prop_assert!(
                matches!(err, LogicError::UnknownGroupOperator(_) | LogicError::DepthExceeded(_)),
                "{:?}",
                err
            );
        }
    }
}
