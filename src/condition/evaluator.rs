//! Condition evaluator
//!
//! `conditions_met` is fail-closed: a missing tree evaluates to `false`.
//! Callers that treat "no logic configured" as "always show / always run"
//! must check for that themselves before calling in (see [`crate::form`]).

use crate::condition::ast::{ConditionNode, GroupCondition, GroupOperator, LeafCondition};
use crate::condition::mapping;
use crate::condition::parser;
use crate::condition::value::{form_data_from_json, FormData, NULL};
use crate::config;
use crate::error::{LogicError, Result};
use chrono::{NaiveDate, Utc};

/// Per-call evaluation settings
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    /// Anchor for relative date windows
    pub today: NaiveDate,
    pub max_depth: usize,
}

impl EvalContext {
    /// Context for the current UTC day and the installed configuration
    pub fn now() -> Self {
        Self::at(Utc::now().date_naive())
    }

    pub fn at(today: NaiveDate) -> Self {
        Self {
            today,
            max_depth: config::current().max_depth,
        }
    }
}

/// Evaluate a logic tree against submitted form data.
///
/// Returns `Ok(false)` for a missing tree. Errors only on structural
/// corruption (nesting beyond the configured depth).
pub fn conditions_met(tree: Option<&ConditionNode>, form_data: &FormData) -> Result<bool> {
    conditions_met_with(tree, form_data, &EvalContext::now())
}

/// Same as [`conditions_met`] with an explicit "today"
pub fn conditions_met_at(
    tree: Option<&ConditionNode>,
    form_data: &FormData,
    today: NaiveDate,
) -> Result<bool> {
    conditions_met_with(tree, form_data, &EvalContext::at(today))
}

pub fn conditions_met_with(
    tree: Option<&ConditionNode>,
    form_data: &FormData,
    ctx: &EvalContext,
) -> Result<bool> {
    match tree {
        Some(node) => check(node, form_data, ctx, 1),
        None => Ok(false),
    }
}

/// Parse and evaluate a persisted JSON tree against JSON form data.
///
/// An unknown group operator surfaces as [`LogicError::UnknownGroupOperator`].
pub fn conditions_met_json(tree: &serde_json::Value, form_data: &serde_json::Value) -> Result<bool> {
    let node = parser::parse(tree)?;
    conditions_met(node.as_ref(), &form_data_from_json(form_data))
}

fn check(node: &ConditionNode, data: &FormData, ctx: &EvalContext, depth: usize) -> Result<bool> {
    if depth > ctx.max_depth {
        tracing::warn!(max_depth = ctx.max_depth, "condition tree too deep");
        return Err(LogicError::DepthExceeded(ctx.max_depth));
    }

    match node {
        ConditionNode::Leaf(leaf) => Ok(check_leaf(leaf, data, ctx)),
        ConditionNode::Group(group) => check_group(group, data, ctx, depth),
    }
}

fn check_group(
    group: &GroupCondition,
    data: &FormData,
    ctx: &EvalContext,
    depth: usize,
) -> Result<bool> {
    if group.children.is_empty() {
        tracing::warn!(operator = group.operator.as_str(), "empty condition group");
        return Ok(false);
    }

    match group.operator {
        GroupOperator::And => {
            for child in &group.children {
                if !check(child, data, ctx, depth + 1)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        GroupOperator::Or => {
            for child in &group.children {
                if check(child, data, ctx, depth + 1)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn check_leaf(leaf: &LeafCondition, data: &FormData, ctx: &EvalContext) -> bool {
    let Some(spec) = mapping::lookup(&leaf.field_type, &leaf.operator) else {
        tracing::debug!(
            field = %leaf.field_id,
            field_type = %leaf.field_type,
            operator = %leaf.operator,
            "unsupported condition operator"
        );
        return false;
    };

    let field_value = data.get(&leaf.field_id).unwrap_or(&NULL);
    spec.comparator.apply(&leaf.operand, field_value, ctx.today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::value::FieldValue;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    fn data(pairs: &[(&str, FieldValue)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn met(tree: &ConditionNode, form: &FormData) -> bool {
        conditions_met_at(Some(tree), form, today()).unwrap()
    }

    fn bob_and_adult() -> ConditionNode {
        ConditionNode::and(vec![
            ConditionNode::leaf("name", "text", "equals", "Bob"),
            ConditionNode::leaf("age", "number", "greater_than", 18i64),
        ])
    }

    #[test]
    fn test_and_scenario() {
        let tree = bob_and_adult();
        assert!(met(&tree, &data(&[("name", "Bob".into()), ("age", 20i64.into())])));
        assert!(!met(&tree, &data(&[("name", "Bob".into()), ("age", 15i64.into())])));
        assert!(!met(&tree, &data(&[("name", "Alice".into()), ("age", 20i64.into())])));
    }

    #[test]
    fn test_or_condition() {
        let tree = ConditionNode::or(vec![
            ConditionNode::leaf("name", "text", "equals", "Bob"),
            ConditionNode::leaf("age", "number", "greater_than", 18i64),
        ]);
        assert!(met(&tree, &data(&[("name", "Alice".into()), ("age", 20i64.into())])));
        assert!(!met(&tree, &data(&[("name", "Alice".into()), ("age", 2i64.into())])));
    }

    #[test]
    fn test_missing_tree_is_not_met() {
        assert!(!conditions_met(None, &FormData::new()).unwrap());
    }

    #[test]
    fn test_missing_field_is_null() {
        let tree = ConditionNode::leaf("nickname", "text", "is_empty", true);
        assert!(met(&tree, &FormData::new()));

        let tree = ConditionNode::leaf("score", "number", "less_than", 0i64);
        assert!(!met(&tree, &FormData::new()));
    }

    #[test]
    fn test_unknown_leaf_operator_is_false() {
        let tree = ConditionNode::leaf("name", "text", "sounds_like", "Bob");
        assert!(!met(&tree, &data(&[("name", "Bob".into())])));

        let tree = ConditionNode::leaf("sig", "signature", "equals", "x");
        assert!(!met(&tree, &data(&[("sig", "x".into())])));

        // Operators are scoped to their field type
        let tree = ConditionNode::leaf("f", "files", "equals", "x");
        assert!(!met(&tree, &data(&[("f", "x".into())])));
    }

    #[test]
    fn test_empty_group_is_not_met() {
        assert!(!met(&ConditionNode::and(vec![]), &FormData::new()));
        assert!(!met(&ConditionNode::or(vec![]), &FormData::new()));
    }

    #[test]
    fn test_nested_groups() {
        // (age >= 18 AND consent) OR guardian not empty
        let tree = ConditionNode::or(vec![
            ConditionNode::and(vec![
                ConditionNode::leaf("age", "number", "greater_than_or_equal_to", 18i64),
                ConditionNode::leaf("consent", "checkbox", "is_checked", true),
            ]),
            ConditionNode::leaf("guardian", "text", "is_not_empty", true),
        ]);
        assert!(met(&tree, &data(&[("age", 18i64.into()), ("consent", true.into())])));
        assert!(!met(&tree, &data(&[("age", 18i64.into()), ("consent", false.into())])));
        assert!(met(&tree, &data(&[("age", 12i64.into()), ("guardian", "Mum".into())])));
    }

    #[test]
    fn test_depth_guard() {
        let mut tree = ConditionNode::leaf("a", "text", "is_empty", true);
        for _ in 0..5 {
            tree = ConditionNode::and(vec![tree]);
        }
        let shallow = EvalContext { today: today(), max_depth: 5 };
        let deep_enough = EvalContext { today: today(), max_depth: 6 };
        assert_eq!(
            conditions_met_with(Some(&tree), &FormData::new(), &shallow),
            Err(LogicError::DepthExceeded(5))
        );
        assert_eq!(
            conditions_met_with(Some(&tree), &FormData::new(), &deep_enough),
            Ok(true)
        );
    }

    #[test]
    fn test_short_circuit_skips_too_deep_branch() {
        let mut deep = ConditionNode::leaf("a", "text", "is_empty", true);
        for _ in 0..10 {
            deep = ConditionNode::and(vec![deep]);
        }
        let tree = ConditionNode::or(vec![ConditionNode::leaf("a", "text", "is_empty", true), deep]);
        let ctx = EvalContext { today: today(), max_depth: 4 };
        assert_eq!(conditions_met_with(Some(&tree), &FormData::new(), &ctx), Ok(true));
    }

    #[test]
    fn test_json_entry_point() {
        let tree = json!({
            "operatorIdentifier": "and",
            "children": [{
                "identifier": "1",
                "value": {
                    "operator": "contains",
                    "value": ["a", "b"],
                    "property_meta": {"id": "tags", "type": "multi_select"}
                }
            }]
        });
        assert!(conditions_met_json(&tree, &json!({"tags": ["a", "b", "c"]})).unwrap());
        assert!(!conditions_met_json(&tree, &json!({"tags": ["a"]})).unwrap());
        assert!(!conditions_met_json(&json!(null), &json!({})).unwrap());
    }

    #[test]
    fn test_json_incomplete_leaves_are_false() {
        let incomplete = [
            json!({"identifier": "a", "value": {"operator": "equals", "value": "x", "property_meta": {"type": "text"}}}),
            json!({"identifier": "b", "value": {"operator": "equals", "value": "x", "property_meta": {"id": "name"}}}),
            json!({"identifier": "c", "value": {"operator": "equals", "value": "x"}}),
            json!({"identifier": "d"}),
            json!(42),
        ];
        for leaf in incomplete {
            assert_eq!(conditions_met_json(&leaf, &json!({"name": "x"})), Ok(false), "{}", leaf);
            let tree = json!({"operatorIdentifier": "and", "children": [leaf]});
            assert_eq!(conditions_met_json(&tree, &json!({"name": "x"})), Ok(false));
        }
    }

    #[test]
    fn test_json_unknown_group_operator_is_error() {
        let tree = json!({"operatorIdentifier": "nand", "children": []});
        assert_eq!(
            conditions_met_json(&tree, &json!({})),
            Err(LogicError::UnknownGroupOperator("nand".to_string()))
        );
    }

    #[test]
    fn test_form_context_pseudo_field() {
        let tree = ConditionNode::leaf("form", "matrix", "contains", FieldValue::from(json!({"slug": "contact"})));
        let form = data(&[("form", FieldValue::from(json!({"id": 7, "slug": "contact"})))]);
        assert!(met(&tree, &form));
    }
}
