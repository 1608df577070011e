//! Conversion between persisted logic-tree JSON and [`ConditionNode`]

use crate::condition::ast::{ConditionNode, FieldType, GroupCondition, GroupOperator, LeafCondition};
use crate::condition::value::FieldValue;
use crate::config;
use crate::error::{LogicError, Result};
use serde_json::{Map, Value};

/// Parse a persisted logic tree.
///
/// `null`, `{}` and `[]` mean "no tree" and yield `Ok(None)`.
pub fn parse(value: &Value) -> Result<Option<ConditionNode>> {
    parse_with_limit(value, config::current().max_depth)
}

/// Parse a logic tree from its JSON text
pub fn parse_str(json: &str) -> Result<Option<ConditionNode>> {
    let value: Value = serde_json::from_str(json)?;
    parse(&value)
}

pub fn parse_with_limit(value: &Value, max_depth: usize) -> Result<Option<ConditionNode>> {
    if is_blank(value) {
        return Ok(None);
    }
    parse_node(value, 1, max_depth).map(Some)
}

/// Whether a JSON value stands for an absent logic tree
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn parse_node(value: &Value, depth: usize, max_depth: usize) -> Result<ConditionNode> {
    if depth > max_depth {
        return Err(LogicError::DepthExceeded(max_depth));
    }

    let Some(obj) = value.as_object() else {
        tracing::debug!(node = %value, "condition node is not an object");
        return Ok(ConditionNode::Leaf(LeafCondition::inert(value.clone())));
    };

    if obj.contains_key("operatorIdentifier") || obj.contains_key("children") {
        return parse_group(obj, depth, max_depth).map(ConditionNode::Group);
    }

    if obj.contains_key("identifier") {
        return Ok(ConditionNode::Leaf(parse_leaf(value, obj)));
    }

    tracing::debug!("condition node is neither a group nor a leaf");
    Ok(ConditionNode::Leaf(LeafCondition::inert(value.clone())))
}

fn parse_group(obj: &Map<String, Value>, depth: usize, max_depth: usize) -> Result<GroupCondition> {
    let raw_operator = obj
        .get("operatorIdentifier")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let operator = GroupOperator::parse(raw_operator)
        .ok_or_else(|| LogicError::UnknownGroupOperator(raw_operator.to_string()))?;

    // Anything but a list of children reads as an empty group
    let children = match obj.get("children") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|child| parse_node(child, depth + 1, max_depth))
            .collect::<Result<Vec<_>>>()?,
        _ => Vec::new(),
    };

    let extra = obj
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "operatorIdentifier" | "children"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(GroupCondition {
        operator,
        children,
        extra,
    })
}

/// Read a leaf leniently. Missing parts leave a leaf that never matches.
fn parse_leaf(raw: &Value, obj: &Map<String, Value>) -> LeafCondition {
    let identifier = match obj.get("identifier") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let body = obj.get("value").and_then(Value::as_object);
    let meta = body
        .and_then(|body| body.get("property_meta"))
        .and_then(Value::as_object);

    let field_id = match meta.and_then(|meta| meta.get("id")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let field_type = meta
        .and_then(|meta| meta.get("type"))
        .and_then(Value::as_str)
        .map_or_else(|| FieldType::Other(String::new()), FieldType::parse);

    let operator = body
        .and_then(|body| body.get("operator"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let operand = body
        .and_then(|body| body.get("value"))
        .map(FieldValue::from)
        .unwrap_or_default();

    LeafCondition {
        identifier,
        field_id,
        field_type,
        operator,
        operand,
        raw: raw.clone(),
    }
}

impl ConditionNode {
    /// Serialize back into the persisted JSON shape
    pub fn to_value(&self) -> Value {
        match self {
            ConditionNode::Group(group) => {
                let mut obj = Map::with_capacity(group.extra.len() + 2);
                obj.insert(
                    "operatorIdentifier".to_string(),
                    Value::from(group.operator.as_str()),
                );
                obj.insert(
                    "children".to_string(),
                    group.children.iter().map(ConditionNode::to_value).collect(),
                );
                for (key, value) in &group.extra {
                    obj.insert(key.clone(), value.clone());
                }
                Value::Object(obj)
            }
            ConditionNode::Leaf(leaf) => leaf.raw.clone(),
        }
    }
}
