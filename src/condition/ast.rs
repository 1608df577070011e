//! Condition tree model

use crate::condition::value::FieldValue;
use serde_json::{json, Map, Value};
use std::fmt;

/// A node of a persisted logic tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    /// AND/OR combinator over child nodes
    Group(GroupCondition),
    /// Single typed comparison against one field
    Leaf(LeafCondition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupCondition {
    pub operator: GroupOperator,
    pub children: Vec<ConditionNode>,
    /// Persisted keys other than `operatorIdentifier` and `children`
    pub extra: Map<String, Value>,
}

/// Group combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOperator {
    And,
    Or,
}

impl GroupOperator {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "and" => Some(GroupOperator::And),
            "or" => Some(GroupOperator::Or),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupOperator::And => "and",
            GroupOperator::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafCondition {
    /// Editor-assigned node id (usually a uuid)
    pub identifier: String,
    pub field_id: String,
    pub field_type: FieldType,
    /// Comparator name; empty when the leaf has none
    pub operator: String,
    pub operand: FieldValue,
    /// The node exactly as persisted, emitted unchanged on serialization
    pub raw: Value,
}

impl LeafCondition {
    /// A leaf that never matches, standing in for a node that cannot be read
    pub(crate) fn inert(raw: Value) -> Self {
        Self {
            identifier: String::new(),
            field_id: String::new(),
            field_type: FieldType::Other(String::new()),
            operator: String::new(),
            operand: FieldValue::Null,
            raw,
        }
    }
}

/// Field types understood by the condition mapping table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Url,
    Email,
    PhoneNumber,
    Number,
    Rating,
    Scale,
    Slider,
    Checkbox,
    Select,
    MultiSelect,
    Date,
    Files,
    Matrix,
    /// Any type name the engine has no comparators for
    Other(String),
}

impl FieldType {
    pub fn parse(s: &str) -> Self {
        match s {
            "text" => FieldType::Text,
            "url" => FieldType::Url,
            "email" => FieldType::Email,
            "phone_number" => FieldType::PhoneNumber,
            "number" => FieldType::Number,
            "rating" => FieldType::Rating,
            "scale" => FieldType::Scale,
            "slider" => FieldType::Slider,
            "checkbox" => FieldType::Checkbox,
            "select" => FieldType::Select,
            "multi_select" => FieldType::MultiSelect,
            "date" => FieldType::Date,
            "files" => FieldType::Files,
            "matrix" => FieldType::Matrix,
            other => FieldType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Url => "url",
            FieldType::Email => "email",
            FieldType::PhoneNumber => "phone_number",
            FieldType::Number => "number",
            FieldType::Rating => "rating",
            FieldType::Scale => "scale",
            FieldType::Slider => "slider",
            FieldType::Checkbox => "checkbox",
            FieldType::Select => "select",
            FieldType::MultiSelect => "multi_select",
            FieldType::Date => "date",
            FieldType::Files => "files",
            FieldType::Matrix => "matrix",
            FieldType::Other(name) => name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConditionNode {
    /// Convenience constructor for an AND group
    pub fn and(children: Vec<ConditionNode>) -> Self {
        ConditionNode::Group(GroupCondition {
            operator: GroupOperator::And,
            children,
            extra: Map::new(),
        })
    }

    /// Convenience constructor for an OR group
    pub fn or(children: Vec<ConditionNode>) -> Self {
        ConditionNode::Group(GroupCondition {
            operator: GroupOperator::Or,
            children,
            extra: Map::new(),
        })
    }

    /// Convenience constructor for a leaf; the identifier is derived from the field id
    pub fn leaf(
        field_id: &str,
        field_type: &str,
        operator: &str,
        operand: impl Into<FieldValue>,
    ) -> Self {
        let identifier = format!("{}-{}", field_id, operator);
        let operand: FieldValue = operand.into();
        let raw = json!({
            "identifier": identifier,
            "value": {
                "operator": operator,
                "value": Value::from(operand.clone()),
                "property_meta": {"id": field_id, "type": field_type},
            },
        });
        ConditionNode::Leaf(LeafCondition {
            identifier,
            field_id: field_id.to_string(),
            field_type: FieldType::parse(field_type),
            operator: operator.to_string(),
            operand,
            raw,
        })
    }

    /// Maximum nesting depth, where a lone leaf has depth 1
    pub fn depth(&self) -> usize {
        match self {
            ConditionNode::Leaf(_) => 1,
            ConditionNode::Group(group) => {
                1 + group.children.iter().map(|c| c.depth()).max().unwrap_or(0)
            }
        }
    }
}
