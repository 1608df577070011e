//! Save-time validation of a field's logic
//!
//! Walks the raw persisted JSON rather than a parsed tree, so that every
//! problem in a malformed tree is found and reported instead of stopping
//! at the first one.

use crate::condition::cache;
use crate::condition::comparator::parse_date;
use crate::condition::mapping::{self, ValueFormat};
use crate::condition::parser::is_blank;
use crate::condition::{FieldType, FieldValue};
use crate::config;
use crate::form::FieldProperty;
use crate::validation::actions::check_actions;
use crate::validation::report::{ConditionViolation, FormLogicReport, LogicReport};
use serde_json::{Map, Value};
use thiserror::Error;

/// Problems found in a condition tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    #[error("missing or invalid group operator")]
    InvalidGroupOperator,

    #[error("wrong sub-condition type")]
    WrongChildrenType,

    #[error("missing nested condition")]
    EmptyGroup,

    #[error("unrecognized condition")]
    UnrecognizedNode,

    #[error("condition nesting too deep")]
    TooDeep,

    #[error("missing condition body")]
    MissingBody,

    #[error("missing condition property")]
    MissingProperty,

    #[error("missing condition property id")]
    MissingPropertyId,

    #[error("missing condition property type")]
    MissingPropertyType,

    #[error("missing condition operator")]
    MissingOperator,

    #[error("missing condition value")]
    MissingValue,

    #[error("configuration not found for condition type")]
    UnknownFieldType,

    #[error("configuration not found for condition operator")]
    UnknownOperator,

    #[error("wrong type of condition value")]
    WrongValueType,

    #[error("invalid regex pattern")]
    InvalidRegex,

    #[error("invalid date value")]
    InvalidDate,

    #[error("condition value not allowed")]
    ValueNotAllowed,

    #[error("condition value must be empty")]
    ValueNotEmpty,
}

/// Validate a condition tree, collecting every violation with its location
pub fn check_conditions(conditions: &Value) -> Vec<ConditionViolation> {
    let mut out = Vec::new();
    if !is_blank(conditions) {
        let max_depth = config::current().max_depth;
        walk(conditions, String::new(), 1, max_depth, &mut out);
    }
    out
}

fn push(out: &mut Vec<ConditionViolation>, path: &str, error: ConditionError) {
    out.push(ConditionViolation {
        path: path.to_string(),
        error,
    });
}

fn child_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}

fn walk(node: &Value, path: String, depth: usize, max_depth: usize, out: &mut Vec<ConditionViolation>) {
    if depth > max_depth {
        push(out, &path, ConditionError::TooDeep);
        return;
    }

    let Some(obj) = node.as_object() else {
        push(out, &path, ConditionError::UnrecognizedNode);
        return;
    };

    if obj.contains_key("operatorIdentifier") || obj.contains_key("children") {
        let operator = obj.get("operatorIdentifier").and_then(Value::as_str);
        if !matches!(operator, Some("and") | Some("or")) {
            push(out, &path, ConditionError::InvalidGroupOperator);
        }
        match obj.get("children") {
            Some(Value::Array(children)) if children.is_empty() => {
                push(out, &path, ConditionError::EmptyGroup);
            }
            Some(Value::Array(children)) => {
                for (i, child) in children.iter().enumerate() {
                    let p = child_path(&path, &format!("children.{}", i));
                    walk(child, p, depth + 1, max_depth, out);
                }
            }
            None | Some(Value::Null) => push(out, &path, ConditionError::EmptyGroup),
            Some(_) => push(out, &path, ConditionError::WrongChildrenType),
        }
    } else if obj.contains_key("identifier") {
        check_leaf(obj, &path, out);
    } else {
        push(out, &path, ConditionError::UnrecognizedNode);
    }
}

fn check_leaf(obj: &Map<String, Value>, path: &str, out: &mut Vec<ConditionViolation>) {
    let path = child_path(path, "value");
    let Some(body) = obj.get("value").and_then(Value::as_object) else {
        push(out, &path, ConditionError::MissingBody);
        return;
    };

    let field_type = match body.get("property_meta").and_then(Value::as_object) {
        Some(meta) => {
            if !matches!(meta.get("id"), Some(Value::String(_)) | Some(Value::Number(_))) {
                push(out, &path, ConditionError::MissingPropertyId);
            }
            let ty = meta.get("type").and_then(Value::as_str);
            if ty.is_none() {
                push(out, &path, ConditionError::MissingPropertyType);
            }
            ty
        }
        None => {
            push(out, &path, ConditionError::MissingProperty);
            None
        }
    };

    let operator = body.get("operator").and_then(Value::as_str);
    if operator.is_none() {
        push(out, &path, ConditionError::MissingOperator);
    }

    let value = body.get("value").filter(|v| !v.is_null());
    if value.is_none() {
        push(out, &path, ConditionError::MissingValue);
    }

    let (Some(field_type), Some(operator)) = (field_type, operator) else {
        return;
    };

    let field_type = FieldType::parse(field_type);
    let Some(operators) = mapping::operators_for(&field_type) else {
        push(out, &path, ConditionError::UnknownFieldType);
        return;
    };
    let Some(spec) = operators.get(operator) else {
        push(out, &path, ConditionError::UnknownOperator);
        return;
    };
    let Some(value) = value else {
        return;
    };

    let value = FieldValue::from(value);
    if !spec.expected.iter().any(|expected| expected.accepts(&value)) {
        push(out, &path, ConditionError::WrongValueType);
        return;
    }

    if let Some(format) = &spec.format {
        if let Some(error) = check_format(format, &value) {
            push(out, &path, error);
        }
    }
}

fn check_format(format: &ValueFormat, value: &FieldValue) -> Option<ConditionError> {
    match format {
        ValueFormat::Regex => match value {
            FieldValue::String(pattern) if cache::compile(pattern).is_err() => {
                Some(ConditionError::InvalidRegex)
            }
            _ => None,
        },
        ValueFormat::Date => parse_date(value)
            .is_none()
            .then_some(ConditionError::InvalidDate),
        ValueFormat::Enum(allowed) => match value {
            FieldValue::Bool(b) if allowed.contains(b) => None,
            _ => Some(ConditionError::ValueNotAllowed),
        },
        ValueFormat::Empty => {
            let empty = match value {
                FieldValue::Map(map) => map.is_empty(),
                FieldValue::List(items) => items.is_empty(),
                _ => false,
            };
            (!empty).then_some(ConditionError::ValueNotEmpty)
        }
    }
}

/// Validate one field's logic (conditions and actions)
pub fn validate_property_logic(property: &Value) -> LogicReport {
    let field = FieldProperty::from_value(property);
    let mut report = LogicReport::new(field.display_name());

    let Some(logic) = field.logic.as_ref().filter(|logic| !is_blank(logic)) else {
        return report;
    };

    if let Some(conditions) = logic.get("conditions") {
        report.condition_errors = check_conditions(conditions);
    }
    if let Some(actions) = logic.get("actions").filter(|a| !a.is_null()) {
        report.action_errors = check_actions(&field, actions);
    }

    if !report.passed() {
        tracing::debug!(field = %report.field_name, errors = ?report.messages(), "field logic rejected");
    }
    report
}

/// Validate the logic of every property of a form
pub fn validate_form_logic(properties: &Value) -> FormLogicReport {
    let mut report = FormLogicReport::default();
    let Some(items) = properties.as_array() else {
        return report;
    };

    for (index, property) in items.iter().enumerate() {
        let field_report = validate_property_logic(property);
        if !field_report.passed() {
            report
                .failures
                .push((format!("properties.{}.logic", index), field_report));
        }
    }
    report
}
