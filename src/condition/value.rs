//! Tagged values for condition operands and submitted form data

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// Submitted form data, keyed by field id
pub type FormData = HashMap<String, FieldValue>;

/// A loosely-typed value as it appears in form submissions and condition operands
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

pub(crate) static NULL: FieldValue = FieldValue::Null;

impl FieldValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Null, the empty string, or an empty list
    #[inline]
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::String(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Truthiness used by checkbox fields
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => *n != 0.0,
            FieldValue::String(s) => !s.is_empty() && s != "0",
            FieldValue::List(items) => !items.is_empty(),
            FieldValue::Map(map) => !map.is_empty(),
        }
    }

    /// Numeric coercion; numeric strings parse, everything else is unknown
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Textual form of scalar values
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::String(s) => Some(Cow::Borrowed(s.as_str())),
            FieldValue::Number(n) => Some(Cow::Owned(format_number(*n))),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Strict equality, except that numbers compare by value
    pub fn loosely_equals(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
            (FieldValue::List(a), FieldValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            (FieldValue::Map(a), FieldValue::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.loosely_equals(w)))
            }
            _ => self == other,
        }
    }

    /// Name used by the condition mapping table for this value's shape
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Number(_) => "number",
            FieldValue::String(_) => "string",
            FieldValue::List(_) => "array",
            FieldValue::Map(_) => "object",
        }
    }
}

/// Integral floats print without a fractional part, so `5` stays `"5"`
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(FieldValue::Null, FieldValue::Number),
            serde_json::Value::String(s) => FieldValue::String(s),
            serde_json::Value::Array(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from).collect())
            }
            serde_json::Value::Object(map) => FieldValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        FieldValue::from(value.clone())
    }
}

impl From<FieldValue> for serde_json::Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Bool(b) => serde_json::Value::Bool(b),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
                    serde_json::Value::from(n as i64)
                } else {
                    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, Into::into)
                }
            }
            FieldValue::String(s) => serde_json::Value::String(s),
            FieldValue::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            FieldValue::Map(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Build form data from a JSON object; anything else yields an empty map
pub fn form_data_from_json(value: &serde_json::Value) -> FormData {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::from(v)))
            .collect(),
        _ => FormData::new(),
    }
}
