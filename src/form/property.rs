//! Form field property as stored in a form definition

use serde_json::Value;

/// The parts of a form field that logic cares about.
///
/// `hidden` / `required` / `disabled` stay `None` when the key is absent,
/// which the resolver treats differently from an explicit `false`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldProperty {
    pub id: String,
    pub name: String,
    pub field_type: String,
    pub hidden: Option<bool>,
    pub required: Option<bool>,
    pub disabled: Option<bool>,
    /// Raw `{conditions, actions}` logic object
    pub logic: Option<Value>,
}

impl FieldProperty {
    /// Read a property leniently; missing or mistyped keys fall back to defaults
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| match value.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let flag = |key: &str| value.get(key).and_then(loose_bool);

        Self {
            id: text("id"),
            name: text("name"),
            field_type: text("type"),
            hidden: flag("hidden"),
            required: flag("required"),
            disabled: flag("disabled"),
            logic: value.get("logic").filter(|l| !l.is_null()).cloned(),
        }
    }

    /// Name used in validation messages
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.id.is_empty() {
            &self.id
        } else {
            "field"
        }
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden.unwrap_or(false)
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }
}

/// Booleans as editors persist them: true/false, 0/1, "1"/"0", "true"/"false"
fn loose_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.as_str() {
            "1" | "true" => Some(true),
            "0" | "false" | "" => Some(false),
            _ => None,
        },
        Value::Null => None,
        _ => None,
    }
}
