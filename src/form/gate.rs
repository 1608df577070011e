//! Integration dispatch gate and custom validation rules

use crate::condition::parser;
use crate::condition::{conditions_met, FieldValue, FormData};
use crate::error::{LogicError, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Form metadata injected as the `form` pseudo-field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormContext {
    pub id: String,
    pub slug: String,
}

impl FormContext {
    fn to_field_value(&self) -> FieldValue {
        let mut map = BTreeMap::new();
        map.insert("id".to_string(), FieldValue::String(self.id.clone()));
        map.insert("slug".to_string(), FieldValue::String(self.slug.clone()));
        FieldValue::Map(map)
    }
}

/// Whether an integration should fire for a submission.
///
/// No logic configured means the integration always runs.
pub fn should_dispatch(logic: Option<&Value>, submission: &FormData) -> Result<bool> {
    let Some(logic) = logic.filter(|l| !parser::is_blank(l)) else {
        return Ok(true);
    };
    let tree = parser::parse(logic)?;
    conditions_met(tree.as_ref(), submission)
}

/// Whether a custom "show error when ..." rule fires.
///
/// The form's `{id, slug}` is visible to the tree as the `form` field.
/// Internal failures are logged and reported as
/// [`LogicError::ValidationLogicFailed`] so respondents see a generic message.
pub fn custom_rule_fails(
    error_conditions: &Value,
    form_data: &FormData,
    form: &FormContext,
) -> Result<bool> {
    let conditions = error_conditions.get("conditions").unwrap_or(&Value::Null);

    let mut data = form_data.clone();
    data.insert("form".to_string(), form.to_field_value());

    parser::parse(conditions)
        .and_then(|tree| conditions_met(tree.as_ref(), &data))
        .map_err(|err| {
            tracing::error!(form = %form.slug, error = %err, "custom validation logic failed");
            LogicError::ValidationLogicFailed
        })
}
