//! Field logic property resolver
//!
//! Decides whether a field ends up hidden, required or disabled for a given
//! submission. A field without logic keeps its configured state and the
//! evaluator is never called for it.

use crate::condition::parser;
use crate::condition::{conditions_met, FormData};
use crate::error::Result;
use crate::form::FieldProperty;
use crate::validation::{parse_actions, LogicAction};
use once_cell::unsync::OnceCell;
use serde_json::Value;

/// Resolved state of a field for one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldState {
    pub hidden: bool,
    pub required: bool,
    pub disabled: bool,
}

/// Resolves one field's state against form data
pub struct LogicPropertyResolver<'a> {
    property: &'a FieldProperty,
    form_data: &'a FormData,
    /// `None` when the field has no usable logic
    logic: Option<&'a Value>,
    /// Actions to apply, `None` when the conditions are not met
    applied: OnceCell<Result<Option<Vec<LogicAction>>>>,
}

impl<'a> LogicPropertyResolver<'a> {
    pub fn new(property: &'a FieldProperty, form_data: &'a FormData) -> Self {
        let logic = property
            .logic
            .as_ref()
            .filter(|logic| !parser::is_blank(logic));
        Self {
            property,
            form_data,
            logic,
            applied: OnceCell::new(),
        }
    }

    /// Evaluated at most once per resolver
    fn logic_applies(&self) -> Result<Option<&[LogicAction]>> {
        self.applied
            .get_or_init(|| self.evaluate_logic())
            .as_ref()
            .map(|actions| actions.as_deref())
            .map_err(Clone::clone)
    }

    fn evaluate_logic(&self) -> Result<Option<Vec<LogicAction>>> {
        let Some(logic) = self.logic else {
            return Ok(None);
        };
        let tree = match logic.get("conditions") {
            Some(conditions) => parser::parse(conditions)?,
            None => None,
        };
        if !conditions_met(tree.as_ref(), self.form_data)? {
            return Ok(None);
        }
        let actions = logic.get("actions").map(parse_actions).unwrap_or_default();
        Ok(Some(actions))
    }

    pub fn should_be_required(&self) -> Result<bool> {
        let Some(required) = self.property.required else {
            return Ok(false);
        };
        let actions = self.logic_applies()?;
        Ok(required_state(required, actions))
    }

    pub fn should_be_hidden(&self) -> Result<bool> {
        let Some(hidden) = self.property.hidden else {
            return Ok(false);
        };
        let actions = self.logic_applies()?;
        Ok(hidden_state(hidden, actions))
    }

    pub fn should_be_disabled(&self) -> Result<bool> {
        let Some(disabled) = self.property.disabled else {
            return Ok(false);
        };
        let actions = self.logic_applies()?;
        Ok(disabled_state(disabled, actions))
    }

    /// Resolve all three flags, evaluating the conditions once
    pub fn resolve(&self) -> Result<FieldState> {
        let actions = self.logic_applies()?;
        Ok(FieldState {
            hidden: self
                .property
                .hidden
                .is_some_and(|hidden| hidden_state(hidden, actions)),
            required: self
                .property
                .required
                .is_some_and(|required| required_state(required, actions)),
            disabled: self
                .property
                .disabled
                .is_some_and(|disabled| disabled_state(disabled, actions)),
        })
    }
}

/// `actions` is `Some` only when the field's conditions are met
fn required_state(required: bool, actions: Option<&[LogicAction]>) -> bool {
    let Some(actions) = actions else {
        return required;
    };
    let relaxes = [
        LogicAction::MakeItOptional,
        LogicAction::HideBlock,
        LogicAction::DisableBlock,
    ];
    if required && actions.iter().any(|a| relaxes.contains(a)) {
        return false;
    }
    if !required && actions.contains(&LogicAction::RequireAnswer) {
        return true;
    }
    required
}

fn hidden_state(hidden: bool, actions: Option<&[LogicAction]>) -> bool {
    let Some(actions) = actions else {
        return hidden;
    };
    if hidden && actions.contains(&LogicAction::ShowBlock) {
        return false;
    }
    if !hidden && actions.contains(&LogicAction::HideBlock) {
        return true;
    }
    hidden
}

fn disabled_state(disabled: bool, actions: Option<&[LogicAction]>) -> bool {
    let Some(actions) = actions else {
        return disabled;
    };
    if disabled && actions.contains(&LogicAction::EnableBlock) {
        return false;
    }
    if !disabled && actions.contains(&LogicAction::DisableBlock) {
        return true;
    }
    disabled
}

/// Use a shared [`LogicPropertyResolver`] or [`LogicPropertyResolver::resolve`]
/// when more than one flag is needed for the same field.
pub fn is_required(property: &FieldProperty, form_data: &FormData) -> Result<bool> {
    LogicPropertyResolver::new(property, form_data).should_be_required()
}

pub fn is_hidden(property: &FieldProperty, form_data: &FormData) -> Result<bool> {
    LogicPropertyResolver::new(property, form_data).should_be_hidden()
}

pub fn is_disabled(property: &FieldProperty, form_data: &FormData) -> Result<bool> {
    LogicPropertyResolver::new(property, form_data).should_be_disabled()
}
