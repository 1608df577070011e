//! Logic actions and the field-state rules that restrict them

use crate::form::FieldProperty;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// What a field's logic does when its conditions are met
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicAction {
    ShowBlock,
    HideBlock,
    MakeItOptional,
    RequireAnswer,
    EnableBlock,
    DisableBlock,
}

impl LogicAction {
    pub const ALL: [LogicAction; 6] = [
        LogicAction::ShowBlock,
        LogicAction::HideBlock,
        LogicAction::MakeItOptional,
        LogicAction::RequireAnswer,
        LogicAction::EnableBlock,
        LogicAction::DisableBlock,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicAction::ShowBlock => "show-block",
            LogicAction::HideBlock => "hide-block",
            LogicAction::MakeItOptional => "make-it-optional",
            LogicAction::RequireAnswer => "require-answer",
            LogicAction::EnableBlock => "enable-block",
            LogicAction::DisableBlock => "disable-block",
        }
    }
}

impl fmt::Display for LogicAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout blocks that hold no answer
pub const NON_INPUT_BLOCKS: [&str; 5] = ["nf-text", "nf-code", "nf-page-break", "nf-divider", "nf-image"];

const BLOCK_ACTIONS: &[LogicAction] = &[LogicAction::HideBlock, LogicAction::ShowBlock];
const HIDDEN_ACTIONS: &[LogicAction] = &[LogicAction::ShowBlock, LogicAction::RequireAnswer];
const REQUIRED_ACTIONS: &[LogicAction] = &[
    LogicAction::MakeItOptional,
    LogicAction::HideBlock,
    LogicAction::DisableBlock,
];
const DISABLED_ACTIONS: &[LogicAction] = &[
    LogicAction::EnableBlock,
    LogicAction::RequireAnswer,
    LogicAction::MakeItOptional,
];

/// Reasons an action list is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("missing logic actions")]
    Missing,

    #[error("unknown action '{0}'")]
    Unknown(String),

    #[error("'{action}' is not allowed on a {block_type} block")]
    NotAllowedOnBlock {
        action: LogicAction,
        block_type: String,
    },

    #[error("'{0}' is not allowed on a hidden field")]
    NotAllowedWhenHidden(LogicAction),

    #[error("'{0}' is not allowed on a required field")]
    NotAllowedWhenRequired(LogicAction),

    #[error("'{0}' is not allowed on a disabled field")]
    NotAllowedWhenDisabled(LogicAction),
}

/// Parse a persisted action list, skipping anything unrecognised
pub fn parse_actions(actions: &Value) -> Vec<LogicAction> {
    actions
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(LogicAction::parse)
                .collect()
        })
        .unwrap_or_default()
}

/// Check every action against the field's own state, reporting all violations
pub fn check_actions(field: &FieldProperty, actions: &Value) -> Vec<ActionError> {
    let items = match actions.as_array() {
        Some(items) if !items.is_empty() => items,
        _ => return vec![ActionError::Missing],
    };

    let mut errors = Vec::new();
    for raw in items {
        let Some(action) = raw.as_str().and_then(LogicAction::parse) else {
            let name = raw.as_str().map_or_else(|| raw.to_string(), str::to_string);
            errors.push(ActionError::Unknown(name));
            continue;
        };

        if NON_INPUT_BLOCKS.contains(&field.field_type.as_str()) && !BLOCK_ACTIONS.contains(&action) {
            errors.push(ActionError::NotAllowedOnBlock {
                action,
                block_type: field.field_type.clone(),
            });
        }
        if field.is_hidden() && !HIDDEN_ACTIONS.contains(&action) {
            errors.push(ActionError::NotAllowedWhenHidden(action));
        }
        if field.is_required() && !REQUIRED_ACTIONS.contains(&action) {
            errors.push(ActionError::NotAllowedWhenRequired(action));
        }
        if field.is_disabled() && !DISABLED_ACTIONS.contains(&action) {
            errors.push(ActionError::NotAllowedWhenDisabled(action));
        }
    }
    errors
}
