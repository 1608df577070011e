//! Validation reports
//!
//! `LogicReport` is exposed to Python as a class so callers can read the
//! pass/fail flag and the messages without re-serializing anything.

use pyo3::prelude::*;
use std::collections::BTreeMap;

use crate::validation::actions::ActionError;
use crate::validation::rule::ConditionError;

/// A condition error and where in the tree it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionViolation {
    /// Dotted path from the tree root, e.g. `children.1.value`
    pub path: String,
    pub error: ConditionError,
}

/// Result of validating one field's logic
#[pyclass]
#[derive(Debug, Clone, Default)]
pub struct LogicReport {
    pub field_name: String,
    pub condition_errors: Vec<ConditionViolation>,
    pub action_errors: Vec<ActionError>,
}

impl LogicReport {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            ..Default::default()
        }
    }

    pub fn passed(&self) -> bool {
        self.condition_errors.is_empty() && self.action_errors.is_empty()
    }

    /// Distinct condition error descriptions, in first-seen order
    pub fn condition_details(&self) -> Vec<String> {
        distinct(self.condition_errors.iter().map(|v| v.error.to_string()))
    }

    pub fn action_details(&self) -> Vec<String> {
        distinct(self.action_errors.iter().map(ToString::to_string))
    }

    /// Human-readable messages, at most one for conditions and one for actions
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::with_capacity(2);
        if !self.condition_errors.is_empty() {
            messages.push(format!(
                "The logic conditions for {} are not complete. Error detail(s): {}",
                self.field_name,
                self.condition_details().join(", ")
            ));
        }
        if !self.action_errors.is_empty() {
            messages.push(format!(
                "The logic actions for {} are not valid. Error detail(s): {}",
                self.field_name,
                self.action_details().join(", ")
            ));
        }
        messages
    }
}

fn distinct(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[pymethods]
impl LogicReport {
    #[getter(passed)]
    fn py_passed(&self) -> bool {
        self.passed()
    }

    #[getter(field_name)]
    fn py_field_name(&self) -> String {
        self.field_name.clone()
    }

    #[getter(messages)]
    fn py_messages(&self) -> Vec<String> {
        self.messages()
    }

    /// List of (path, description) pairs
    #[getter(condition_errors)]
    fn py_condition_errors(&self) -> Vec<(String, String)> {
        self.condition_errors
            .iter()
            .map(|v| (v.path.clone(), v.error.to_string()))
            .collect()
    }

    #[getter(action_errors)]
    fn py_action_errors(&self) -> Vec<String> {
        self.action_errors.iter().map(ToString::to_string).collect()
    }

    fn __bool__(&self) -> bool {
        self.passed()
    }

    fn __repr__(&self) -> String {
        format!(
            "LogicReport(field_name={:?}, passed={})",
            self.field_name,
            self.passed()
        )
    }
}

/// Result of validating every property of a form
#[derive(Debug, Clone, Default)]
pub struct FormLogicReport {
    /// `properties.<index>.logic` -> failing field report
    pub failures: Vec<(String, LogicReport)>,
}

impl FormLogicReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Messages keyed by attribute path, ready for a 422 response body
    pub fn errors(&self) -> BTreeMap<String, Vec<String>> {
        self.failures
            .iter()
            .map(|(key, report)| (key.clone(), report.messages()))
            .collect()
    }
}
