//! Save-time validation of field logic
//!
//! Runs when an author saves a form. Never fails: every problem in the
//! logic tree and action list is collected into a report.

pub mod actions;
mod report;
mod rule;

#[cfg(test)]
mod property_tests;

pub use actions::{check_actions, parse_actions, ActionError, LogicAction};
pub use report::*;
pub use rule::*;
