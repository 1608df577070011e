//! Callers of the evaluator: field state resolution, integration dispatch
//! and custom validation rules.

mod gate;
mod property;
pub mod resolver;

pub use gate::*;
pub use property::*;
pub use resolver::{is_disabled, is_hidden, is_required, FieldState, LogicPropertyResolver};
