//! Logic condition parsing and evaluation
//!
//! Persisted logic trees (AND/OR groups over typed leaf comparisons) are
//! parsed into [`ConditionNode`]s and evaluated against submitted form data.

mod ast;
pub mod cache;
pub mod comparator;
mod evaluator;
pub mod mapping;
pub mod parser;
mod value;


pub use ast::*;
pub use comparator::Comparator;
pub use evaluator::*;
pub use mapping::{ExpectedType, OperatorSpec, ValueFormat};
pub use parser::{parse, parse_str};
pub use value::*;
