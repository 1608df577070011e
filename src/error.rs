//! Error types for the form logic engine

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::PyErr;
use thiserror::Error;

/// Main error type for the form logic engine
///
/// Evaluation only fails on an unknown group operator or excessive nesting.
/// Bad respondent data and incomplete leaves (missing fields, unparseable
/// dates, broken regex patterns, unknown leaf operators) always degrade to
/// `false` inside the evaluator instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogicError {
    #[error("Unexpected group operator: '{0}'")]
    UnknownGroupOperator(String),

    #[error("Condition tree exceeds maximum depth of {0}")]
    DepthExceeded(usize),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("A validation logic error occurred.")]
    ValidationLogicFailed,
}

impl From<serde_json::Error> for LogicError {
    fn from(err: serde_json::Error) -> Self {
        LogicError::DeserializationError(err.to_string())
    }
}

impl From<LogicError> for PyErr {
    fn from(err: LogicError) -> PyErr {
        match err {
            LogicError::UnknownGroupOperator(_) | LogicError::DepthExceeded(_) => {
                PyRuntimeError::new_err(err.to_string())
            }
            LogicError::ValidationLogicFailed => PyRuntimeError::new_err(err.to_string()),
            LogicError::DeserializationError(_) => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Result type alias for the form logic engine
pub type Result<T> = std::result::Result<T, LogicError>;
