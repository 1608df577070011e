//! OpnForm Logic Core - form logic condition evaluator and logic validator
//!
//! This crate evaluates the AND/OR condition trees that drive field
//! visibility, requiredness and integration dispatch in form submissions,
//! and validates those trees when a form is saved. Python bindings are
//! provided via PyO3.

use pyo3::prelude::*;

pub mod condition;
pub mod config;
pub mod error;
pub mod form;
pub mod validation;

use crate::condition::{conditions_met_json, form_data_from_json};
use crate::config::{deserialize_engine_config, extract_json, EngineConfig};
use crate::error::LogicError;
use crate::form::{FieldProperty, LogicPropertyResolver};
use crate::validation::LogicReport;
use pyo3::types::{PyDict, PyList};

// ============================================================================
// Python Functions
// ============================================================================

/// Install the engine configuration (optional; defaults apply otherwise)
///
/// # Arguments
/// * `config` - Optional dict with `max_depth` and `regex_size_limit`
#[pyfunction]
#[pyo3(signature = (config=None))]
fn init_config(config: Option<&Bound<'_, PyDict>>) -> PyResult<()> {
    let engine = match config {
        Some(dict) => deserialize_engine_config(dict)?,
        None => EngineConfig::default(),
    };
    config::install(engine);
    Ok(())
}

/// Check if config has been installed
#[pyfunction]
fn is_config_initialized() -> bool {
    config::is_initialized()
}

/// Evaluate a logic tree against form data
///
/// # Arguments
/// * `tree` - Persisted logic tree (dict), or None
/// * `form_data` - Submitted values keyed by field id
///
/// # Returns
/// True if the conditions are met; False for a missing tree
///
/// # Raises
/// RuntimeError on a corrupted tree (unknown group operator, excessive nesting)
#[pyfunction]
#[pyo3(signature = (tree, form_data))]
fn conditions_met(tree: &Bound<'_, PyAny>, form_data: &Bound<'_, PyAny>) -> PyResult<bool> {
    let tree = extract_json(tree)?;
    let form_data = extract_json(form_data)?;
    Ok(conditions_met_json(&tree, &form_data)?)
}

/// Evaluate many (tree, form_data) pairs asynchronously
///
/// Conversion from Python objects happens up front; the evaluation itself
/// runs on a Tokio blocking thread so the asyncio event loop stays responsive.
///
/// # Returns
/// A Python awaitable that resolves to a list of booleans, in input order
///
/// # Example (Python)
/// ```python
/// results = await conditions_met_async([(integration.logic, submission)])
/// ```
#[pyfunction]
fn conditions_met_async<'py>(
    py: Python<'py>,
    batch: &Bound<'py, PyList>,
) -> PyResult<Bound<'py, PyAny>> {
    let mut pairs = Vec::with_capacity(batch.len());
    for item in batch.iter() {
        let (tree, form_data): (Bound<'py, PyAny>, Bound<'py, PyAny>) = item.extract()?;
        pairs.push((extract_json(&tree)?, extract_json(&form_data)?));
    }

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let results = tokio::task::spawn_blocking(move || {
            pairs
                .iter()
                .map(|(tree, form_data)| conditions_met_json(tree, form_data))
                .collect::<Result<Vec<bool>, LogicError>>()
        })
        .await
        .map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Evaluation task panicked: {}",
                e
            ))
        })??;

        Ok(results)
    })
}

/// Validate a field's logic before it is saved
///
/// # Returns
/// A LogicReport with `passed`, `messages`, `condition_errors`, `action_errors`
#[pyfunction]
fn validate_property_logic(property: &Bound<'_, PyAny>) -> PyResult<LogicReport> {
    let property = extract_json(property)?;
    Ok(validation::validate_property_logic(&property))
}

/// Resolve whether a field is hidden, required and disabled for a submission
///
/// # Returns
/// Dict with boolean `hidden`, `required` and `disabled` keys
#[pyfunction]
fn field_state<'py>(
    py: Python<'py>,
    property: &Bound<'py, PyAny>,
    form_data: &Bound<'py, PyAny>,
) -> PyResult<Bound<'py, PyDict>> {
    let property = FieldProperty::from_value(&extract_json(property)?);
    let form_data = form_data_from_json(&extract_json(form_data)?);
    let state = LogicPropertyResolver::new(&property, &form_data).resolve()?;

    let dict = PyDict::new(py);
    dict.set_item("hidden", state.hidden)?;
    dict.set_item("required", state.required)?;
    dict.set_item("disabled", state.disabled)?;
    Ok(dict)
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn opnform_logic_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_config, m)?)?;
    m.add_function(wrap_pyfunction!(is_config_initialized, m)?)?;
    m.add_function(wrap_pyfunction!(conditions_met, m)?)?;
    m.add_function(wrap_pyfunction!(conditions_met_async, m)?)?;
    m.add_function(wrap_pyfunction!(validate_property_logic, m)?)?;
    m.add_function(wrap_pyfunction!(field_state, m)?)?;
    m.add_class::<LogicReport>()?;
    Ok(())
}
