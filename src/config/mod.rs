//! Engine configuration
//!
//! Limits applied while parsing and evaluating logic trees. The active
//! configuration lives in a process-wide cell; until `install` is called
//! the defaults apply.

use crate::condition::cache;
use crate::error::{LogicError, Result};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use pyo3::types::{
    PyAnyMethods, PyBool, PyDict, PyDictMethods, PyFloat, PyInt, PyList, PyListMethods, PyString,
    PyTuple, PyTupleMethods, PyTypeMethods,
};
use pyo3::{Bound, PyAny};
use serde::Deserialize;
use std::sync::Arc;

/// Tunable limits for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Deepest group nesting accepted in a logic tree
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Compiled size limit for author-supplied regex patterns, in bytes
    #[serde(default = "default_regex_size_limit")]
    pub regex_size_limit: usize,
}

fn default_max_depth() -> usize {
    64
}

fn default_regex_size_limit() -> usize {
    1 << 20
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            regex_size_limit: default_regex_size_limit(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validated()
    }

    fn validated(self) -> Result<Self> {
        if self.max_depth == 0 {
            return Err(LogicError::DeserializationError(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Global engine configuration
static ENGINE_CONFIG: OnceCell<Arc<RwLock<EngineConfig>>> = OnceCell::new();

/// Install a configuration, replacing any previous one
pub fn install(config: EngineConfig) {
    let cell = ENGINE_CONFIG.get_or_init(|| Arc::new(RwLock::new(config)));
    *cell.write() = config;

    // Compiled patterns depend on the size limit
    cache::clear_cache();
}

/// Whether `install` has been called
pub fn is_initialized() -> bool {
    ENGINE_CONFIG.get().is_some()
}

/// Snapshot of the active configuration
#[inline]
pub fn current() -> EngineConfig {
    ENGINE_CONFIG
        .get()
        .map(|cell| *cell.read())
        .unwrap_or_default()
}

// ============================================================================
// Python conversion helpers
// ============================================================================

/// Deepest Python container nesting converted to JSON
const MAX_PY_NESTING: usize = 256;

/// Deserialize an engine config from a Python dict
/// Expected format: {"max_depth": int, "regex_size_limit": int}, both optional
pub fn deserialize_engine_config(config: &Bound<'_, PyDict>) -> pyo3::PyResult<EngineConfig> {
    let mut engine = EngineConfig::default();

    if let Some(value) = config.get_item("max_depth")? {
        if !value.is_none() {
            engine.max_depth = value.extract()?;
        }
    }
    if let Some(value) = config.get_item("regex_size_limit")? {
        if !value.is_none() {
            engine.regex_size_limit = value.extract()?;
        }
    }

    Ok(engine.validated()?)
}

/// Convert a Python object (dict/list/tuple/str/int/float/bool/None) into a JSON value
pub fn extract_json(obj: &Bound<'_, PyAny>) -> pyo3::PyResult<serde_json::Value> {
    extract_json_at(obj, 0)
}

fn extract_json_at(obj: &Bound<'_, PyAny>, depth: usize) -> pyo3::PyResult<serde_json::Value> {
    if depth > MAX_PY_NESTING {
        return Err(LogicError::DepthExceeded(MAX_PY_NESTING).into());
    }

    if obj.is_none() {
        return Ok(serde_json::Value::Null);
    }
    // bool must be checked before int: Python bools are ints
    if obj.is_instance_of::<PyBool>() {
        return Ok(serde_json::Value::Bool(obj.extract()?));
    }
    if obj.is_instance_of::<PyInt>() {
        if let Ok(i) = obj.extract::<i64>() {
            return Ok(serde_json::Value::from(i));
        }
        let f: f64 = obj.extract()?;
        return Ok(json_number(f));
    }
    if obj.is_instance_of::<PyFloat>() {
        return Ok(json_number(obj.extract()?));
    }
    if obj.is_instance_of::<PyString>() {
        return Ok(serde_json::Value::String(obj.extract()?));
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let mut map = serde_json::Map::with_capacity(dict.len());
        for (key, value) in dict.iter() {
            let key = match key.extract::<String>() {
                Ok(s) => s,
                Err(_) => key.str()?.extract()?,
            };
            map.insert(key, extract_json_at(&value, depth + 1)?);
        }
        return Ok(serde_json::Value::Object(map));
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return list
            .iter()
            .map(|item| extract_json_at(&item, depth + 1))
            .collect::<pyo3::PyResult<Vec<_>>>()
            .map(serde_json::Value::Array);
    }
    if let Ok(tuple) = obj.downcast::<PyTuple>() {
        return tuple
            .iter()
            .map(|item| extract_json_at(&item, depth + 1))
            .collect::<pyo3::PyResult<Vec<_>>>()
            .map(serde_json::Value::Array);
    }

    Err(LogicError::DeserializationError(format!(
        "Unsupported value type: {}",
        obj.get_type().name()?
    ))
    .into())
}

fn json_number(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f).map_or(serde_json::Value::Null, serde_json::Value::Number)
}
