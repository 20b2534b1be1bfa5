//! Configuration and schema document loading.
//!
//! YAML and JSON files are both loaded into a `serde_json::Value` tree, so
//! the schema engine sees one value model regardless of the source format.
//! YAML values with no JSON counterpart are folded in: tags are dropped,
//! non-string mapping keys are stringified. Non-finite floats (`.inf`,
//! `.nan`) are rejected.

use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::error::{WorkflowError, WorkflowResult};

/// On-disk document format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` is JSON, everything else is read as YAML (a superset).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Read and parse the document at `path`.
pub fn load_document(path: &Path) -> WorkflowResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| WorkflowError::DocumentLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_document(&text, DocumentFormat::from_path(path), path)
}

/// Parse document text. `path` is used for error reporting only.
pub fn parse_document(text: &str, format: DocumentFormat, path: &Path) -> WorkflowResult<Value> {
    let load_error = |reason: String| WorkflowError::DocumentLoad {
        path: path.to_path_buf(),
        reason,
    };
    if is_blank(text) {
        return Err(WorkflowError::EmptyDocument {
            path: path.to_path_buf(),
        });
    }
    let value = match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| load_error(e.to_string()))?,
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| load_error(e.to_string()))?;
            yaml_to_json_value(yaml).map_err(load_error)?
        }
    };
    if value.is_null() {
        return Err(WorkflowError::EmptyDocument {
            path: path.to_path_buf(),
        });
    }
    Ok(value)
}

/// Render a value in the given format, for writing schemas back out.
pub fn render_document(value: &Value, format: DocumentFormat) -> WorkflowResult<String> {
    let rendered = match format {
        DocumentFormat::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
    };
    rendered.map_err(|reason| WorkflowError::Render { reason })
}

/// Write rendered text to `path`, replacing any existing file.
pub fn write_document(path: &Path, text: &str) -> WorkflowResult<()> {
    std::fs::write(path, text)?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "wrote document");
    Ok(())
}

/// Only whitespace and comment lines.
fn is_blank(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

/// Convert a `serde_yaml::Value` into a `serde_json::Value`.
///
/// Integral numbers stay integral and fractional numbers stay fractional:
/// `2.0` remains a float so the schema engine types it as `number`.
fn yaml_to_json_value(yaml: serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(Number::from(u)))
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| format!("number {n} has no JSON representation"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s)),
        serde_yaml::Value::Sequence(seq) => seq
            .into_iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut obj = Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    other => return Err(format!("unsupported mapping key {other:?}")),
                };
                obj.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(obj))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(tagged.value),
    }
}
