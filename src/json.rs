//! JSON file format
//!
//! Manifests and the feed are pretty-printed with 2-space indentation and a
//! trailing newline. Key order is preserved as read.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::error::ManifestError;

/// Pretty form used for change detection (no trailing newline).
pub fn to_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, ManifestError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Read and parse a JSON file. Bytes that are not UTF-8 are a parse
/// failure, not an I/O one.
pub fn read_value(path: &Path) -> Result<Value, ManifestError> {
    let content = fs::read(path).map_err(|e| ManifestError::io(path, e))?;
    serde_json::from_slice(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_object(path: &Path) -> Result<Map<String, Value>, ManifestError> {
    match read_value(path)? {
        Value::Object(map) => Ok(map),
        _ => Err(ManifestError::NotAnObject { path: path.to_path_buf() }),
    }
}

pub fn read_array(path: &Path) -> Result<Vec<Value>, ManifestError> {
    match read_value(path)? {
        Value::Array(records) => Ok(records),
        _ => Err(ManifestError::NotAnArray { path: path.to_path_buf() }),
    }
}

/// Write already-pretty content, appending the trailing newline.
pub fn write_pretty(path: &Path, pretty: &str) -> Result<(), ManifestError> {
    let mut content = String::with_capacity(pretty.len() + 1);
    content.push_str(pretty);
    content.push('\n');
    fs::write(path, content).map_err(|e| ManifestError::io(path, e))
}
