//! Reading evaluation exports from disk.

use crate::errors::{Error, Result, ResultExt};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Read an export file and parse it as JSON.
///
/// # Errors
///
/// Returns `Error::Io` (not user-fixable) when the file cannot be read and
/// `Error::Json` when its contents are not JSON, both wrapped with the path.
pub fn read_export(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .map_err(Error::from)
        .context(format!("{} is not valid JSON", path.display()))
}
