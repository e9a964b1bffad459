//! Locating and reading configuration files.
//!
//! File-level problems are a distinct error class ([`LoadError`]) from
//! anything the grammar machinery reports: a missing file and an
//! ill-shaped configuration are different mistakes with different fixes.

use std::fs;
use std::path::Path;

use log::debug;
use serde_json::Value;

use crate::error::LoadError;

/// Read a `.json` configuration file into a JSON value.
///
/// The path must exist, be a regular file, and carry a `.json` extension;
/// the contents must parse as JSON. Each violation maps to its own
/// [`LoadError`] variant.
pub fn load_config(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing(path.to_owned()));
    }
    if !path.is_file() {
        return Err(LoadError::NotAFile(path.to_owned()));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return Err(LoadError::WrongExtension(path.to_owned()));
    }
    let text = fs::read_to_string(path).map_err(|source| LoadError::Unreadable {
        path: path.to_owned(),
        source,
    })?;
    debug!("read {} bytes of configuration from {}", text.len(), path.display());
    serde_json::from_str(&text).map_err(|source| LoadError::InvalidJson {
        path: path.to_owned(),
        source,
    })
}
