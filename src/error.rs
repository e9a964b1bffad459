//! The three error kinds this crate can produce.
//!
//! A [`ParseError`] means a value violated a grammar. A
//! [`ConstructionError`] means the configuration's relationship to the host
//! program is broken: a schema naming a selector the host never supplied,
//! or a scoped reference naming a production its scope does not define.
//! A [`LoadError`] is a file-level problem and is only produced by the
//! loader. [`Error`] aggregates all three for the public API.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::util::preview;

/// A value failed to match a grammar.
///
/// Carries a single human-readable message: a truncated rendering of the
/// offending value, the syntax the parser expected, and one line per
/// specific violation. `UnionExp` traps these while probing alternatives;
/// everywhere else they are fatal.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(target: &Value, syntax: &str, details: Vec<String>) -> ParseError {
        let mut message = format!("Failed to parse {}, expected \n{}", preview(target), syntax);
        for detail in details {
            message.push('\n');
            message.push_str(&detail);
        }
        ParseError { message }
    }

    pub(crate) fn recursion_limit(scope: &str, production: &str, limit: usize) -> ParseError {
        ParseError {
            message: format!(
                "Recursion limit ({limit}) exceeded while expanding {scope}::{production}"
            ),
        }
    }

    /// The full human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The configuration cannot be wired to the host program.
///
/// Unlike [`ParseError`] this does not mean the configuration is
/// ill-shaped; it means the shape asks for something the program cannot
/// provide.
#[derive(Clone, Debug, Error)]
pub enum ConstructionError {
    /// A scoped reference names a production its scope never defined.
    #[error("scoped parser construction failed, {scope}::{name} does not exist")]
    UnknownProduction {
        /// Name of the scope the reference points into.
        scope: String,
        /// Name of the missing production.
        name: String,
    },
    /// The schema declares a selector the host-supplied table lacks.
    #[error("\"{0}\" is required by the schema")]
    MissingSelector(String),
}

/// A configuration file could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The path does not exist.
    #[error("configuration does not exist on path {}", .0.display())]
    Missing(PathBuf),
    /// The path exists but is not a regular file.
    #[error("{} expected to be a file", .0.display())]
    NotAFile(PathBuf),
    /// The file does not carry a `.json` extension.
    #[error("{} expected to be a JSON file", .0.display())]
    WrongExtension(PathBuf),
    /// The file could not be read.
    #[error("failed to read {}", .path.display())]
    Unreadable {
        /// Path of the unreadable file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The file's contents are not valid JSON.
    #[error("{} is not valid JSON", .path.display())]
    InvalidJson {
        /// Path of the malformed file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Any error this crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// A file-level problem, from the loader only.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// A grammar violation.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A configuration/host wiring problem.
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}
