//! Shared plumbing for the line-oriented input files (trace list, experiment
//! file, metric file).

use std::path::{Path, PathBuf};

/// Errors raised while reading or parsing an input file.
#[derive(Debug)]
pub enum ParseError {
    /// The file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An experiment referenced a `$VAR` that no earlier line defined.
    UndefinedVariable { key: String, experiment: String },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ParseError::UndefinedVariable { key, experiment } => {
                write!(f, "{key} is not defined before exp {experiment}")
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io { source, .. } => Some(source),
            ParseError::UndefinedVariable { .. } => None,
        }
    }
}

/// Read an input file into memory, attaching the path to any error.
pub fn read_input(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Lines that carry content: trimmed, skipping blanks and `#` comments.
///
/// Used by the experiment and metric parsers. The trace list does not honor
/// comments and walks its lines itself.
pub fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}
