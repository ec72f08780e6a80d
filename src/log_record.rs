//! Result log extraction.
//!
//! Each (trace, experiment) run leaves a log named `{trace}_{experiment}.{ext}`.
//! `.stats` logs hold `key=value` lines; every other extension holds
//! `key value` lines, and only lines with exactly one space count.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Extension whose logs use `key=value` lines.
pub const STATS_EXT: &str = "stats";

/// Fields read from one run's log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogRecord {
    fields: HashMap<String, String>,
    /// Whether the log file was found at all.
    pub found: bool,
}

impl LogRecord {
    /// Record for a run whose log does not exist.
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Failure to read a log that does exist.
#[derive(Debug)]
pub enum LogRecordError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for LogRecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogRecordError::Io { path, source } => {
                write!(f, "failed to read log {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LogRecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogRecordError::Io { source, .. } => Some(source),
        }
    }
}

/// Path of the log for a (trace, experiment) run.
pub fn log_path(dir: &Path, trace: &str, experiment: &str, ext: &str) -> PathBuf {
    dir.join(format!("{trace}_{experiment}.{ext}"))
}

/// Load the log for a (trace, experiment) run.
///
/// A log that does not exist yields an empty record with `found == false`.
/// Any other read failure is an error.
pub fn extract(
    dir: &Path,
    trace: &str,
    experiment: &str,
    ext: &str,
) -> Result<LogRecord, LogRecordError> {
    let path = log_path(dir, trace, experiment, ext);
    tracing::debug!(path = %path.display(), "reading log");

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "log not found");
            return Ok(LogRecord::missing());
        }
        Err(source) => return Err(LogRecordError::Io { path, source }),
    };

    Ok(LogRecord {
        fields: parse_fields(&text, ext == STATS_EXT),
        found: true,
    })
}

/// Parse log text into fields. Later duplicates overwrite earlier ones.
pub fn parse_fields(text: &str, stats: bool) -> HashMap<String, String> {
    let mut fields = HashMap::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        let pair = if stats {
            line.split_once('=')
        } else if line.matches(' ').count() == 1 {
            line.split_once(' ')
        } else {
            None
        };
        if let Some((key, value)) = pair {
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_path_joins_trace_experiment_and_ext() {
        let path = log_path(Path::new("runs"), "mcf", "stride", "out");
        assert_eq!(path, PathBuf::from("runs/mcf_stride.out"));
    }

    #[test]
    fn out_log_requires_exactly_one_space() {
        let text = "\
ipc 1.25
cycles 1000,2000
this line has several spaces
nospace
  padded 7
";
        let fields = parse_fields(text, false);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["ipc"], "1.25");
        assert_eq!(fields["cycles"], "1000,2000");
        assert_eq!(fields["padded"], "7");
    }

    #[test]
    fn stats_log_splits_on_first_equals() {
        let text = "ipc = 1.25\ncycles=1000,2000\nnote = a=b\nno separator\n";
        let fields = parse_fields(text, true);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["ipc"], "1.25");
        assert_eq!(fields["note"], "a=b");
    }

    #[test]
    fn stats_and_out_formats_agree_on_equivalent_content() {
        let stats = parse_fields("ipc=1.25\ncycles=10,20\n", true);
        let out = parse_fields("ipc 1.25\ncycles 10,20\n", false);
        assert_eq!(stats, out);
    }

    #[test]
    fn missing_log_is_not_found() {
        let dir = TempDir::new().unwrap();
        let record = extract(dir.path(), "t", "e", "out").unwrap();
        assert!(!record.found);
        assert_eq!(record.get("ipc"), None);
    }

    #[test]
    fn extract_reads_existing_log() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("t_e.stats"), "ipc=2.0\n").unwrap();

        let record = extract(dir.path(), "t", "e", "stats").unwrap();
        assert!(record.found);
        assert_eq!(record.get("ipc"), Some("2.0"));

        // Same run, different extension: not found.
        let other = extract(dir.path(), "t", "e", "out").unwrap();
        assert!(!other.found);
    }

    #[test]
    fn unreadable_log_is_an_error() {
        let dir = TempDir::new().unwrap();
        // A directory in place of the log cannot be read as a file.
        std::fs::create_dir(dir.path().join("t_e.out")).unwrap();
        let err = extract(dir.path(), "t", "e", "out").unwrap_err();
        assert!(err.to_string().contains("t_e.out"));
    }
}
