//! Trace list parsing.
//!
//! A trace list is a sequence of `KEY = VALUE` lines. Every `NAME` key opens a
//! new record; the lines that follow accumulate into it until the next `NAME`.

use crate::parse::{self, ParseError};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Key that starts a new trace record.
pub const NAME_KEY: &str = "NAME";

/// One trace from the trace list: every key/value pair seen for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TraceRecord {
    fields: HashMap<String, String>,
}

impl TraceRecord {
    /// The trace name, or an empty string for a record that never saw `NAME`.
    pub fn name(&self) -> &str {
        self.get(NAME_KEY).unwrap_or("")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn insert(&mut self, key: String, value: String) {
        self.fields.insert(key, value);
    }
}

/// Parse a trace list file.
pub fn parse_file(path: &Path) -> Result<Vec<TraceRecord>, ParseError> {
    let text = parse::read_input(path)?;
    Ok(parse(&text))
}

/// Parse trace list text. Lines without `=` are skipped silently.
pub fn parse(text: &str) -> Vec<TraceRecord> {
    let mut traces = Vec::new();
    let mut current: Option<TraceRecord> = None;

    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        if key == NAME_KEY {
            if let Some(done) = current.take() {
                traces.push(done);
            }
        }
        // Lines ahead of the first NAME still land in a record.
        current
            .get_or_insert_with(TraceRecord::default)
            .insert(key.to_string(), value.to_string());
    }

    if let Some(last) = current {
        if !last.is_empty() {
            traces.push(last);
        }
    }

    traces
}
