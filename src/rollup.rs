//! Rollup of per-run logs into one CSV table.
//!
//! One row per (trace, experiment), trace-major. A row passes when its log
//! exists and holds every declared metric; any absent metric prints as `0`.

use crate::config::ConfigError;
use crate::experiment::Experiment;
use crate::log_record::{self, LogRecordError};
use crate::metric::MetricSpec;
use crate::parse::ParseError;
use crate::summary::{self, SummaryError, SummaryType};
use crate::trace::TraceRecord;
use std::io::Write;
use std::path::PathBuf;

/// Trailing column holding the pass flag.
pub const FILTER_COLUMN: &str = "Filter";

/// Fatal errors for a rollup run.
#[derive(Debug)]
pub enum RollupError {
    Config(ConfigError),
    Parse(ParseError),
    Summary(SummaryError),
    Log(LogRecordError),
    Output(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for RollupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollupError::Config(e) => write!(f, "{e}"),
            RollupError::Parse(e) => write!(f, "{e}"),
            RollupError::Summary(e) => write!(f, "{e}"),
            RollupError::Log(e) => write!(f, "{e}"),
            RollupError::Output(e) => write!(f, "failed to write report: {e}"),
            RollupError::Json(e) => write!(f, "failed to serialize inputs: {e}"),
        }
    }
}

impl std::error::Error for RollupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RollupError::Config(e) => Some(e),
            RollupError::Parse(e) => Some(e),
            RollupError::Summary(e) => Some(e),
            RollupError::Log(e) => Some(e),
            RollupError::Output(e) => Some(e),
            RollupError::Json(e) => Some(e),
        }
    }
}

impl From<ConfigError> for RollupError {
    fn from(e: ConfigError) -> Self {
        RollupError::Config(e)
    }
}

impl From<ParseError> for RollupError {
    fn from(e: ParseError) -> Self {
        RollupError::Parse(e)
    }
}

impl From<SummaryError> for RollupError {
    fn from(e: SummaryError) -> Self {
        RollupError::Summary(e)
    }
}

impl From<LogRecordError> for RollupError {
    fn from(e: LogRecordError) -> Self {
        RollupError::Log(e)
    }
}

impl From<std::io::Error> for RollupError {
    fn from(e: std::io::Error) -> Self {
        RollupError::Output(e)
    }
}

impl From<serde_json::Error> for RollupError {
    fn from(e: serde_json::Error) -> Self {
        RollupError::Json(e)
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub trace: String,
    pub experiment: String,
    pub values: Vec<String>,
    pub passed: bool,
}

impl std::fmt::Display for ReportRow {
    // Values are written unquoted; `array` metrics may add columns.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.trace,
            self.experiment,
            self.values.join(","),
            u8::from(self.passed)
        )
    }
}

/// Parsed inputs plus where to find the logs.
#[derive(Debug)]
pub struct Rollup {
    pub traces: Vec<TraceRecord>,
    pub experiments: Vec<Experiment>,
    pub metrics: Vec<MetricSpec>,
    pub log_dir: PathBuf,
    pub ext: String,
}

impl Rollup {
    /// CSV header: `Trace,Exp,<metric names>,Filter`.
    pub fn header(&self) -> String {
        let mut columns = vec!["Trace", "Exp"];
        columns.extend(self.metrics.iter().map(|m| m.name.as_str()));
        columns.push(FILTER_COLUMN);
        columns.join(",")
    }

    /// Reject any metric whose summary type is unknown.
    pub fn validate_metrics(&self) -> Result<(), SummaryError> {
        for metric in &self.metrics {
            metric.kind.parse::<SummaryType>()?;
        }
        Ok(())
    }

    /// Build the row for one (trace, experiment) run.
    pub fn row(&self, trace: &str, experiment: &str) -> Result<ReportRow, RollupError> {
        let record = log_record::extract(&self.log_dir, trace, experiment, &self.ext)?;
        let mut passed = record.found;
        let mut values = Vec::with_capacity(self.metrics.len());

        for metric in &self.metrics {
            match record.get(&metric.name) {
                Some(raw) => {
                    let rendered = summary::summarize_declared(raw, &metric.kind)?;
                    values.push(rendered.to_string());
                }
                None => {
                    if record.found {
                        tracing::debug!(
                            trace,
                            experiment,
                            metric = %metric.name,
                            "metric missing from log"
                        );
                    }
                    values.push("0".to_string());
                    passed = false;
                }
            }
        }

        Ok(ReportRow {
            trace: trace.to_string(),
            experiment: experiment.to_string(),
            values,
            passed,
        })
    }

    /// Write the header and every row to `out`.
    ///
    /// Rows for one trace are computed before any of them is written, so a
    /// fatal error leaves only whole traces in the output.
    pub fn write_csv<W: Write>(&self, out: &mut W) -> Result<(), RollupError> {
        writeln!(out, "{}", self.header())?;

        let mut failed = 0usize;
        for trace in &self.traces {
            let rows = self
                .experiments
                .iter()
                .map(|exp| self.row(trace.name(), &exp.name))
                .collect::<Result<Vec<_>, _>>()?;
            for row in &rows {
                if !row.passed {
                    failed += 1;
                }
                writeln!(out, "{row}")?;
            }
        }
        out.flush()?;

        let total = self.traces.len() * self.experiments.len();
        tracing::info!(rows = total, failed, "rollup complete");
        Ok(())
    }
}
