//! Metric file parsing: one `MetricName: Type` declaration per line.

use crate::parse::{self, ParseError};
use serde::Serialize;
use std::path::Path;

/// A metric to extract from each log, and how to summarize it.
///
/// `kind` is kept as written; it is validated when a value is summarized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Parse a metric file.
pub fn parse_file(path: &Path) -> Result<Vec<MetricSpec>, ParseError> {
    let text = parse::read_input(path)?;
    Ok(parse(&text))
}

/// Parse metric file text. Lines without a `:` are skipped.
pub fn parse(text: &str) -> Vec<MetricSpec> {
    parse::content_lines(text)
        .filter_map(|line| line.split_once(':'))
        .map(|(name, kind)| MetricSpec {
            name: name.trim().to_string(),
            kind: kind.trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declarations_in_order() {
        let text = "\
# metrics
cpu.ipc: mean

L2.miss_rate : nzmean
core.cycles:sum
";
        let metrics = parse(text);
        let pairs: Vec<(&str, &str)> = metrics
            .iter()
            .map(|m| (m.name.as_str(), m.kind.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("cpu.ipc", "mean"),
                ("L2.miss_rate", "nzmean"),
                ("core.cycles", "sum"),
            ]
        );
    }

    #[test]
    fn splits_on_first_colon_only() {
        let metrics = parse("a:b: max\n");
        assert_eq!(metrics[0].name, "a");
        assert_eq!(metrics[0].kind, "b: max");
    }

    #[test]
    fn unknown_types_pass_through() {
        let metrics = parse("x: median\n");
        assert_eq!(metrics[0].kind, "median");
    }

    #[test]
    fn lines_without_colon_are_skipped() {
        let metrics = parse("no colon here\nok: sum\n");
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].name, "ok");
    }

    #[test]
    fn duplicate_names_are_kept() {
        let metrics = parse("x: min\nx: max\n");
        assert_eq!(metrics.len(), 2);
    }
}
