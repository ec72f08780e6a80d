//! Experiment file parsing.
//!
//! Two kinds of lines:
//! - `VAR = value ...` defines a substitution variable for the lines below it.
//! - `name token token ...` defines an experiment. Tokens starting with `$`
//!   (`$VAR` or `$(VAR)`) are replaced by the variable's value.

use crate::parse::{self, ParseError};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// A named experiment and its fully substituted knob string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Experiment {
    pub name: String,
    pub knobs: String,
}

/// Parse an experiment file.
pub fn parse_file(path: &Path) -> Result<Vec<Experiment>, ParseError> {
    let text = parse::read_input(path)?;
    parse(&text)
}

/// Parse experiment file text.
///
/// Variables are scoped to this call and only visible to lines after their
/// definition. A later definition of the same name replaces the earlier one.
pub fn parse(text: &str) -> Result<Vec<Experiment>, ParseError> {
    let mut experiments = Vec::new();
    let mut vars: HashMap<String, String> = HashMap::new();

    for line in parse::content_lines(text) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            continue;
        }

        if tokens[1] == "=" {
            vars.insert(tokens[0].to_string(), tokens[2..].join(" "));
            continue;
        }

        let name = tokens[0];
        let knobs = tokens[1..]
            .iter()
            .map(|token| substitute(token, name, &vars))
            .collect::<Result<Vec<&str>, ParseError>>()?
            .join(" ");

        experiments.push(Experiment {
            name: name.to_string(),
            knobs,
        });
    }

    Ok(experiments)
}

fn substitute<'a>(
    token: &'a str,
    experiment: &str,
    vars: &'a HashMap<String, String>,
) -> Result<&'a str, ParseError> {
    if !token.starts_with('$') {
        return Ok(token);
    }
    let key: String = token
        .chars()
        .filter(|c| !matches!(c, '$' | '(' | ')'))
        .collect();
    match vars.get(&key) {
        Some(value) => Ok(value),
        None => Err(ParseError::UndefinedVariable {
            key,
            experiment: experiment.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn substitutes_both_variable_forms() {
        let text = "\
BASE = --warmup=100 --sim=500
PF = --prefetcher=stride
nopref $BASE
stride $(BASE) $PF --extra
";
        let exps = parse(text).unwrap();
        assert_eq!(
            exps,
            vec![
                Experiment {
                    name: "nopref".to_string(),
                    knobs: "--warmup=100 --sim=500".to_string(),
                },
                Experiment {
                    name: "stride".to_string(),
                    knobs: "--warmup=100 --sim=500 --prefetcher=stride --extra".to_string(),
                },
            ]
        );
    }

    #[test]
    fn undefined_variable_names_key_and_experiment() {
        let err = parse("base $MISSING\n").unwrap_err();
        match err {
            ParseError::UndefinedVariable { key, experiment } => {
                assert_eq!(key, "MISSING");
                assert_eq!(experiment, "base");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn variable_defined_after_experiment_is_not_visible() {
        let text = "early $(LATE)\nLATE = 1\n";
        let err = parse(text).unwrap_err();
        assert_eq!(err.to_string(), "LATE is not defined before exp early");
    }

    #[test]
    fn variable_is_visible_to_all_later_lines() {
        let text = "V = x\na $V\nb $V\n";
        let exps = parse(text).unwrap();
        assert_eq!(exps[0].knobs, "x");
        assert_eq!(exps[1].knobs, "x");
    }

    #[test]
    fn later_definition_wins() {
        let text = "V = one\na $V\nV = two\nb $V\n";
        let exps = parse(text).unwrap();
        assert_eq!(exps[0].knobs, "one");
        assert_eq!(exps[1].knobs, "two");
    }

    #[test]
    fn comments_blanks_and_single_tokens_are_skipped() {
        let text = "# header\n\nlonely\n   # V = 1\nreal --k\n";
        let exps = parse(text).unwrap();
        assert_eq!(exps.len(), 1);
        assert_eq!(exps[0].name, "real");
        assert_eq!(exps[0].knobs, "--k");
    }

    #[test]
    fn commented_definition_does_not_define() {
        let err = parse("# V = 1\na $V\n").unwrap_err();
        assert!(matches!(err, ParseError::UndefinedVariable { .. }));
    }

    #[test]
    fn empty_definition_substitutes_empty_string() {
        let exps = parse("EMPTY =\na --x $EMPTY --y\n").unwrap();
        assert_eq!(exps[0].knobs, "--x  --y");
    }

    #[test]
    fn definition_collapses_inner_whitespace() {
        let exps = parse("V = a    b\tc\nexp $V\n").unwrap();
        assert_eq!(exps[0].knobs, "a b c");
    }

    #[test]
    fn parse_file_keeps_file_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exps.exp");
        std::fs::write(&path, "z --a\na --b\nm --c\n").unwrap();
        let names: Vec<String> = parse_file(&path)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }
}
