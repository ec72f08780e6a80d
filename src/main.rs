mod config;
mod experiment;
mod log_record;
mod metric;
mod parse;
mod rollup;
mod summary;
mod trace;

use clap::Parser;
use config::RollupConfig;
use rollup::{Rollup, RollupError};
use serde::Serialize;
use std::path::PathBuf;

/// Roll up per-run benchmark logs into a CSV summary table:
/// one row per (trace, experiment), one column per declared metric,
/// and a trailing pass flag.
#[derive(Parser, Debug)]
#[command(name = "rollup", version, about)]
pub struct Cli {
    /// Trace list file
    #[arg(long, value_name = "FILE")]
    tlist: PathBuf,

    /// Experiment file
    #[arg(long, value_name = "FILE")]
    exp: PathBuf,

    /// Metric file
    #[arg(long, value_name = "FILE")]
    mfile: PathBuf,

    /// Log file extension (default: from config, else "out")
    #[arg(long)]
    ext: Option<String>,

    /// Directory holding the run logs (default: from config, else ".")
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, default_value = "rollup.toml")]
    config: PathBuf,

    /// Parse the input files and print them as JSON, don't read any logs
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (log lookups, missing fields)
    #[arg(short, long)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Parsed inputs as printed by `--dry-run`.
#[derive(Serialize)]
struct DryRun<'a> {
    traces: &'a [trace::TraceRecord],
    experiments: &'a [experiment::Experiment],
    metrics: &'a [metric::MetricSpec],
    log_dir: &'a std::path::Path,
    ext: &'a str,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    // stdout carries the CSV, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    if let Err(e) = run(&cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), RollupError> {
    let cfg = RollupConfig::load(&cli.config)?;
    config::check_home_env(&cfg.rollup.home_env)?;

    let rollup = Rollup {
        traces: trace::parse_file(&cli.tlist)?,
        experiments: experiment::parse_file(&cli.exp)?,
        metrics: metric::parse_file(&cli.mfile)?,
        log_dir: cli.log_dir.clone().unwrap_or(cfg.rollup.log_dir),
        ext: cli.ext.clone().unwrap_or(cfg.rollup.ext),
    };
    tracing::debug!(
        traces = rollup.traces.len(),
        experiments = rollup.experiments.len(),
        metrics = rollup.metrics.len(),
        "inputs parsed"
    );

    if cli.dry_run {
        rollup.validate_metrics()?;
        let view = DryRun {
            traces: &rollup.traces,
            experiments: &rollup.experiments,
            metrics: &rollup.metrics,
            log_dir: &rollup.log_dir,
            ext: &rollup.ext,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    rollup.write_csv(&mut out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_requires_the_three_input_files() {
        assert!(Cli::try_parse_from(["rollup", "--tlist", "t", "--exp", "e"]).is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli =
            Cli::try_parse_from(["rollup", "--tlist", "t", "--exp", "e", "--mfile", "m"]).unwrap();
        assert_eq!(cli.tlist, PathBuf::from("t"));
        assert_eq!(cli.ext, None);
        assert_eq!(cli.log_dir, None);
        assert_eq!(cli.config, PathBuf::from("rollup.toml"));
        assert!(!cli.dry_run);
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::try_parse_from([
            "rollup", "--tlist", "t", "--exp", "e", "--mfile", "m", "--ext", "stats",
            "--log-dir", "runs", "-v",
        ])
        .unwrap();
        assert_eq!(cli.ext.as_deref(), Some("stats"));
        assert_eq!(cli.log_dir, Some(PathBuf::from("runs")));
        assert!(cli.verbose);
    }
}
