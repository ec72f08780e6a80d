use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from rollup.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RollupConfig {
    pub rollup: RollupSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RollupSection {
    /// Log file extension; `stats` switches to `key=value` parsing.
    pub ext: String,
    /// Directory holding the `{trace}_{experiment}.{ext}` logs.
    pub log_dir: PathBuf,
    /// Environment variable that must be set before a run.
    pub home_env: String,
}

impl Default for RollupSection {
    fn default() -> Self {
        Self {
            ext: "out".to_string(),
            log_dir: PathBuf::from("."),
            home_env: "PYTHIA_HOME".to_string(),
        }
    }
}

/// Errors from loading configuration or checking the environment.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    MissingEnv { name: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
            ConfigError::MissingEnv { name } => {
                write!(
                    f,
                    "{name} env variable is not defined.\nHave you sourced setvars.sh?"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::MissingEnv { .. } => None,
        }
    }
}

impl RollupConfig {
    /// Load config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Require the deployment's home variable to be present. Its value is not used.
pub fn check_home_env(name: &str) -> Result<(), ConfigError> {
    check_env_present(name, std::env::var_os(name).is_some())
}

fn check_env_present(name: &str, present: bool) -> Result<(), ConfigError> {
    if present {
        Ok(())
    } else {
        Err(ConfigError::MissingEnv {
            name: name.to_string(),
        })
    }
}
