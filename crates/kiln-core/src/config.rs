//! Tool configuration.
//!
//! Settings come from an optional `kiln.toml` and are then overridden by
//! environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `KILN_CONFIG` | path of the config file (default `./kiln.toml`) |
//! | `KILN_COMPILER` | `compiler` |
//! | `KILN_TRUNK_DIR` | `trunk_dir` |
//! | `KILN_PACKAGES_DIR` | `packages_dir` |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "kiln.toml";

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but cannot be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`Config`].
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// C++ compiler whose version drives flag selection.
    pub compiler: String,
    /// Directory third-party archives are downloaded and unpacked into.
    pub trunk_dir: PathBuf,
    /// Extra directory of `*.toml` package descriptors.
    pub packages_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compiler: "g++".to_string(),
            trunk_dir: PathBuf::from("thirdparty"),
            packages_dir: None,
        }
    }
}

impl Config {
    /// Parse configuration from TOML text. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is invalid.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load `path`, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Self::parse(&content, path)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load the config file named by `KILN_CONFIG` (or `./kiln.toml`) and
    /// apply environment overrides.
    ///
    /// # Errors
    ///
    /// See [`Config::load_file`].
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("KILN_CONFIG")
            .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
        let mut config = Self::load_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `KILN_*` overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(compiler) = non_empty("KILN_COMPILER") {
            self.compiler = compiler;
        }
        if let Some(trunk) = non_empty("KILN_TRUNK_DIR") {
            self.trunk_dir = PathBuf::from(trunk);
        }
        if let Some(dir) = non_empty("KILN_PACKAGES_DIR") {
            self.packages_dir = Some(PathBuf::from(dir));
        }
    }
}
