//! `inspecta.toml` configuration.
//!
//! Every key is optional; command-line flags override whatever the file sets.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File looked up in the current directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "inspecta.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub git: GitSettings,
    pub attribution: AttributionSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitSettings {
    pub executable: String,
    pub repository: String,
    pub trunk: String,
    /// Remote used to qualify refs for merge-base; empty for none.
    pub remote: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            executable: "git".to_string(),
            repository: ".".to_string(),
            trunk: "develop".to_string(),
            remote: "origin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttributionSettings {
    pub top: usize,
    pub path_prefix: String,
}

impl Default for AttributionSettings {
    fn default() -> Self {
        Self {
            top: 5,
            path_prefix: String::new(),
        }
    }
}

impl Config {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given (it must exist), otherwise
    /// [`DEFAULT_CONFIG_FILE`] when present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !p.exists() {
                    return Ok(Self::default());
                }
                p
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&text, &path)
    }
}
