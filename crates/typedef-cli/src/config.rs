use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use typedef_core::ValidatorConfig;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "typedef.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub validator: ValidatorConfig,
}

impl Settings {
    /// Resolve validator limits, letting command-line flags win over the file.
    pub fn validator_config(
        &self,
        max_depth: Option<usize>,
        max_errors: Option<usize>,
    ) -> ValidatorConfig {
        ValidatorConfig {
            max_depth: max_depth.unwrap_or(self.validator.max_depth),
            max_errors: max_errors.unwrap_or(self.validator.max_errors),
        }
    }
}

/// Load settings from `path`, or from `typedef.toml` in `dir` when no path
/// is given. A missing default file yields default settings.
pub fn load_settings(path: Option<&Path>, dir: &Path) -> Result<Settings, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = dir.join(DEFAULT_CONFIG_FILE);
            if !candidate.exists() {
                return Ok(Settings::default());
            }
            candidate
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let settings = toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(event = "config_loaded", path = %path.display());
    Ok(settings)
}
