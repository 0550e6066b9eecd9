use std::path::{Path, PathBuf};

use cart_types::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

/// Errors from loading a [`StoreConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for a [`DocumentStore`](crate::DocumentStore).
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Project name used after a reset.
    pub default_project_name: String,
    /// Extension appended to suggested file names, without the dot.
    pub file_extension: String,
    /// Attachment depth scanned for model ids.
    pub max_tree_depth: usize,
    /// Buffered events per subscriber before slow receivers lag.
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_project_name: "Untitled".into(),
            file_extension: "tcproj".into(),
            max_tree_depth: DEFAULT_MAX_DEPTH,
            event_capacity: 64,
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be at least 1".into()));
        }
        if self.file_extension.is_empty() || self.file_extension.contains(['.', '/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "file_extension {:?} must be a bare extension",
                self.file_extension
            )));
        }
        Ok(())
    }

    /// File name offered to the save-location picker for `project_name`.
    pub fn suggested_file_name(&self, project_name: &str) -> String {
        let stem: String = project_name
            .trim()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        let stem = if stem.is_empty() {
            self.default_project_name.as_str()
        } else {
            stem.as_str()
        };
        format!("{stem}.{}", self.file_extension)
    }
}
