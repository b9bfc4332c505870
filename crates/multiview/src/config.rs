//! Runtime configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default script asking content for its display index
pub const DEFAULT_DISPLAY_QUERY: &str =
    "window.multiview && window.multiview.displayIndex ? String(window.multiview.displayIndex()) : null";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Script evaluated in each surface to ask for its display index
    pub display_query: String,

    /// URL loaded into the root surface
    pub root_url: String,

    /// Permission policy for content requests
    pub permissions: PermissionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_query: DEFAULT_DISPLAY_QUERY.to_string(),
            root_url: "about:blank".to_string(),
            permissions: PermissionConfig::default(),
        }
    }
}

/// Which content permission requests are granted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionConfig {
    /// Granted resource names
    /// Supports prefix matching with "*" (e.g., "video.*"); "*" alone grants everything
    pub allowed: Vec<String>,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            allowed: vec!["*".to_string()],
        }
    }
}

impl PermissionConfig {
    /// Check if a resource matches the allowed patterns
    pub fn is_allowed(&self, resource: &str) -> bool {
        self.allowed.iter().any(|pattern| {
            if let Some(prefix) = pattern.strip_suffix('*') {
                resource.starts_with(prefix)
            } else {
                resource == pattern
            }
        })
    }

    /// Subset of `requested` that is granted
    pub fn grant(&self, requested: &[String]) -> Vec<String> {
        requested
            .iter()
            .filter(|r| self.is_allowed(r))
            .cloned()
            .collect()
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("multiview/config.toml")),
            Some(PathBuf::from("/etc/multiview/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if path.exists() {
                match Self::load_from(&path) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(?path, error = %e, "ignoring config file");
                    }
                }
            }
        }

        tracing::info!("using default configuration");
        Self::default()
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::info!(?path, root_url = %config.root_url, "loaded configuration");
        Ok(config)
    }

    /// Reject values the router cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display_query.trim().is_empty() {
            return Err(ConfigError::Invalid("display_query must not be empty".into()));
        }
        if self.root_url.trim().is_empty() {
            return Err(ConfigError::Invalid("root_url must not be empty".into()));
        }
        Ok(())
    }
}

/// Helper for getting XDG directories
mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }
}
