use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use std::fs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_url() -> String { common::DEFAULT_API_URL.to_string() }
fn default_request_timeout() -> u64 { 10 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub output: Option<PathBuf>,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        // An empty document is not a mapping; treat it as all defaults.
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Detect file type by extension and load
    pub fn from_file(path: &Path) -> Result<Self> {
        let ext = path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "toml" => Self::from_toml_file(path),
            _ => Err(anyhow::anyhow!("Unsupported config file format. Use .yaml, .yml, or .toml")),
        }
    }

    /// Resolves the effective configuration: the explicit file if given,
    /// otherwise the default file when it exists, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();
        match explicit {
            Some(path) => config.merge(Self::from_file(path)?),
            None => {
                let path = expand_home(common::DEFAULT_CONFIG_PATH);
                if path.exists() {
                    config.merge(Self::from_file(&path)?);
                }
            }
        }
        Ok(config)
    }

    /// Merge with another config, preferring values from other
    pub fn merge(&mut self, other: Config) {
        self.server.url = other.server.url;
        self.server.request_timeout_secs = other.server.request_timeout_secs;

        self.logging.level = other.logging.level;
        if other.logging.output.is_some() {
            self.logging.output = other.logging.output;
        }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.server.url = url;
        }
        self
    }
}

/// Expands a leading `~/` using `$HOME`; other paths are returned as is.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
