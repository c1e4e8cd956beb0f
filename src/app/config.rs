use crate::domain::types::DEFAULT_MODEL;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `base_url`, same name the official SDK reads.
pub const BASE_URL_ENV: &str = "DASHSCOPE_HTTP_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub default_model: String,
}

fn default_base_url() -> String {
    "https://dashscope.aliyuncs.com/api/v1".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
        }
    }
}

impl Config {
    /// Validates config values after loading. Normalizes recoverable values
    /// and rejects a base URL the HTTP client could never use.
    pub fn validate(&mut self) -> Result<()> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            bail!("Invalid base_url (expected http:// or https://): {}", self.base_url);
        }
        self.base_url = trimmed.to_string();

        if self.default_model.trim().is_empty() {
            self.default_model = default_model();
        }

        Ok(())
    }

    /// Apply environment overrides on top of file values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_base_url_override(std::env::var(BASE_URL_ENV).ok())
    }

    /// Replace `base_url` with a non-blank override and re-validate.
    pub fn apply_base_url_override(&mut self, base_url: Option<String>) -> Result<()> {
        match base_url {
            Some(base_url) if !base_url.trim().is_empty() => {
                self.base_url = base_url;
                self.validate()
                    .with_context(|| format!("Invalid {}", BASE_URL_ENV))
            }
            _ => Ok(()),
        }
    }

    /// Model from the command line, falling back to the configured default.
    ///
    /// A model given on the command line is forwarded as is, even when empty;
    /// the API reports what it rejects.
    pub fn resolve_model<'a>(&'a self, cli_model: Option<&'a str>) -> &'a str {
        cli_model.unwrap_or(&self.default_model)
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dashscope-transcribe")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load the default config file, or defaults when it does not exist.
pub fn load_config() -> Result<Config> {
    let path = config_path();

    if !path.exists() {
        return Ok(Config::default());
    }

    load_config_from(&path)
}

/// Load and validate a config file at an explicit path.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    config.validate()?;
    Ok(config)
}
