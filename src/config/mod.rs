use anyhow::{Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::info;

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub placeholder: PlaceholderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    /// Custom logo composited into placeholders. Falls back to the packaged
    /// default logo when unset or unreadable.
    #[serde(default)]
    pub logo_path: Option<PathBuf>,
    /// Wrapper template override. Falls back to the packaged template when
    /// unset or unreadable.
    #[serde(default)]
    pub template_path: Option<PathBuf>,
    /// Number of rendered sizes kept in memory
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// Placeholder defaults
fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            logo_path: None,
            template_path: None,
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl PlaceholderConfig {
    /// Cache capacity as a non-zero value
    pub fn cache_capacity(&self) -> Result<NonZeroUsize> {
        match NonZeroUsize::new(self.cache_capacity) {
            Some(capacity) => Ok(capacity),
            None => bail!("placeholder.cache_capacity must be at least 1"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from_file(&config_file)
    }

    /// Layer defaults, the TOML file (if present) and `PLACEHOLDER_SVG_*`
    /// environment variables, e.g. `PLACEHOLDER_SVG_PLACEHOLDER__LOGO_PATH`
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(config_file).exists() {
            info!("Loading configuration from {}", config_file);
        } else {
            info!("Config file {} not found, using defaults", config_file);
        }

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.placeholder.cache_capacity()?;
        if self.web.host.trim().is_empty() {
            bail!("web.host must not be empty");
        }
        Ok(())
    }
}
