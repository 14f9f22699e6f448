/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

// Placeholder defaults
pub const DEFAULT_CACHE_CAPACITY: usize = crate::svg::cache::DEFAULT_CACHE_CAPACITY;

// Config loading
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "PLACEHOLDER_SVG_";
