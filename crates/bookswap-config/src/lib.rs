//! Bookswap chat configuration.
//!
//! TOML-based configuration shared by the server and the terminal client.
//! Every section uses serde defaults so partial files work out of the box.

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{BookswapConfig, ChatConfig, ClientConfig, ServerConfig};

use bookswap_common::ConfigError;
use std::path::Path;

/// Load config from `path` when given, otherwise from the platform default
/// location, then apply environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<BookswapConfig, ConfigError> {
    let mut config = match path {
        Some(p) => toml_loader::load_from_path(p)?,
        None => toml_loader::load_default()?,
    };
    env::apply_overrides(&mut config);
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &BookswapConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
