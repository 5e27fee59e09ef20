//! Reading `config.toml` and seeding it on first run.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use bookswap_common::ConfigError;
use tracing::{info, warn};

use super::template::default_config_toml;
use crate::schema::BookswapConfig;
use crate::validation;

/// Directory under the platform config dir that holds our file.
const APP_DIR: &str = "bookswap";
const FILE_NAME: &str = "config.toml";

fn io_error(action: &str, path: &Path, e: std::io::Error) -> ConfigError {
    ConfigError::ParseError(format!("failed to {action} {}: {e}", path.display()))
}

/// `<config dir>/bookswap/config.toml`, e.g. `~/.config/bookswap/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Write the commented template to `path`, creating parent directories.
/// An existing file is left untouched and reported as an error.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_error("create", dir, e))?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| io_error("create", path, e))?;
    file.write_all(default_config_toml().as_bytes())
        .map_err(|e| io_error("write", path, e))?;

    info!("created default config at {}", path.display());
    Ok(())
}

/// Parse the TOML file at `path`.
///
/// Missing fields take serde defaults. Validation failures are logged and
/// the parsed config is returned as-is; consumers re-check the sections they
/// depend on.
pub fn load_from_path(path: &Path) -> Result<BookswapConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(io_error("read", path, e)),
    };

    let config: BookswapConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load [`default_config_path`], seeding it with the template when absent.
pub fn load_default() -> Result<BookswapConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            Ok(BookswapConfig::default())
        }
        other => other,
    }
}
