//! Environment variable overrides applied on top of the TOML file.
//!
//! `PORT` replaces `server.port`; `FRONTEND_URL` is appended to
//! `server.allowed_origins` when not already present.

use tracing::warn;

use crate::schema::BookswapConfig;

pub const PORT_VAR: &str = "PORT";
pub const FRONTEND_URL_VAR: &str = "FRONTEND_URL";

/// Apply overrides from the process environment.
pub fn apply_overrides(config: &mut BookswapConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides using `lookup` to read variables.
pub fn apply_overrides_from<F>(config: &mut BookswapConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(PORT_VAR) {
        match raw.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %raw, error = %e, "ignoring invalid {PORT_VAR}"),
        }
    }

    if let Some(origin) = lookup(FRONTEND_URL_VAR) {
        let origin = origin.trim().to_string();
        if !origin.is_empty() && !config.server.allowed_origins.contains(&origin) {
            config.server.allowed_origins.push(origin);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn port_override() {
        let mut config = BookswapConfig::default();
        apply_overrides_from(&mut config, lookup(&[("PORT", "8080")]));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn invalid_port_is_ignored() {
        let mut config = BookswapConfig::default();
        apply_overrides_from(&mut config, lookup(&[("PORT", "eighty")]));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn frontend_url_appended_once() {
        let mut config = BookswapConfig::default();
        let before = config.server.allowed_origins.len();
        apply_overrides_from(
            &mut config,
            lookup(&[("FRONTEND_URL", "https://shop.example.com")]),
        );
        assert_eq!(config.server.allowed_origins.len(), before + 1);

        apply_overrides_from(
            &mut config,
            lookup(&[("FRONTEND_URL", "https://shop.example.com")]),
        );
        assert_eq!(config.server.allowed_origins.len(), before + 1);
    }

    #[test]
    fn no_vars_no_change() {
        let mut config = BookswapConfig::default();
        apply_overrides_from(&mut config, lookup(&[]));
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.allowed_origins.len(), 3);
    }
}
