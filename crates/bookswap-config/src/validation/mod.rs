//! Full configuration validation.
//!
//! Each section has its own validator; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod helpers;
mod sections;


use crate::schema::{BookswapConfig, ChatConfig, ClientConfig};
use bookswap_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BookswapConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_server(&mut errors, &config.server);
    sections::validate_chat(&mut errors, &config.chat);
    sections::validate_client(&mut errors, &config.client);

    into_result(errors)
}

/// Validate only the chat section.
pub fn validate_chat(chat: &ChatConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();
    sections::validate_chat(&mut errors, chat);
    into_result(errors)
}

/// Validate only the client section.
pub fn validate_client(client: &ClientConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();
    sections::validate_client(&mut errors, client);
    into_result(errors)
}

fn into_result(errors: Vec<String>) -> Result<(), ConfigError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
