//! Per-section validators.

use crate::schema::{ChatConfig, ClientConfig, ServerConfig};

use super::helpers::validate_range;

pub(crate) fn validate_server(errors: &mut Vec<String>, server: &ServerConfig) {
    if server.host.trim().is_empty() {
        errors.push("server.host must not be empty".into());
    }
    for origin in &server.allowed_origins {
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            errors.push(format!(
                "server.allowed_origins entry '{origin}' must start with http:// or https://"
            ));
        }
    }
}

pub(crate) fn validate_chat(errors: &mut Vec<String>, chat: &ChatConfig) {
    if !chat.path.starts_with('/') {
        errors.push(format!("chat.path '{}' must start with '/'", chat.path));
    }
    validate_range(errors, "chat.history_capacity", chat.history_capacity, 1, 10_000);
    validate_range(
        errors,
        "chat.history_snapshot",
        chat.history_snapshot,
        1,
        chat.history_capacity.max(1),
    );
    validate_range(errors, "chat.outbound_buffer", chat.outbound_buffer, 8, 65_536);
}

pub(crate) fn validate_client(errors: &mut Vec<String>, client: &ClientConfig) {
    if !(client.url.starts_with("ws://") || client.url.starts_with("wss://")) {
        errors.push(format!(
            "client.url '{}' must start with ws:// or wss://",
            client.url
        ));
    }
    validate_range(
        errors,
        "client.reconnect_delay_ms",
        client.reconnect_delay_ms,
        100,
        600_000,
    );
    validate_range(
        errors,
        "client.connect_timeout_secs",
        client.connect_timeout_secs,
        1,
        120,
    );
}
