use serde::{Deserialize, Serialize};

/// Settings for the chat client session manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket URL of the chat server.
    pub url: String,
    /// Fixed wait before each reconnection attempt, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Handshake timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:5000/chat".into(),
            reconnect_delay_ms: 5000,
            connect_timeout_secs: 15,
        }
    }
}
