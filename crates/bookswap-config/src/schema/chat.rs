use serde::{Deserialize, Serialize};

/// Chat broadcaster settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Mount the chat route at all.
    pub enabled: bool,
    /// Upgrade path for WebSocket connections.
    pub path: String,
    /// Maximum messages retained in history.
    pub history_capacity: usize,
    /// Messages replayed to a newly connected session.
    pub history_snapshot: usize,
    /// Per-session outbound queue length; deliveries beyond it are dropped.
    pub outbound_buffer: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/chat".into(),
            history_capacity: 100,
            history_snapshot: 50,
            outbound_buffer: 256,
        }
    }
}
