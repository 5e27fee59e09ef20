//! Settings and status types for the chat client.

use std::fmt;
use std::time::Duration;

use bookswap_common::ClientError;
use bookswap_config::validation::validate_client;
use bookswap_config::ClientConfig;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Connection state as seen by consumers of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Runtime settings for one [`ChatClient`](crate::ChatClient).
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// WebSocket URL of the chat endpoint.
    pub url: String,
    /// Fixed wait between a close (or failed attempt) and the next attempt.
    pub reconnect_delay: Duration,
    /// Upper bound on a single handshake.
    pub connect_timeout: Duration,
}

impl ClientSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self::from(&ClientConfig {
            url: url.into(),
            ..ClientConfig::default()
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Reject anything that is not a `ws://` or `wss://` URL.
    pub fn check_url(&self) -> Result<(), ClientError> {
        let rest = self
            .url
            .strip_prefix("ws://")
            .or_else(|| self.url.strip_prefix("wss://"))
            .ok_or_else(|| ClientError::InvalidUrl(self.url.clone()))?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(ClientError::InvalidUrl(self.url.clone()));
        }
        Ok(())
    }
}

impl ClientSettings {
    /// Check the URL and the timing ranges accepted in `[client]`.
    pub fn validate(&self) -> Result<(), ClientError> {
        self.check_url()?;
        validate_client(&self.to_config())
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))
    }

    fn to_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.url.clone(),
            reconnect_delay_ms: u64::try_from(self.reconnect_delay.as_millis())
                .unwrap_or(u64::MAX),
            connect_timeout_secs: self.connect_timeout.as_secs(),
        }
    }
}

impl From<&ClientConfig> for ClientSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            url: config.url.clone(),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

/// Requests from the public handle to the connection task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClientCommand {
    /// Connect now if idle; cancels a pending reconnect wait.
    Connect,
    Shutdown,
}
