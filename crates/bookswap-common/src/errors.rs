use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// A text frame that could not be turned into an inbound chat event.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid json: {0}")]
    InvalidJson(String),

    #[error("frame is not a json object")]
    NotAnObject,

    #[error("missing event type")]
    MissingType,

    #[error("invalid payload for {event}: {reason}")]
    InvalidPayload { event: String, reason: String },

    #[error("binary frames are not supported")]
    BinaryFrame,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid chat config: {0}")]
    InvalidConfig(String),

    #[error("chat hub is not running")]
    HubClosed,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    InvalidUrl(String),

    #[error("invalid client config: {0}")]
    InvalidConfig(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connection timed out after {0}s")]
    Timeout(u64),

    #[error("handler failed: {0}")]
    Handler(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BookswapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
