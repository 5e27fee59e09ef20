//! Wire protocol for the community chat.
//!
//! Clients send `{ "type": ..., "data": {...} }` envelopes; the server answers
//! with flat objects tagged by `"type"`. All frames are UTF-8 JSON text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::author_color;
use crate::errors::ProtocolError;
use crate::id::{new_message_id, now_timestamp, SessionId};

/// Greeting carried by `WELCOME`.
pub const WELCOME_GREETING: &str = "Connected to book community chat!";

/// Reason carried by `ERROR` when a frame cannot be parsed.
pub const INVALID_FORMAT_REASON: &str = "Invalid message format";

/// Event type names used on the wire.
pub mod events {
    pub const JOIN_CHAT: &str = "JOIN_CHAT";
    pub const SEND_MESSAGE: &str = "SEND_MESSAGE";
}

// ---------------------------------------------------------------------------
// Chat message
// ---------------------------------------------------------------------------

/// One user-authored message as stored in history and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "type", default = "chat_kind")]
    pub kind: String,
    #[serde(rename = "userId")]
    pub session_id: SessionId,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub text: String,
    pub timestamp: String,
    #[serde(rename = "userColor")]
    pub user_color: String,
}

fn chat_kind() -> String {
    "chat".to_string()
}

impl ChatMessage {
    /// Stamp a new message from `session` with the current time.
    pub fn new(session: &SessionId, user_name: String, text: String) -> Self {
        Self {
            id: new_message_id(session),
            kind: chat_kind(),
            session_id: session.clone(),
            user_name,
            text,
            timestamp: now_timestamp(),
            user_color: author_color(session).to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub user_name: String,
    pub text: String,
}

/// Events a client publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientEvent {
    JoinChat(JoinPayload),
    SendMessage(MessagePayload),
}

impl ClientEvent {
    pub fn join(user_name: impl Into<String>) -> Self {
        Self::JoinChat(JoinPayload {
            user_name: user_name.into(),
        })
    }

    pub fn message(user_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::SendMessage(MessagePayload {
            user_name: user_name.into(),
            text: text.into(),
        })
    }

    /// Wire name of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinChat(_) => events::JOIN_CHAT,
            Self::SendMessage(_) => events::SEND_MESSAGE,
        }
    }
}

/// A parsed inbound frame as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    JoinChat(JoinPayload),
    SendMessage(MessagePayload),
    /// Well-formed envelope with a type this server does not handle.
    Unknown { kind: String },
}

impl InboundEvent {
    /// Parse one text frame.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(frame).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        let envelope = value.as_object().ok_or(ProtocolError::NotAnObject)?;
        let kind = envelope
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingType)?;
        let data = envelope.get("data").cloned().unwrap_or(Value::Null);

        match kind {
            events::JOIN_CHAT => payload(kind, data).map(Self::JoinChat),
            events::SEND_MESSAGE => payload(kind, data).map(Self::SendMessage),
            other => Ok(Self::Unknown {
                kind: other.to_string(),
            }),
        }
    }
}

impl From<ClientEvent> for InboundEvent {
    fn from(event: ClientEvent) -> Self {
        match event {
            ClientEvent::JoinChat(p) => Self::JoinChat(p),
            ClientEvent::SendMessage(p) => Self::SendMessage(p),
        }
    }
}

fn payload<T: serde::de::DeserializeOwned>(kind: &str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|e| ProtocolError::InvalidPayload {
        event: kind.to_string(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Events the chat server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    Welcome {
        #[serde(rename = "userId")]
        session_id: SessionId,
        #[serde(rename = "message")]
        greeting: String,
        #[serde(rename = "messageCount")]
        history_count: usize,
    },
    MessageHistory {
        messages: Vec<ChatMessage>,
    },
    NewMessage {
        message: ChatMessage,
    },
    UserJoined {
        #[serde(rename = "userId")]
        session_id: SessionId,
        #[serde(rename = "userName")]
        user_name: String,
        timestamp: String,
    },
    UserLeft {
        #[serde(rename = "userId")]
        session_id: SessionId,
        timestamp: String,
    },
    Error {
        #[serde(rename = "message")]
        reason: String,
    },
}

impl ServerEvent {
    pub fn welcome(session_id: SessionId, history_count: usize) -> Self {
        Self::Welcome {
            session_id,
            greeting: WELCOME_GREETING.to_string(),
            history_count,
        }
    }

    pub fn user_joined(session_id: SessionId, user_name: String) -> Self {
        Self::UserJoined {
            session_id,
            user_name,
            timestamp: now_timestamp(),
        }
    }

    pub fn user_left(session_id: SessionId) -> Self {
        Self::UserLeft {
            session_id,
            timestamp: now_timestamp(),
        }
    }

    pub fn invalid_format() -> Self {
        Self::Error {
            reason: INVALID_FORMAT_REASON.to_string(),
        }
    }

    /// Wire name of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "WELCOME",
            Self::MessageHistory { .. } => "MESSAGE_HISTORY",
            Self::NewMessage { .. } => "NEW_MESSAGE",
            Self::UserJoined { .. } => "USER_JOINED",
            Self::UserLeft { .. } => "USER_LEFT",
            Self::Error { .. } => "ERROR",
        }
    }
}
