//! Broadcast engine: applies inbound events to the registry and history and
//! decides who receives what.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use bookswap_common::{ChatMessage, InboundEvent, ProtocolError, ServerEvent, SessionId};

use crate::history::HistoryBuffer;
use crate::registry::Registry;

/// A raw frame received from a session's socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary,
}

/// Outbound side of one session: a bounded queue drained by its socket task.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<String>,
}

impl SessionHandle {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Enqueue a frame without waiting. Returns false if it was dropped.
    fn deliver(&self, id: &SessionId, frame: &str) -> bool {
        match self.tx.try_send(frame.to_string()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(session = %id, "Outbound queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(session = %id, "Outbound queue closed");
                false
            }
        }
    }
}

pub struct BroadcastEngine {
    registry: Registry<SessionHandle>,
    history: HistoryBuffer,
    snapshot: usize,
}

impl BroadcastEngine {
    pub fn new(history_capacity: usize, snapshot: usize) -> Self {
        Self {
            registry: Registry::new(),
            history: HistoryBuffer::new(history_capacity),
            snapshot,
        }
    }

    pub fn registry(&self) -> &Registry<SessionHandle> {
        &self.registry
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Register a new session and greet it with the welcome and a history
    /// snapshot. Nobody else is notified.
    pub fn on_connect(&mut self, id: SessionId, handle: SessionHandle) {
        info!(session = %id, "User connected");
        self.registry.add(id.clone(), handle);

        self.send_to(&id, &ServerEvent::welcome(id.clone(), self.history.len()));
        if !self.history.is_empty() {
            let messages = self.history.recent(self.snapshot);
            self.send_to(&id, &ServerEvent::MessageHistory { messages });
        }
    }

    /// Parse and route one frame from `id`.
    pub fn on_frame(&mut self, id: &SessionId, frame: InboundFrame) {
        if !self.registry.contains(id) {
            debug!(session = %id, "Frame from unregistered session ignored");
            return;
        }

        let parsed = match frame {
            InboundFrame::Text(text) => InboundEvent::parse(&text),
            InboundFrame::Binary => Err(ProtocolError::BinaryFrame),
        };

        match parsed {
            Ok(InboundEvent::JoinChat(p)) => {
                self.on_join(id, p.user_name);
            }
            Ok(InboundEvent::SendMessage(p)) => {
                self.on_send_message(id, p.user_name, p.text);
            }
            Ok(InboundEvent::Unknown { kind }) => self.on_unknown_event_type(id, &kind),
            Err(e) => self.on_malformed_frame(id, &e),
        }
    }

    /// Announce a join to every session, the joiner included.
    pub fn on_join(&mut self, id: &SessionId, user_name: String) -> usize {
        debug!(session = %id, user = %user_name, "JOIN_CHAT");
        self.broadcast(&ServerEvent::user_joined(id.clone(), user_name), None)
    }

    /// Record a chat message and deliver it to every session, the author
    /// included.
    pub fn on_send_message(&mut self, id: &SessionId, user_name: String, text: String) -> usize {
        let message = ChatMessage::new(id, user_name, text);
        debug!(session = %id, message = %message.id, "SEND_MESSAGE");
        self.history.append(message.clone());
        self.broadcast(&ServerEvent::NewMessage { message }, None)
    }

    /// Tell the offending session its frame was not understood.
    pub fn on_malformed_frame(&self, id: &SessionId, error: &ProtocolError) {
        warn!(session = %id, error = %error, "Malformed frame");
        self.send_to(id, &ServerEvent::invalid_format());
    }

    pub fn on_unknown_event_type(&self, id: &SessionId, kind: &str) {
        debug!(session = %id, kind = %kind, "Unknown event type ignored");
    }

    /// Drop a session and notify the rest. Returns false if it was already gone.
    pub fn on_disconnect(&mut self, id: &SessionId) -> bool {
        if self.registry.remove(id).is_none() {
            return false;
        }
        info!(session = %id, remaining = self.registry.len(), "User disconnected");
        self.broadcast(&ServerEvent::user_left(id.clone()), Some(id));
        true
    }

    /// Release every session. Their queues close, which ends their sockets.
    pub fn shutdown(&mut self) -> usize {
        let sessions = self.registry.drain();
        info!(sessions = sessions.len(), "Closing all chat sessions");
        sessions.len()
    }

    fn send_to(&self, id: &SessionId, event: &ServerEvent) -> bool {
        let Some(handle) = self.registry.get(id) else {
            return false;
        };
        match serde_json::to_string(event) {
            Ok(frame) => handle.deliver(id, &frame),
            Err(e) => {
                warn!(kind = event.kind(), error = %e, "Failed to encode event");
                false
            }
        }
    }

    fn broadcast(&self, event: &ServerEvent, exclude: Option<&SessionId>) -> usize {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(kind = event.kind(), error = %e, "Failed to encode event");
                return 0;
            }
        };

        let mut delivered = 0;
        self.registry.for_each(
            |id, handle| {
                if handle.deliver(id, &frame) {
                    delivered += 1;
                }
            },
            exclude,
        );
        debug!(kind = event.kind(), delivered, "Broadcast");
        delivered
    }
}
