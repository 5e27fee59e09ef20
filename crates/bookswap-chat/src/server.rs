//! Chat server: builds the hub from config and exposes the upgrade route.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tracing::{info, warn};

use bookswap_common::ChatError;
use bookswap_config::validation::validate_chat;
use bookswap_config::ChatConfig;

use crate::connection::handle_socket;
use crate::engine::BroadcastEngine;
use crate::hub::ChatHandle;

#[derive(Clone)]
struct ChatState {
    chat: ChatHandle,
    outbound_buffer: usize,
}

/// Owns the running hub for the life of the process.
pub struct ChatServer {
    config: ChatConfig,
    handle: ChatHandle,
}

impl ChatServer {
    /// Validate `config` and start the hub. Must be called inside a tokio
    /// runtime.
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        Self::with_reserved_paths(config, &[])
    }

    /// Like [`new`](Self::new), but also fails when the chat path equals one
    /// of `reserved`, the routes the host router already serves.
    pub fn with_reserved_paths(config: ChatConfig, reserved: &[&str]) -> Result<Self, ChatError> {
        validate_chat(&config).map_err(|e| ChatError::InvalidConfig(e.to_string()))?;
        if config.path.contains([':', '*', '{', '}']) {
            return Err(ChatError::InvalidConfig(format!(
                "chat.path '{}' must be a static route",
                config.path
            )));
        }
        if reserved.contains(&config.path.as_str()) {
            return Err(ChatError::InvalidConfig(format!(
                "chat.path '{}' is already served by the host",
                config.path
            )));
        }

        let engine = BroadcastEngine::new(config.history_capacity, config.history_snapshot);
        let handle = ChatHandle::spawn(engine);

        info!(
            path = %config.path,
            history_capacity = config.history_capacity,
            "Book community chat server ready"
        );
        Ok(Self { config, handle })
    }

    pub fn path(&self) -> &str {
        &self.config.path
    }

    pub fn handle(&self) -> ChatHandle {
        self.handle.clone()
    }

    /// Router carrying only the upgrade route; merge it into the host router.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let state = ChatState {
            chat: self.handle.clone(),
            outbound_buffer: self.config.outbound_buffer,
        };
        Router::new()
            .route(&self.config.path, get(ws_upgrade))
            .with_state(state)
    }

    /// Close every session and stop the hub.
    pub async fn shutdown(&self) -> Result<(), ChatError> {
        self.handle.shutdown().await
    }
}

async fn ws_upgrade(State(state): State<ChatState>, ws: WebSocketUpgrade) -> Response {
    ws.on_failed_upgrade(|e| warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| handle_socket(socket, state.chat, state.outbound_buffer))
}
