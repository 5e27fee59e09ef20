//! The chat hub: a single task that owns the broadcast engine.
//!
//! Connection tasks talk to it through [`ChatHandle`]. Commands are applied
//! one at a time, so every registry and history mutation runs to completion
//! before the next inbound event is looked at.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use bookswap_common::{ChatError, SessionId};

use crate::engine::{BroadcastEngine, InboundFrame, SessionHandle};

/// Queue length between connection tasks and the hub.
const COMMAND_CAPACITY: usize = 1024;

enum HubCommand {
    Connect {
        handle: SessionHandle,
        reply: oneshot::Sender<SessionId>,
    },
    Frame {
        session: SessionId,
        frame: InboundFrame,
    },
    Disconnect {
        session: SessionId,
    },
    SessionCount {
        reply: oneshot::Sender<usize>,
    },
    HistoryLen {
        reply: oneshot::Sender<usize>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running hub.
#[derive(Clone)]
pub struct ChatHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl ChatHandle {
    /// Start a hub on the current tokio runtime.
    pub fn spawn(engine: BroadcastEngine) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        tokio::spawn(run_hub(engine, rx));
        Self { tx }
    }

    /// Register a session whose outbound frames go to `outbound`.
    /// Returns the minted session id once the welcome has been queued.
    pub async fn connect(&self, outbound: mpsc::Sender<String>) -> Result<SessionId, ChatError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Connect {
            handle: SessionHandle::new(outbound),
            reply,
        })
        .await?;
        rx.await.map_err(|_| ChatError::HubClosed)
    }

    /// Hand one received frame to the hub.
    pub async fn frame(&self, session: &SessionId, frame: InboundFrame) -> Result<(), ChatError> {
        self.send(HubCommand::Frame {
            session: session.clone(),
            frame,
        })
        .await
    }

    /// Report that a session's connection closed or failed.
    pub async fn disconnect(&self, session: &SessionId) -> Result<(), ChatError> {
        self.send(HubCommand::Disconnect {
            session: session.clone(),
        })
        .await
    }

    /// Number of registered sessions.
    pub async fn session_count(&self) -> Result<usize, ChatError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::SessionCount { reply }).await?;
        rx.await.map_err(|_| ChatError::HubClosed)
    }

    /// Number of messages currently retained.
    pub async fn history_len(&self) -> Result<usize, ChatError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::HistoryLen { reply }).await?;
        rx.await.map_err(|_| ChatError::HubClosed)
    }

    /// Close every session and stop the hub. Waits until the hub has let go
    /// of all sessions.
    pub async fn shutdown(&self) -> Result<(), ChatError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Shutdown { reply }).await?;
        rx.await.map_err(|_| ChatError::HubClosed)
    }

    async fn send(&self, cmd: HubCommand) -> Result<(), ChatError> {
        self.tx.send(cmd).await.map_err(|_| ChatError::HubClosed)
    }
}

async fn run_hub(mut engine: BroadcastEngine, mut rx: mpsc::Receiver<HubCommand>) {
    info!("Chat hub started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            HubCommand::Connect { handle, reply } => {
                let session = SessionId::new();
                engine.on_connect(session.clone(), handle);
                if reply.send(session.clone()).is_err() {
                    // Connection task went away before learning its id.
                    engine.on_disconnect(&session);
                }
            }
            HubCommand::Frame { session, frame } => engine.on_frame(&session, frame),
            HubCommand::Disconnect { session } => {
                if !engine.on_disconnect(&session) {
                    debug!(session = %session, "Session already removed");
                }
            }
            HubCommand::SessionCount { reply } => {
                let _ = reply.send(engine.registry().len());
            }
            HubCommand::HistoryLen { reply } => {
                let _ = reply.send(engine.history().len());
            }
            HubCommand::Shutdown { reply } => {
                engine.shutdown();
                let _ = reply.send(());
                break;
            }
        }
    }

    info!("Chat hub stopped");
}
