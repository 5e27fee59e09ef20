//! Public handle for the chat connection.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use bookswap_common::{ClientError, ClientEvent, ServerEvent};

use crate::connection::connection_loop;
use crate::dispatch::{Dispatcher, Subscription};
use crate::types::{ClientCommand, ClientSettings, ConnectionStatus};

/// State shared between the handle and the connection task.
pub(crate) struct Shared {
    status: watch::Sender<ConnectionStatus>,
    /// Writer queue of the live connection, if any.
    outbound: Mutex<Option<mpsc::Sender<String>>>,
    pub(crate) dispatcher: Dispatcher,
}

impl Shared {
    fn new() -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            status,
            outbound: Mutex::new(None),
            dispatcher: Dispatcher::default(),
        }
    }

    fn outbound(&self) -> MutexGuard<'_, Option<mpsc::Sender<String>>> {
        self.outbound.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub(crate) fn set_status(&self, status: ConnectionStatus) {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            debug!(status = %status, "Connection status changed");
        }
    }

    /// Install the writer for a fresh connection, then report `Connected`.
    pub(crate) fn attach(&self, tx: mpsc::Sender<String>) {
        *self.outbound() = Some(tx);
        self.set_status(ConnectionStatus::Connected);
    }

    /// Drop the writer, then report `status`.
    pub(crate) fn detach(&self, status: ConnectionStatus) {
        self.outbound().take();
        self.set_status(status);
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Handle to one chat session manager.
///
/// [`start`](Self::start) spawns a background task that owns the WebSocket,
/// dispatches every server event to subscribed handlers and reconnects after
/// a fixed delay whenever the connection drops.
pub struct ChatClient {
    shared: Arc<Shared>,
    command_tx: mpsc::Sender<ClientCommand>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChatClient {
    /// Validate `settings` and start the connection task. Must be called
    /// inside a tokio runtime.
    pub fn start(settings: ClientSettings) -> Result<Self, ClientError> {
        settings.validate()?;

        let shared = Arc::new(Shared::new());
        let (command_tx, command_rx) = mpsc::channel(8);
        let task = tokio::spawn(connection_loop(settings, Arc::clone(&shared), command_rx));

        Ok(Self {
            shared,
            command_tx,
            task: Mutex::new(Some(task)),
        })
    }

    /// Send `event` over the live connection.
    ///
    /// Returns `false` when not connected. Nothing is queued across
    /// disconnects.
    pub fn publish(&self, event: &ClientEvent) -> bool {
        if self.shared.status() != ConnectionStatus::Connected {
            return false;
        }
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                warn!(event = event.kind(), error = %e, "Failed to encode event");
                return false;
            }
        };

        let outbound = self.shared.outbound();
        let Some(tx) = outbound.as_ref() else {
            return false;
        };
        match tx.try_send(json) {
            Ok(()) => true,
            Err(e) => {
                warn!(event = event.kind(), error = %e, "Dropping outbound event");
                false
            }
        }
    }

    /// Register `handler` for every server event, in registration order.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ServerEvent) -> Result<(), ClientError> + Send + Sync + 'static,
    {
        let id = self.shared.dispatcher.add(handler);
        Subscription::new(id, self.shared.dispatcher.clone())
    }

    pub fn handler_count(&self) -> usize {
        self.shared.dispatcher.len()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    /// Receiver that observes every status change.
    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Connect now instead of waiting out the reconnect delay. No-op while
    /// connected or connecting.
    pub fn connect(&self) {
        if self.command_tx.try_send(ClientCommand::Connect).is_err() {
            debug!("Connect request already pending");
        }
    }

    /// Close the connection and stop reconnecting. Waits for the background
    /// task to finish.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(ClientCommand::Shutdown).await;
        let task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Connection task ended abnormally");
            }
        }
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        if let Some(task) = self
            .task
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            task.abort();
        }
    }
}
