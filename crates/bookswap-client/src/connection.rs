//! Background WebSocket connection loop with fixed-delay reconnect.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use bookswap_common::{ClientError, ServerEvent};

use crate::client::Shared;
use crate::types::{ClientCommand, ClientSettings, ConnectionStatus};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound frames buffered for one live connection.
const OUTBOUND_CAPACITY: usize = 64;

/// How one connection attempt ended.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    /// Closed or failed; wait and try again.
    Retry,
    /// Shutdown requested or the handle is gone.
    Stop,
}

/// How the reconnect wait ended.
#[derive(Debug, PartialEq, Eq)]
enum Wake {
    /// Delay elapsed or manual connect; attempt now.
    Attempt,
    /// Delay elapsed while already connected; nothing to do.
    Idle,
    Stop,
}

/// Background task managing the WebSocket connection.
pub(crate) async fn connection_loop(
    settings: ClientSettings,
    shared: Arc<Shared>,
    mut commands: mpsc::Receiver<ClientCommand>,
) {
    loop {
        if run_once(&settings, &shared, &mut commands).await == Outcome::Stop {
            break;
        }
        match wait_for_retry(settings.reconnect_delay, || shared.status(), &mut commands).await {
            Wake::Attempt => {}
            Wake::Stop => break,
            // Park until asked; never re-arm the timer from here.
            Wake::Idle => match commands.recv().await {
                Some(ClientCommand::Connect) => {}
                Some(ClientCommand::Shutdown) | None => break,
            },
        }
    }

    shared.detach(ConnectionStatus::Disconnected);
    info!("Chat client stopped");
}

/// Sleep out the reconnect delay, or wake early on a command.
///
/// `status` is read when the timer fires. Only this task sets `Connected`,
/// so today the guard cannot trip; it yields [`Wake::Idle`] if it does.
async fn wait_for_retry<S>(
    delay: Duration,
    status: S,
    commands: &mut mpsc::Receiver<ClientCommand>,
) -> Wake
where
    S: Fn() -> ConnectionStatus,
{
    info!(delay_ms = delay.as_millis() as u64, "Reconnecting in {}ms", delay.as_millis());
    tokio::select! {
        _ = tokio::time::sleep(delay) => {
            if status() == ConnectionStatus::Connected {
                debug!("Already connected, skipping reconnect");
                Wake::Idle
            } else {
                Wake::Attempt
            }
        }
        cmd = commands.recv() => match cmd {
            Some(ClientCommand::Connect) => {
                debug!("Manual connect, cancelling reconnect timer");
                Wake::Attempt
            }
            Some(ClientCommand::Shutdown) | None => Wake::Stop,
        }
    }
}

/// Open the WebSocket, bounded by the connect timeout.
async fn open(settings: &ClientSettings) -> Result<WsStream, ClientError> {
    let handshake = tokio_tungstenite::connect_async(settings.url.as_str());
    match tokio::time::timeout(settings.connect_timeout, handshake).await {
        Ok(Ok((ws_stream, _))) => Ok(ws_stream),
        Ok(Err(e)) => Err(ClientError::Connect(e.to_string())),
        Err(_elapsed) => Err(ClientError::Timeout(settings.connect_timeout.as_secs())),
    }
}

/// One connection attempt and, if it succeeds, the life of that connection.
async fn run_once(
    settings: &ClientSettings,
    shared: &Shared,
    commands: &mut mpsc::Receiver<ClientCommand>,
) -> Outcome {
    shared.set_status(ConnectionStatus::Connecting);
    info!(url = %settings.url, "Connecting to chat server");

    let handshake = open(settings);
    tokio::pin!(handshake);

    let result = loop {
        tokio::select! {
            res = &mut handshake => break res,
            cmd = commands.recv() => match cmd {
                Some(ClientCommand::Connect) => continue,
                Some(ClientCommand::Shutdown) | None => {
                    shared.set_status(ConnectionStatus::Disconnected);
                    return Outcome::Stop;
                }
            }
        }
    };

    let ws_stream = match result {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            error!(url = %settings.url, error = %e, "Failed to connect to chat server");
            shared.set_status(ConnectionStatus::Error);
            return Outcome::Retry;
        }
    };

    info!("Connected to chat server");
    let (mut ws_write, mut ws_read) = ws_stream.split();
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
    shared.attach(tx);

    let (status, outcome) = loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(json) = outbound else {
                    break (ConnectionStatus::Disconnected, Outcome::Retry);
                };
                if let Err(e) = ws_write.send(WsMessage::Text(json.into())).await {
                    warn!(error = %e, "WebSocket send failed");
                    break (ConnectionStatus::Error, Outcome::Retry);
                }
            }

            msg = ws_read.next() => match msg {
                Some(Ok(WsMessage::Text(text))) => {
                    match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            shared.dispatcher.dispatch(&event);
                        }
                        Err(e) => warn!(error = %e, "Unrecognized frame from chat server"),
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!("Chat server closed connection");
                    break (ConnectionStatus::Disconnected, Outcome::Retry);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket error");
                    break (ConnectionStatus::Error, Outcome::Retry);
                }
            },

            cmd = commands.recv() => match cmd {
                Some(ClientCommand::Connect) => debug!("Already connected"),
                Some(ClientCommand::Shutdown) | None => {
                    let _ = ws_write.send(WsMessage::Close(None)).await;
                    break (ConnectionStatus::Disconnected, Outcome::Stop);
                }
            },
        }
    };

    shared.detach(status);
    outcome
}
