//! Per-connection task: register with the hub, then shuttle frames until
//! either side goes away.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::InboundFrame;
use crate::hub::ChatHandle;

/// Drive one accepted WebSocket for its whole life.
pub(crate) async fn handle_socket(socket: WebSocket, chat: ChatHandle, outbound_buffer: usize) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(outbound_buffer);

    let session = match chat.connect(tx).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Rejecting connection");
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
    };

    loop {
        tokio::select! {
            // Hub -> this client
            outbound = rx.recv() => {
                match outbound {
                    Some(frame) => {
                        if let Err(e) = sink.send(Message::Text(frame.into())).await {
                            debug!(session = %session, error = %e, "Send failed");
                            break;
                        }
                    }
                    None => {
                        // Hub released the session (shutdown).
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            // This client -> hub
            frame = stream.next() => {
                let inbound = match frame {
                    Some(Ok(Message::Text(text))) => InboundFrame::Text(text.to_string()),
                    Some(Ok(Message::Binary(_))) => InboundFrame::Binary,
                    // Pings are answered by the transport.
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(session = %session, error = %e, "WS error");
                        break;
                    }
                };
                if chat.frame(&session, inbound).await.is_err() {
                    break;
                }
            }
        }
    }

    info!(session = %session, "Connection closed");
    let _ = chat.disconnect(&session).await;
}
