//! In-process community chat broadcaster.
//!
//! One hub task owns the connection registry and the message history and
//! applies every inbound event to completion before taking the next one.
//! Per-connection tasks only shuttle frames between their socket and the hub.

mod connection;
mod engine;
mod history;
mod hub;
mod registry;
mod server;

pub use engine::{BroadcastEngine, InboundFrame, SessionHandle};
pub use history::HistoryBuffer;
pub use hub::ChatHandle;
pub use registry::Registry;
pub use server::ChatServer;
