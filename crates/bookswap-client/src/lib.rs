//! Client session manager for the book community chat.
//!
//! Owns one outbound WebSocket at a time, fans server events out to
//! subscribed handlers and reconnects after a fixed delay.

mod client;
mod connection;
mod dispatch;
mod types;

pub use client::ChatClient;
pub use dispatch::{Handler, Subscription};
pub use types::{ClientSettings, ConnectionStatus};
