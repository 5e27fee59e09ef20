//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod chat;
mod client;
mod server;

pub use chat::*;
pub use client::*;
pub use server::*;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookswapConfig {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub client: ClientConfig,
}
