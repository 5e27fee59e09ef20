pub mod color;
pub mod errors;
pub mod id;
pub mod protocol;

pub use color::{author_color, AUTHOR_PALETTE};
pub use errors::{BookswapError, ChatError, ClientError, ConfigError, ProtocolError};
pub use id::{new_message_id, now_timestamp, SessionId};
pub use protocol::{ChatMessage, ClientEvent, InboundEvent, ServerEvent};

pub type Result<T> = std::result::Result<T, BookswapError>;
