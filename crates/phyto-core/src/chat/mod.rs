//! Treatment chat domain module.
//!
//! - `message`: chat roles and messages
//! - `format`: markdown-to-markup rendering for assistant replies
//! - `session`: the per-history-entry `ChatSession` state machine

mod format;
mod message;
mod session;

pub use format::format_message;
pub use message::{ChatMessage, ChatRole};
pub use session::{
    ChatError, ChatPhase, ChatSession, CONNECTION_FALLBACK, EMPTY_REPLY_FALLBACK,
};
