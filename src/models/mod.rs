//! Data models

pub mod binding;
pub mod message;

pub use binding::{ChatBinding, ChatBindingStatus, NewChatBinding};
pub use message::{ChatKind, ChatMessage};
