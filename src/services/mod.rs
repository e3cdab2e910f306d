//! Service layer

pub mod account;
pub mod channel;
pub mod code_store;
pub mod handshake;
pub mod login;

pub use account::{AccountLookup, AccountRef, PgAccountLookup};
pub use channel::{ButtonRows, InlineButton, MessageChannel, TelegramChannel};
pub use code_store::{CodeStore, MemoryCodeStore, RedisCodeStore};
pub use handshake::{HandshakeConfig, HandshakeCoordinator, IssuedCode};
pub use login::LoginService;
