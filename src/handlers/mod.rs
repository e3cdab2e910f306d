//! Inbound update and event handlers

pub mod events;
pub mod messages;

pub use events::{AccountStatusChanged, BanPropagationHandler};
pub use messages::RegistrationFlow;
