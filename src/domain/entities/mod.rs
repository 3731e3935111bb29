//! Domain entities - Core business objects with no external dependencies

pub mod message;

pub use message::{Identity, InvalidIdentity, Message, MessageContent};
