//! A small HTTP guestbook: one file per message, newest first on the page.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::errors::{ConfigError, GuestbookError, StorageError, ValidationError};
pub use application::render::PageRenderer;
pub use application::services::GuestbookService;
pub use domain::entities::{Identity, Message, MessageContent};
pub use domain::traits::MessageStore;
pub use infrastructure::client::GuestbookClient;
pub use infrastructure::config::Config;
pub use infrastructure::server::ServerHandle;
pub use infrastructure::storage::{FileStore, MemoryStore};
