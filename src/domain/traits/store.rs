use async_trait::async_trait;
use crate::application::errors::{GuestbookError, StorageError};
use crate::domain::entities::Message;

/// MessageStore trait - abstraction for message persistence
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Validate, assign an identity and persist one message
    async fn submit(&self, content: &str) -> Result<Message, GuestbookError>;

    /// All persisted messages, oldest first
    async fn list_all(&self) -> Result<Vec<Message>, StorageError>;

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.list_all().await?.len())
    }
}
