use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::{GuestbookError, StorageError};
use crate::domain::entities::{Identity, Message, MessageContent};
use crate::domain::traits::MessageStore;

/// Volatile store, used for tests and throwaway runs
#[derive(Clone, Default)]
pub struct MemoryStore {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn submit(&self, content: &str) -> Result<Message, GuestbookError> {
        let content = MessageContent::parse(content)?;

        let mut messages = self.messages.write().await;
        let sequence = messages.len() as u64 + 1;
        let message = Message::new(Identity::new(sequence, Utc::now()), content);
        messages.push(message.clone());
        Ok(message)
    }

    async fn list_all(&self) -> Result<Vec<Message>, StorageError> {
        let messages = self.messages.read().await;
        Ok(messages.clone())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.messages.read().await.len())
    }
}
