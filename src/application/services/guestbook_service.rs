use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::errors::{GuestbookError, StorageError};
use crate::application::render::PageRenderer;
use crate::domain::entities::Message;
use crate::domain::traits::MessageStore;

/// Service tying the message store to the page renderer
pub struct GuestbookService {
    store: Arc<dyn MessageStore>,
    renderer: PageRenderer,
    snapshot: Option<PathBuf>,
    /// Serializes render + snapshot write so the last write is the newest page
    regenerate_lock: Mutex<()>,
}

impl GuestbookService {
    pub fn new(store: Arc<dyn MessageStore>, renderer: PageRenderer) -> Self {
        Self {
            store,
            renderer,
            snapshot: None,
            regenerate_lock: Mutex::new(()),
        }
    }

    /// Also write every regenerated page to `path`
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    /// Persist a submission, then regenerate the page before returning.
    ///
    /// Once the store has accepted the message the submission succeeds;
    /// a failed regeneration is only logged.
    pub async fn submit(&self, raw: &str) -> Result<Message, GuestbookError> {
        let message = self.store.submit(raw).await?;
        tracing::info!("Accepted message {}", message.identity);

        if let Err(e) = self.regenerate().await {
            tracing::warn!("Failed to regenerate page after {}: {}", message.identity, e);
        }

        Ok(message)
    }

    /// Render the page from the current durable state
    pub async fn page(&self) -> Result<String, GuestbookError> {
        let messages = self.store.list_all().await?;
        tracing::debug!("Rendering {} messages", messages.len());
        Ok(self.renderer.render(&messages))
    }

    /// Startup check: count what is already stored and refresh the snapshot
    pub async fn prepare(&self) -> Result<usize, GuestbookError> {
        let count = self.store.count().await?;
        tracing::info!("Loaded {} stored messages", count);

        self.regenerate().await?;
        Ok(count)
    }

    /// Render from durable state and write the snapshot, one caller at a time
    async fn regenerate(&self) -> Result<String, GuestbookError> {
        let _guard = self.regenerate_lock.lock().await;
        let html = self.page().await?;
        self.write_snapshot(&html).await;
        Ok(html)
    }

    async fn write_snapshot(&self, html: &str) {
        let Some(path) = &self.snapshot else {
            return;
        };

        if let Err(e) = write_atomic(path, html).await {
            tracing::warn!("Failed to write page snapshot {}: {}", path.display(), e);
        }
    }
}

/// Write to a sibling temp file and rename it over `path`
async fn write_atomic(path: &Path, contents: &str) -> Result<(), StorageError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    if let Err(e) = tokio::fs::write(&tmp, contents).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
