//! One-file-per-message storage
//!
//! Each message lives in `<dir>/<identity>.txt` holding the trimmed content.
//! Files are written under a hidden temporary name and then linked into
//! place, so readers only ever see complete messages and an existing
//! message file is never replaced.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::application::errors::{GuestbookError, StorageError};
use crate::domain::entities::{Identity, Message, MessageContent};
use crate::domain::traits::MessageStore;

const EXTENSION: &str = "txt";

/// Directory-backed message store
pub struct FileStore {
    dir: PathBuf,
    /// Next sequence to hand out; held across the whole write
    next_sequence: Mutex<u64>,
}

impl FileStore {
    /// Open (creating if needed) the message directory and resume its sequence
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        if !tokio::fs::metadata(&dir).await?.is_dir() {
            return Err(StorageError::NotADirectory(dir));
        }

        let scan = scan(&dir).await?;
        for name in &scan.skipped {
            tracing::warn!("Ignoring unrecognised file in {}: {}", dir.display(), name);
        }

        let next = match scan.units.last() {
            Some((identity, _)) => identity
                .sequence()
                .checked_add(1)
                .ok_or(StorageError::SequenceExhausted(identity.sequence()))?,
            None => 1,
        };

        tracing::info!(
            "Opened message store at {} ({} messages, next sequence {})",
            dir.display(),
            scan.units.len(),
            next
        );

        Ok(Self {
            dir,
            next_sequence: Mutex::new(next),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `identity`
    pub fn unit_path(&self, identity: &Identity) -> PathBuf {
        self.dir.join(format!("{}.{}", identity, EXTENSION))
    }

    async fn persist(&self, identity: &Identity, content: &str) -> Result<(), StorageError> {
        let tmp = self.dir.join(format!(".{}.tmp", identity));
        let path = self.unit_path(identity);

        if let Err(e) = write_new(&tmp, content).await {
            // An existing temp file belongs to another writer
            if !is_already_exists(&e) {
                let _ = tokio::fs::remove_file(&tmp).await;
            }
            return Err(e);
        }

        // Fails with AlreadyExists instead of replacing another message
        let linked = tokio::fs::hard_link(&tmp, &path).await;
        let _ = tokio::fs::remove_file(&tmp).await;
        linked.map_err(StorageError::from)
    }
}

#[async_trait]
impl MessageStore for FileStore {
    async fn submit(&self, content: &str) -> Result<Message, GuestbookError> {
        let content = MessageContent::parse(content)?;

        let mut next = self.next_sequence.lock().await;
        loop {
            let sequence = *next;
            let following = sequence
                .checked_add(1)
                .ok_or(StorageError::SequenceExhausted(sequence))?;
            let identity = Identity::new(sequence, Utc::now());

            match self.persist(&identity, content.as_str()).await {
                Ok(()) => {
                    *next = following;
                    tracing::debug!("Persisted {}", self.unit_path(&identity).display());
                    return Ok(Message::new(identity, content));
                }
                Err(e) if is_already_exists(&e) => {
                    tracing::warn!("Identity {} already taken, moving to next sequence", identity);
                    *next = following;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<Message>, StorageError> {
        let scan = scan(&self.dir).await?;
        if !scan.skipped.is_empty() {
            tracing::debug!("Skipped {} non-message files", scan.skipped.len());
        }

        let mut messages = Vec::with_capacity(scan.units.len());
        for (identity, path) in scan.units {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => messages.push(Message::restore(identity, content)),
                // Removed by someone else since the directory was read
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(messages)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(scan(&self.dir).await?.units.len())
    }
}

struct Scan {
    /// Message files, ascending by identity
    units: Vec<(Identity, PathBuf)>,
    skipped: Vec<String>,
}

async fn scan(dir: &Path) -> Result<Scan, StorageError> {
    let mut units = Vec::new();
    let mut skipped = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !entry.file_type().await?.is_file() {
            skipped.push(name);
            continue;
        }

        match parse_unit_name(&name) {
            Some(identity) => units.push((identity, entry.path())),
            None => skipped.push(name),
        }
    }

    units.sort_by_key(|(identity, _)| *identity);
    Ok(Scan { units, skipped })
}

fn parse_unit_name(name: &str) -> Option<Identity> {
    let stem = name.strip_suffix(EXTENSION)?.strip_suffix('.')?;
    stem.parse().ok()
}

fn is_already_exists(e: &StorageError) -> bool {
    matches!(e, StorageError::Io(io) if io.kind() == std::io::ErrorKind::AlreadyExists)
}

async fn write_new(path: &Path, content: &str) -> Result<(), StorageError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(content.as_bytes()).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::ValidationError;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }

    #[tokio::test]
    async fn test_submit_creates_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        let msg = store.submit("Hello, this is a test message.").await.unwrap();

        let files = files_in(dir.path());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0], store.unit_path(&msg.identity));
        let content = std::fs::read_to_string(&files[0]).unwrap();
        assert_eq!(content.trim(), "Hello, this is a test message.");
    }

    #[tokio::test]
    async fn test_submit_stores_trimmed_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        let msg = store.submit("\n  padded  \t").await.unwrap();
        assert_eq!(msg.content, "padded");

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed, vec![msg]);
    }

    #[tokio::test]
    async fn test_blank_submit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        let err = store.submit("   ").await.unwrap_err();
        assert!(matches!(err, GuestbookError::Validation(ValidationError::EmptyContent)));
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_list_is_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        for text in ["one", "two", "three"] {
            store.submit(text).await.unwrap();
        }

        let contents: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_reopen_keeps_order_and_resumes_sequence() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.submit("before restart 1").await.unwrap();
            store.submit("before restart 2").await.unwrap();
        }

        let store = FileStore::open(dir.path()).await.unwrap();
        let after = store.submit("after restart").await.unwrap();
        assert_eq!(after.identity.sequence(), 3);

        let contents: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, ["before restart 1", "before restart 2", "after restart"]);
    }

    #[tokio::test]
    async fn test_stray_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.md"), "not a message").unwrap();
        std::fs::write(dir.path().join(".0000000009-1.tmp"), "half written").unwrap();
        std::fs::create_dir(dir.path().join("0000000008-1.txt")).unwrap();

        let store = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        let msg = store.submit("real").await.unwrap();
        assert_eq!(msg.identity.sequence(), 1);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_rejects_exhausted_sequence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("18446744073709551615-1.txt"), "last").unwrap();

        let err = FileStore::open(dir.path()).await.err().unwrap();
        assert!(matches!(err, StorageError::SequenceExhausted(u64::MAX)));
    }

    #[tokio::test]
    async fn test_failed_persist_cleans_up_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let identity = Identity::new(5, Utc.timestamp_millis_opt(1_000).unwrap());
        std::fs::create_dir(store.unit_path(&identity)).unwrap();

        let err = store.persist(&identity, "never visible").await.unwrap_err();
        assert!(is_already_exists(&err));

        let files = files_in(dir.path());
        assert_eq!(files, vec![store.unit_path(&identity)]);
        assert!(store.unit_path(&identity).is_dir());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_existing_unit_is_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let identity = Identity::new(1, Utc.timestamp_millis_opt(1_000).unwrap());
        std::fs::write(store.unit_path(&identity), "original").unwrap();

        assert!(store.persist(&identity, "intruder").await.is_err());
        assert_eq!(std::fs::read_to_string(store.unit_path(&identity)).unwrap(), "original");
        assert_eq!(files_in(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let messages = dir.path().join("messages");
        let store = FileStore::open(&messages).await.unwrap();

        std::fs::remove_dir_all(&messages).unwrap();
        let err = store.submit("lost").await.unwrap_err();
        assert!(matches!(err, GuestbookError::Storage(StorageError::Io(_))));

        std::fs::create_dir(&messages).unwrap();
        let msg = store.submit("kept").await.unwrap();
        assert_eq!(msg.identity.sequence(), 1);
        assert_eq!(files_in(&messages), vec![store.unit_path(&msg.identity)]);
    }

    #[tokio::test]
    async fn test_sees_files_written_by_another_handle() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileStore::open(dir.path()).await.unwrap();
        let reader = FileStore::open(dir.path()).await.unwrap();

        writer.submit("fresh").await.unwrap();
        assert_eq!(reader.list_all().await.unwrap()[0].content, "fresh");
    }

    #[tokio::test]
    async fn test_concurrent_submits_get_distinct_identities() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.submit(&format!("message {}", i)).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed.len(), 16);
        let sequences: Vec<u64> = listed.iter().map(|m| m.identity.sequence()).collect();
        assert_eq!(sequences, (1..=16).collect::<Vec<u64>>());
        assert_eq!(files_in(dir.path()).len(), 16);
    }

    #[tokio::test]
    async fn test_open_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages");
        std::fs::write(&path, "oops").unwrap();

        assert!(FileStore::open(&path).await.is_err());
    }
}
