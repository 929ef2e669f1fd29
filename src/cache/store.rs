//! Durable key-value storage for the rating cache and the block-list.
//!
//! The engine persists two blobs: the rating cache (`ratingCache`) and the
//! block-list (`blacklist`). [`KeyValueStore`] is the seam; [`FileStore`]
//! keeps one JSON file per key on disk, [`MemoryStore`] keeps everything in
//! process and is what tests and storage-less engines use.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::{MarqueeError, Result};

/// Blob store persisted across process restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`, or `None` if nothing was stored.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`.
    async fn set(&self, key: &str, blob: &str) -> Result<()>;
}

// ============================================================================
// FileStore
// ============================================================================

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// One `<key>.json` file per key inside a directory.
///
/// Each write goes to its own `.tmp` sibling and is renamed into place, so a
/// crash mid-write leaves the previous blob intact and overlapping writes
/// never share a temp file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default location: `~/.cache/marquee`.
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("marquee")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(MarqueeError::InvalidInput(format!(
                "invalid store key {key:?}"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MarqueeError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn set(&self, key: &str, blob: &str) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            MarqueeError::Storage(format!(
                "failed to create store dir {}: {e}",
                self.dir.display()
            ))
        })?;

        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self
            .dir
            .join(format!("{key}.json.{}-{seq}.tmp", std::process::id()));
        if let Err(e) = tokio::fs::write(&tmp_path, blob).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(MarqueeError::Storage(format!(
                "failed to write {}: {e}",
                tmp_path.display()
            )));
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(MarqueeError::Storage(format!(
                "failed to rename {} → {}: {e}",
                tmp_path.display(),
                path.display()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob, e.g. a block-list, before handing the store to an engine.
    pub fn with_blob(self, key: impl Into<String>, blob: impl Into<String>) -> Self {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), blob.into());
        self
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, blob: &str) -> Result<()> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }
}
