//! File-backed key-value store
//!
//! Each key is stored as `<root>/<key>.json` holding `{"version": n, "value": ...}`.
//! Writes go to a temporary file that is renamed over the entry, so readers
//! never observe a half-written document.

use super::traits::{KeyValueStore, SwapOutcome, Versioned};
use crate::domain::{Result, StoreError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Store rooted at a directory
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    // Serializes compare-and-swap within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens (and creates if needed) a store directory
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::WriteFailed {
                key: root.display().to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(path = %root.display(), "Opened file store");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()).into());
        }
        Ok(self.root.join(format!("{key}.json")))
    }

    async fn read_entry(&self, key: &str) -> Result<Option<Versioned>> {
        let path = self.path_for(key)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::ReadFailed {
                    key: key.to_string(),
                    message: e.to_string(),
                }
                .into())
            }
        };

        let entry = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(entry))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>> {
        self.read_entry(key).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: u64,
        value: serde_json::Value,
    ) -> Result<SwapOutcome> {
        let _guard = self.write_lock.lock().await;

        let current = self.read_entry(key).await?.map(|e| e.version).unwrap_or(0);
        if current != expected_version {
            return Ok(SwapOutcome::Conflict(current));
        }

        let version = current + 1;
        let body = serde_json::to_vec_pretty(&Versioned { version, value })?;

        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let write_failed = |e: std::io::Error| StoreError::WriteFailed {
            key: key.to_string(),
            message: e.to_string(),
        };
        tokio::fs::write(&tmp, body).await.map_err(write_failed)?;
        tokio::fs::rename(&tmp, &path).await.map_err(write_failed)?;

        tracing::trace!(key = key, version = version, "Stored entry");
        Ok(SwapOutcome::Written(version))
    }
}
