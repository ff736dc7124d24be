//! Versioned key-value persistence
//!
//! - [`traits`] - [`KeyValueStore`] with compare-and-swap writes
//! - [`memory`] - in-process backend
//! - [`file`] - one JSON file per key
//! - [`collection`] - typed collections with optimistic retries

pub mod collection;
pub mod file;
pub mod memory;
pub mod traits;

pub use collection::JsonCollection;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{KeyValueStore, SwapOutcome, Versioned};

use crate::config::schema::{StorageBackend, StorageConfig};
use crate::domain::Result;
use std::sync::Arc;

/// Create a key-value store based on the configuration
///
/// # Errors
///
/// Returns an error if the file backend directory cannot be created
pub async fn create_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config.backend {
        StorageBackend::File => {
            tracing::debug!(path = %config.path, "Creating file store");
            Ok(Arc::new(FileStore::open(&config.path).await?))
        }
        StorageBackend::Memory => {
            tracing::debug!("Creating in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_file_store() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            path: dir.path().join("state").to_string_lossy().to_string(),
            max_write_attempts: 5,
        };

        let store = create_store(&config).await.unwrap();
        store.compare_and_swap("k", 0, json!(1)).await.unwrap();
        assert!(dir.path().join("state").join("k.json").exists());
    }

    #[tokio::test]
    async fn test_create_memory_store() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..Default::default()
        };
        let store = create_store(&config).await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }
}
