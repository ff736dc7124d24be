//! In-memory key-value store

use super::traits::{KeyValueStore, SwapOutcome, Versioned};
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Process-local store, used for tests and `backend = "memory"`
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Versioned>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: u64,
        value: serde_json::Value,
    ) -> Result<SwapOutcome> {
        let mut entries = self.entries.lock().await;
        let current = entries.get(key).map(|v| v.version).unwrap_or(0);
        if current != expected_version {
            return Ok(SwapOutcome::Conflict(current));
        }

        let version = current + 1;
        entries.insert(key.to_string(), Versioned { version, value });
        Ok(SwapOutcome::Written(version))
    }
}
