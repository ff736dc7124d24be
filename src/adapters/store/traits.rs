//! Key-value persistence traits
//!
//! Schedules and export history live in a small versioned key-value store.
//! Every write is a compare-and-swap against the version the writer read, so
//! concurrent read-modify-write cycles cannot silently overwrite each other.

use crate::domain::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Stored value plus its version
///
/// Versions start at 1 for the first write; an absent key behaves as version 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned {
    pub version: u64,
    pub value: serde_json::Value,
}

/// Outcome of a compare-and-swap write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Value stored under the returned new version
    Written(u64),
    /// Another writer got there first; holds the version actually stored
    Conflict(u64),
}

/// Versioned key-value store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a key
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or the entry is corrupt.
    async fn get(&self, key: &str) -> Result<Option<Versioned>>;

    /// Writes `value` only if the stored version still equals `expected_version`
    ///
    /// # Arguments
    ///
    /// * `key` - Entry name
    /// * `expected_version` - Version the caller read (0 if the key was absent)
    /// * `value` - New value
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails. A version mismatch is not an
    /// error; it is reported as [`SwapOutcome::Conflict`].
    async fn compare_and_swap(
        &self,
        key: &str,
        expected_version: u64,
        value: serde_json::Value,
    ) -> Result<SwapOutcome>;
}
