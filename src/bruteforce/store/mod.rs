//! Durable storage of block records, keyed by `(operation, client_id)`.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use super::record::BlockRecord;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Identifies one independent rate-limit counter.
///
/// The operation ("login", "registration", ...) and the client identifier
/// (typically a public IP address, supplied by the caller) are opaque
/// strings; the store never interprets them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    operation: String,
    client_id: String,
}

impl Key {
    #[must_use]
    pub fn new(operation: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            client_id: client_id.into(),
        }
    }

    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The flat string the backends store under, e.g. `login-203.0.113.7`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}-{}", self.operation, self.client_id)
    }

    /// Match-all pattern for one operation's keys.
    pub(crate) fn operation_pattern(operation: &str) -> String {
        format!("{operation}-*")
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.operation, self.client_id)
    }
}

/// Store failures. "Key not found" is never an error; reads of unknown or
/// expired keys return the zero record.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or timed out. The caller
    /// decides whether this fails open or closed.
    #[error("block store unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

/// Capability interface over the block-record backends.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Current record for `key`; the zero record when nothing is stored.
    async fn read(&self, key: &Key) -> Result<BlockRecord, StoreError>;

    /// Upsert `record` with an explicit expiry.
    ///
    /// `ttl` must be the longest configured escalation step, not the
    /// current block duration, so the record's lifetime is bounded no
    /// matter which step it is on.
    async fn write(&self, key: &Key, record: &BlockRecord, ttl: Duration)
        -> Result<(), StoreError>;

    /// Delete the record. Deleting a missing key is not an error.
    async fn reset(&self, key: &Key) -> Result<(), StoreError>;

    /// Administrative bulk clear; returns the storage keys removed.
    ///
    /// Best effort: cost and completeness depend on the backend's ability
    /// to enumerate keys (see each implementation).
    async fn reset_all_for_operation(&self, operation: &str) -> Result<Vec<String>, StoreError>;
}
