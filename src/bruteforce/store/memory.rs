//! In-process block store.
//!
//! Single-process only: records are not shared across instances, so this
//! backend suits tests and local development, not a deployed fleet. Expiry
//! is evaluated lazily on access against the injected clock; there is no
//! background sweeper.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::bruteforce::clock::{Clock, SystemClock};
use crate::bruteforce::record::BlockRecord;

use super::{BlockStore, Key, StoreError};

struct Entry {
    record: BlockRecord,
    expires_at: DateTime<Utc>,
}

/// [`BlockStore`] backed by a mutex-guarded map.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Store reading expiry deadlines from the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store with an injected clock, for deterministic expiry in tests.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn read(&self, key: &Key) -> Result<BlockRecord, StoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match entries.get(&key.storage_key()) {
            Some(entry) if entry.expires_at > now => Ok(entry.record.clone()),
            Some(_) => {
                // Expired; drop it on the way out.
                entries.remove(&key.storage_key());
                Ok(BlockRecord::zero())
            }
            None => Ok(BlockRecord::zero()),
        }
    }

    async fn write(
        &self,
        key: &Key,
        record: &BlockRecord,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires_at = self.clock.now()
            + ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::zero());
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.storage_key(),
            Entry {
                record: record.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn reset(&self, key: &Key) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.remove(&key.storage_key());
        Ok(())
    }

    async fn reset_all_for_operation(&self, operation: &str) -> Result<Vec<String>, StoreError> {
        let prefix = format!("{operation}-");
        let mut entries = self.entries.lock().await;
        let removed: Vec<String> = entries
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();
        for key in &removed {
            entries.remove(key);
        }
        Ok(removed)
    }
}
