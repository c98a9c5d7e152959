//! Redis-backed block store, the production backend.
//!
//! Each record is a hash with two fields, `attempts` and `blocked_until`
//! (RFC 3339), written atomically together with a `PEXPIRE` so Redis
//! itself removes the key once the longest configured block has elapsed.
//! No in-process sweeping is needed.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{warn, Instrument};

use crate::bruteforce::record::BlockRecord;

use super::{BlockStore, Key, StoreError};

const FIELD_ATTEMPTS: &str = "attempts";
const FIELD_BLOCKED_UNTIL: &str = "blocked_until";

/// [`BlockStore`] over a multiplexed Redis connection.
///
/// The connection manager is created once at startup, owns reconnection,
/// and is safe to share across concurrent requests; clones are cheap
/// handles onto the same connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at `url`, e.g. `redis://:password@host:6379/0`.
    ///
    /// # Errors
    /// Returns an error if the URL does not parse or the initial
    /// connection cannot be established.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url).context("invalid redis url")?;
        let conn = ConnectionManager::new(client)
            .await
            .context("failed to connect to redis")?;
        Ok(Self { conn })
    }

    fn parse_record(key: &Key, fields: &HashMap<String, String>) -> BlockRecord {
        let attempts = fields
            .get(FIELD_ATTEMPTS)
            .and_then(|value| value.parse::<u32>().ok());
        let blocked_until = fields
            .get(FIELD_BLOCKED_UNTIL)
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .map(|value| value.with_timezone(&Utc));

        match (attempts, blocked_until) {
            (Some(attempts), Some(blocked_until)) => BlockRecord {
                attempts,
                blocked_until: Some(blocked_until),
            },
            // A hash we cannot parse must not block anyone; the TTL will
            // clear it out on its own.
            _ => {
                warn!(key = %key, "unparseable block record, treating as zero");
                BlockRecord::zero()
            }
        }
    }
}

fn unavailable(err: redis::RedisError) -> StoreError {
    StoreError::Unavailable(anyhow::Error::new(err))
}

#[async_trait]
impl BlockStore for RedisStore {
    async fn read(&self, key: &Key) -> Result<BlockRecord, StoreError> {
        let mut conn = self.conn.clone();
        let span = tracing::info_span!(
            "store.command",
            db.system = "redis",
            db.operation = "HGETALL"
        );
        let fields: HashMap<String, String> = conn
            .hgetall(key.storage_key())
            .instrument(span)
            .await
            .map_err(unavailable)?;

        if fields.is_empty() {
            return Ok(BlockRecord::zero());
        }
        Ok(Self::parse_record(key, &fields))
    }

    async fn write(
        &self,
        key: &Key,
        record: &BlockRecord,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let blocked_until = record
            .blocked_until
            .map(|until| until.to_rfc3339())
            .unwrap_or_default();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);

        let mut conn = self.conn.clone();
        let span = tracing::info_span!(
            "store.command",
            db.system = "redis",
            db.operation = "HSET+PEXPIRE"
        );
        let () = redis::pipe()
            .atomic()
            .hset_multiple(
                key.storage_key(),
                &[
                    (FIELD_ATTEMPTS, record.attempts.to_string()),
                    (FIELD_BLOCKED_UNTIL, blocked_until),
                ],
            )
            .ignore()
            .pexpire(key.storage_key(), ttl_ms)
            .ignore()
            .query_async(&mut conn)
            .instrument(span)
            .await
            .map_err(unavailable)?;

        Ok(())
    }

    async fn reset(&self, key: &Key) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let span =
            tracing::info_span!("store.command", db.system = "redis", db.operation = "DEL");
        conn.del::<_, ()>(key.storage_key())
            .instrument(span)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    /// Walks the keyspace with `SCAN MATCH "{operation}-*"`, then deletes
    /// the matches. O(keyspace); intended for operational recovery, not
    /// the request path.
    async fn reset_all_for_operation(&self, operation: &str) -> Result<Vec<String>, StoreError> {
        let pattern = Key::operation_pattern(operation);

        let matches: Vec<String> = {
            let mut conn = self.conn.clone();
            let mut iter = conn
                .scan_match::<_, String>(pattern)
                .await
                .map_err(unavailable)?;
            let mut matches = Vec::new();
            while let Some(key) = iter.next_item().await {
                matches.push(key);
            }
            matches
        };

        if matches.is_empty() {
            return Ok(matches);
        }

        let mut conn = self.conn.clone();
        let span =
            tracing::info_span!("store.command", db.system = "redis", db.operation = "DEL");
        conn.del::<_, ()>(&matches)
            .instrument(span)
            .await
            .map_err(unavailable)?;

        Ok(matches)
    }
}
