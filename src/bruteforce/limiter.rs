//! The orchestrator: clock + policy + store behind a check/record/reset API.

use std::sync::Arc;
use std::time::Duration;

use super::clock::Clock;
use super::policy::EscalationPolicy;
use super::record::BlockRecord;
use super::store::{BlockStore, Key, StoreError};

/// Outcome of [`RateLimiter::check`]. Being blocked is an expected
/// decision, not an error; only store trouble surfaces as `Err`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allowed {
        record: BlockRecord,
    },
    Blocked {
        record: BlockRecord,
        /// Whole seconds until the block expires, rounded up.
        retry_after_secs: u64,
    },
}

/// Result of recording one failure: the escalated record and the new wait.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Penalty {
    pub record: BlockRecord,
    pub wait_secs: u64,
}

/// Decides whether a client may attempt a protected operation and applies
/// the escalating cool-down when it fails.
///
/// Stateless besides its (shared) store handle and the immutable policy;
/// one instance is shared by every in-flight request. Store errors are
/// returned untouched — the limiter never retries, logs, or converts an
/// outage into a decision. The caller owns the fail-open/fail-closed
/// choice.
pub struct RateLimiter {
    store: Arc<dyn BlockStore>,
    policy: EscalationPolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn BlockStore>, policy: EscalationPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    /// Is `key` currently blocked?
    ///
    /// # Errors
    /// Propagates [`StoreError`] from the read unmodified.
    pub async fn check(&self, key: &Key) -> Result<Verdict, StoreError> {
        let record = self.store.read(key).await?;
        let now = self.clock.now();
        if record.is_active(now) {
            let retry_after_secs = record.remaining_secs(now);
            Ok(Verdict::Blocked {
                record,
                retry_after_secs,
            })
        } else {
            Ok(Verdict::Allowed { record })
        }
    }

    /// Record one failed attempt and escalate the block.
    ///
    /// Reads the current record, increments the attempt counter, applies
    /// the policy, and writes the result with the policy's longest
    /// duration as TTL. The read-then-write is not atomic: two racing
    /// failures for the same key may undercount by one (last write wins).
    /// That bias is acceptable for abuse deterrence; the curve still
    /// trends upward. Calling this on an already-blocked key simply
    /// escalates further.
    ///
    /// # Errors
    /// Propagates [`StoreError`] from the read or the write unmodified.
    pub async fn record_failure(&self, key: &Key) -> Result<Penalty, StoreError> {
        let old = self.store.read(key).await?;
        let attempts = old.attempts + 1;
        let (blocked_until, wait_secs) = self.policy.next_block(self.clock.now(), attempts);
        let record = BlockRecord {
            attempts,
            blocked_until: Some(blocked_until),
        };
        let ttl = Duration::from_secs(self.policy.max_duration_secs());
        self.store.write(key, &record, ttl).await?;
        Ok(Penalty { record, wait_secs })
    }

    /// Lift the block for `key` (successful operation, password reset,
    /// administrative unblock). Idempotent.
    ///
    /// # Errors
    /// Propagates [`StoreError`] unmodified.
    pub async fn reset(&self, key: &Key) -> Result<(), StoreError> {
        self.store.reset(key).await
    }

    /// Administrative bulk clear for one operation; returns the removed
    /// storage keys.
    ///
    /// # Errors
    /// Propagates [`StoreError`] unmodified.
    pub async fn reset_all_for_operation(
        &self,
        operation: &str,
    ) -> Result<Vec<String>, StoreError> {
        self.store.reset_all_for_operation(operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bruteforce::clock::ManualClock;
    use crate::bruteforce::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::sync::Mutex;

    fn fixture(durations: Vec<u64>) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let limiter = RateLimiter::new(
            store,
            EscalationPolicy::new(durations).unwrap(),
            clock.clone(),
        );
        (limiter, clock)
    }

    fn key() -> Key {
        Key::new("login", "203.0.113.7")
    }

    #[tokio::test]
    async fn unknown_client_is_allowed() {
        let (limiter, _clock) = fixture(vec![15, 30, 60]);
        let verdict = limiter.check(&key()).await.unwrap();
        assert_eq!(
            verdict,
            Verdict::Allowed {
                record: BlockRecord::zero()
            }
        );
    }

    #[tokio::test]
    async fn first_failure_blocks_for_first_duration() {
        // Scenario A: durations [15, 30, 60].
        let (limiter, clock) = fixture(vec![15, 30, 60]);
        let t0 = clock.now();

        let penalty = limiter.record_failure(&key()).await.unwrap();
        assert_eq!(penalty.wait_secs, 15);
        assert_eq!(penalty.record.attempts, 1);
        assert_eq!(
            penalty.record.blocked_until,
            Some(t0 + ChronoDuration::seconds(15))
        );

        // One second later the client is still blocked, 14s to go.
        clock.advance_secs(1);
        let verdict = limiter.check(&key()).await.unwrap();
        assert!(matches!(
            verdict,
            Verdict::Blocked {
                retry_after_secs: 14,
                ..
            }
        ));

        // The client waits the block out, then fails again: second step.
        clock.advance_secs(15); // t0 + 16
        assert!(matches!(
            limiter.check(&key()).await.unwrap(),
            Verdict::Allowed { .. }
        ));
        let penalty = limiter.record_failure(&key()).await.unwrap();
        assert_eq!(penalty.wait_secs, 30);
        assert_eq!(
            penalty.record.blocked_until,
            Some(t0 + ChronoDuration::seconds(16 + 30))
        );
    }

    #[tokio::test]
    async fn escalation_clamps_to_last_duration() {
        // Scenario B: five consecutive failures, table of three.
        let (limiter, _clock) = fixture(vec![15, 30, 60]);
        let mut waits = Vec::new();
        for _ in 0..5 {
            waits.push(limiter.record_failure(&key()).await.unwrap().wait_secs);
        }
        assert_eq!(waits, vec![15, 30, 60, 60, 60]);
    }

    #[tokio::test]
    async fn blocked_until_never_decreases() {
        let (limiter, clock) = fixture(vec![15, 30, 60]);
        let mut previous = None;
        for _ in 0..6 {
            let penalty = limiter.record_failure(&key()).await.unwrap();
            let until = penalty.record.blocked_until.unwrap();
            if let Some(previous) = previous {
                assert!(until >= previous);
            }
            previous = Some(until);
            clock.advance_secs(1);
        }
    }

    #[tokio::test]
    async fn reset_clears_state() {
        // Scenario C: three failures, then a reset.
        let (limiter, _clock) = fixture(vec![15, 30, 60]);
        for _ in 0..3 {
            limiter.record_failure(&key()).await.unwrap();
        }
        limiter.reset(&key()).await.unwrap();

        let verdict = limiter.check(&key()).await.unwrap();
        assert_eq!(
            verdict,
            Verdict::Allowed {
                record: BlockRecord::zero()
            }
        );

        // Resetting again is fine.
        limiter.reset(&key()).await.unwrap();
    }

    #[tokio::test]
    async fn block_boundary_is_exclusive() {
        let (limiter, clock) = fixture(vec![15, 30, 60]);
        limiter.record_failure(&key()).await.unwrap();

        clock.advance_secs(14);
        assert!(matches!(
            limiter.check(&key()).await.unwrap(),
            Verdict::Blocked { .. }
        ));

        // At exactly blocked_until the block has expired.
        clock.advance_secs(1);
        assert!(matches!(
            limiter.check(&key()).await.unwrap(),
            Verdict::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn failure_while_blocked_escalates_further() {
        let (limiter, _clock) = fixture(vec![15, 30, 60]);
        limiter.record_failure(&key()).await.unwrap();
        // A racing request that slipped past check.
        let penalty = limiter.record_failure(&key()).await.unwrap();
        assert_eq!(penalty.record.attempts, 2);
        assert_eq!(penalty.wait_secs, 30);
    }

    /// Wrapper that records the TTL of every write.
    struct TtlSpy {
        inner: MemoryStore,
        ttls: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl BlockStore for TtlSpy {
        async fn read(&self, key: &Key) -> Result<BlockRecord, StoreError> {
            self.inner.read(key).await
        }

        async fn write(
            &self,
            key: &Key,
            record: &BlockRecord,
            ttl: Duration,
        ) -> Result<(), StoreError> {
            self.ttls.lock().unwrap().push(ttl);
            self.inner.write(key, record, ttl).await
        }

        async fn reset(&self, key: &Key) -> Result<(), StoreError> {
            self.inner.reset(key).await
        }

        async fn reset_all_for_operation(
            &self,
            operation: &str,
        ) -> Result<Vec<String>, StoreError> {
            self.inner.reset_all_for_operation(operation).await
        }
    }

    #[tokio::test]
    async fn every_write_uses_the_longest_duration_as_ttl() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let spy = Arc::new(TtlSpy {
            inner: MemoryStore::with_clock(clock.clone()),
            ttls: Mutex::new(Vec::new()),
        });
        let limiter = RateLimiter::new(
            spy.clone(),
            EscalationPolicy::new(vec![15, 30, 60]).unwrap(),
            clock,
        );

        for _ in 0..4 {
            limiter.record_failure(&key()).await.unwrap();
        }

        let ttls = spy.ttls.lock().unwrap();
        assert_eq!(ttls.len(), 4);
        assert!(ttls.iter().all(|ttl| *ttl == Duration::from_secs(60)));
    }

    /// Store that fails every call, for outage behaviour.
    struct DownStore;

    #[async_trait]
    impl BlockStore for DownStore {
        async fn read(&self, _key: &Key) -> Result<BlockRecord, StoreError> {
            Err(StoreError::Unavailable(anyhow::anyhow!("connection refused")))
        }

        async fn write(
            &self,
            _key: &Key,
            _record: &BlockRecord,
            _ttl: Duration,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable(anyhow::anyhow!("connection refused")))
        }

        async fn reset(&self, _key: &Key) -> Result<(), StoreError> {
            Err(StoreError::Unavailable(anyhow::anyhow!("connection refused")))
        }

        async fn reset_all_for_operation(
            &self,
            _operation: &str,
        ) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable(anyhow::anyhow!("connection refused")))
        }
    }

    #[tokio::test]
    async fn store_outage_surfaces_unmodified() {
        // Scenario D: the limiter never converts an outage into "allowed".
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let limiter = RateLimiter::new(
            Arc::new(DownStore),
            EscalationPolicy::new(vec![15]).unwrap(),
            clock,
        );

        assert!(matches!(
            limiter.check(&key()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            limiter.record_failure(&key()).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
