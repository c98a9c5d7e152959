//! The per-client abuse record.

use chrono::{DateTime, Utc};

/// State stored for one `(operation, client)` pair.
///
/// A client that has never failed (or whose record expired) has the zero
/// value: `attempts == 0` and no `blocked_until`. The two fields move
/// together; `blocked_until` is only ever `Some` while `attempts > 0`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockRecord {
    /// Consecutive failures recorded since the last reset.
    pub attempts: u32,
    /// Instant after which the client may try again.
    pub blocked_until: Option<DateTime<Utc>>,
}

impl BlockRecord {
    /// The record for a client with no failures on file.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Whether the record is currently blocking.
    ///
    /// A block whose deadline equals `now` has just expired and no longer
    /// blocks.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| until > now)
    }

    /// Whole seconds the client must still wait, rounded up.
    ///
    /// Zero when the record is not blocking.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        let Some(until) = self.blocked_until else {
            return 0;
        };
        let millis = (until - now).num_milliseconds();
        if millis <= 0 {
            return 0;
        }
        millis.unsigned_abs().div_ceil(1000)
    }
}
