//! Escalation policy: failure count in, block duration out. Pure, no I/O.

use chrono::{DateTime, Duration, Utc};

/// Default block durations in seconds, shortest first.
///
/// 15s, 2m, 9m, 30m, 2h, 4h, 8h, 16h, 24h.
pub const DEFAULT_DURATIONS: [u64; 9] = [
    15,
    2 * 60,
    9 * 60,
    30 * 60,
    2 * 60 * 60,
    4 * 60 * 60,
    8 * 60 * 60,
    16 * 60 * 60,
    24 * 60 * 60,
];

/// Rejected duration tables. Raised once, at startup.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("block durations must not be empty")]
    Empty,
    #[error("block duration at index {0} must be positive")]
    Zero(usize),
    #[error("block durations must be non-decreasing: {found}s after {previous}s at index {index}")]
    Decreasing {
        index: usize,
        previous: u64,
        found: u64,
    },
}

/// An ordered table of block durations.
///
/// The first failure blocks for the first entry, the second for the second,
/// and so on; once the table runs out every further failure repeats the
/// last (longest) entry. The table is validated eagerly so a bad
/// configuration fails at startup rather than at the first failed login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EscalationPolicy {
    durations: Vec<u64>,
}

impl EscalationPolicy {
    /// Validate and build a policy from `durations` (seconds).
    ///
    /// # Errors
    /// Returns [`PolicyError`] if the table is empty, contains a zero, or
    /// decreases anywhere.
    pub fn new(durations: Vec<u64>) -> Result<Self, PolicyError> {
        if durations.is_empty() {
            return Err(PolicyError::Empty);
        }
        for (index, &seconds) in durations.iter().enumerate() {
            if seconds == 0 {
                return Err(PolicyError::Zero(index));
            }
            if index > 0 && seconds < durations[index - 1] {
                return Err(PolicyError::Decreasing {
                    index,
                    previous: durations[index - 1],
                    found: seconds,
                });
            }
        }
        Ok(Self { durations })
    }

    /// Duration in seconds for the failure numbered `attempts` (1-based),
    /// clamped to the last entry.
    #[must_use]
    pub fn duration_secs(&self, attempts: u32) -> u64 {
        let index = (attempts.max(1) as usize - 1).min(self.durations.len() - 1);
        self.durations[index]
    }

    /// Compute the next block deadline for the failure numbered `attempts`.
    ///
    /// Returns `(blocked_until, duration_seconds)`.
    #[must_use]
    pub fn next_block(&self, now: DateTime<Utc>, attempts: u32) -> (DateTime<Utc>, u64) {
        let seconds = self.duration_secs(attempts);
        (now + Duration::seconds(seconds as i64), seconds)
    }

    /// The longest configured duration; every store write uses this as its
    /// TTL so records expire on the same schedule regardless of which step
    /// they are on.
    #[must_use]
    pub fn max_duration_secs(&self) -> u64 {
        // Validated non-decreasing, so the last entry is the longest.
        self.durations[self.durations.len() - 1]
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            durations: DEFAULT_DURATIONS.to_vec(),
        }
    }
}
