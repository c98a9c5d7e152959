//! Adaptive brute-force protection.
//!
//! Tracks failed attempts at a sensitive operation (login, registration)
//! per client identifier and blocks further attempts for an escalating
//! cool-down: each consecutive failure advances to the next configured
//! duration, clamped at the longest. Records live in a TTL store (Redis
//! in production) and expire on their own once the client behaves.
//!
//! Typical flow inside a handler:
//!
//! ```text
//! check(key)          -> blocked? reject with Retry-After : proceed
//! <operation fails>   -> record_failure(key)
//! <operation succeeds or admin unblocks> -> reset(key)
//! ```

pub mod clock;
pub mod limiter;
pub mod policy;
pub mod record;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{Penalty, RateLimiter, Verdict};
pub use policy::{EscalationPolicy, PolicyError, DEFAULT_DURATIONS};
pub use record::BlockRecord;
pub use store::{BlockStore, Key, MemoryStore, RedisStore, StoreError};
