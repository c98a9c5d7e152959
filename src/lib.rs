//! # Bari (Adaptive brute-force protection)
//!
//! `bari` guards login and registration endpoints against brute forcing.
//! Repeated failures from the same client identifier (typically its public
//! IP, as reported by the reverse proxy) earn an escalating cool-down:
//! the first failure blocks for seconds, persistence earns hours. Block
//! records live in Redis with a TTL equal to the longest configured
//! duration, so state survives process restarts and cleans itself up once
//! a client gives up.
//!
//! ## Shape
//!
//! - [`bruteforce`] — the engine: escalation policy, block records, the
//!   store contract with its Redis and in-memory backends, and the
//!   [`bruteforce::RateLimiter`] orchestrator.
//! - [`bari`] — the HTTP surface: guarded `/v1/login` and `/v1/register`
//!   endpoints that delegate actual credential checking to a configured
//!   upstream service, plus administrative unblock routes.
//! - [`cli`] — clap command, logging setup, and server wiring.
//!
//! ## Decisions callers should know about
//!
//! - Being blocked is a decision, not an error: `check` returns a
//!   [`bruteforce::Verdict`], and handlers turn it into `429` with a
//!   `Retry-After` header.
//! - Store outages surface as [`bruteforce::StoreError`]; whether that
//!   fails open or closed is an explicit configuration switch
//!   (fail-closed by default), never inferred from a missing URL.
//! - `record_failure` is read-then-write, not atomic. Two racing failures
//!   for one key may undercount by one; the escalation curve still trends
//!   upward, which is all an abuse deterrent needs.

pub mod bari;
pub mod bruteforce;
pub mod cli;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
