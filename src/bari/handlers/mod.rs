pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::login;

pub mod register;
pub use self::register::register;

pub mod admin;
pub use self::admin::{unblock, unblock_operation};

// common functions for the handlers
use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::bari::state::{AppState, OutagePolicy};
use crate::bruteforce::{Key, StoreError, Verdict};

/// Operation names used to scope block records.
pub const OP_LOGIN: &str = "login";
pub const OP_REGISTRATION: &str = "registration";

/// Client address as reported by the reverse proxy.
pub(crate) fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Gate one protected operation: `None` means proceed, `Some(response)`
/// short-circuits with a 429 (blocked) or 503 (store down, fail-closed).
pub(crate) async fn check_block(state: &AppState, key: &Key) -> Option<Response> {
    match state.limiter().check(key).await {
        Ok(Verdict::Allowed { .. }) => None,
        Ok(Verdict::Blocked {
            record,
            retry_after_secs,
        }) => {
            let until = record
                .blocked_until
                .map(|until| until.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default();
            let body = format!(
                "Too many failed attempts. Retry after {retry_after_secs} seconds, blocked until {until}."
            );
            let mut headers = HeaderMap::new();
            if let Ok(value) = retry_after_secs.to_string().parse() {
                headers.insert("Retry-After", value);
            }
            Some((StatusCode::TOO_MANY_REQUESTS, headers, body).into_response())
        }
        Err(StoreError::Unavailable(cause)) => match state.config().outage_policy() {
            OutagePolicy::FailClosed => {
                error!("Block store unavailable, failing closed: {cause}");
                Some(
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Service temporarily unavailable".to_string(),
                    )
                        .into_response(),
                )
            }
            OutagePolicy::FailOpen => {
                warn!("Block store unavailable, failing open: {cause}");
                None
            }
        },
    }
}

/// Record a failure after the verifier rejected the attempt. Best effort:
/// the rejection response stands even when the store write fails.
pub(crate) async fn escalate(state: &AppState, key: &Key) -> Option<u64> {
    match state.limiter().record_failure(key).await {
        Ok(penalty) => Some(penalty.wait_secs),
        Err(err) => {
            error!("Failed to record {key} failure: {err}");
            None
        }
    }
}

/// Lift the block after a successful attempt. Best effort.
pub(crate) async fn lift(state: &AppState, key: &Key) {
    if let Err(err) = state.limiter().reset(key).await {
        warn!("Failed to reset block for {key}: {err}");
    }
}
