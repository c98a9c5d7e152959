//! Shared handler state and guard configuration.

use std::sync::Arc;

use crate::bruteforce::RateLimiter;

use super::verifier::CredentialVerifier;

/// What to do when the block store cannot be reached.
///
/// This is an explicit configuration choice, never inferred from a missing
/// connection string. Fail-closed rejects attempts during an outage
/// (safer against abuse, can lock out legitimate users); fail-open lets
/// them through unprotected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutagePolicy {
    #[default]
    FailClosed,
    FailOpen,
}

/// Per-operation protection switches and the outage policy.
#[derive(Clone, Copy, Debug)]
pub struct GuardConfig {
    login_protection: bool,
    registration_protection: bool,
    outage_policy: OutagePolicy,
}

impl GuardConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            login_protection: true,
            registration_protection: true,
            outage_policy: OutagePolicy::FailClosed,
        }
    }

    #[must_use]
    pub fn with_login_protection(mut self, enabled: bool) -> Self {
        self.login_protection = enabled;
        self
    }

    #[must_use]
    pub fn with_registration_protection(mut self, enabled: bool) -> Self {
        self.registration_protection = enabled;
        self
    }

    #[must_use]
    pub fn with_outage_policy(mut self, policy: OutagePolicy) -> Self {
        self.outage_policy = policy;
        self
    }

    #[must_use]
    pub fn login_protection(&self) -> bool {
        self.login_protection
    }

    #[must_use]
    pub fn registration_protection(&self) -> bool {
        self.registration_protection
    }

    #[must_use]
    pub fn outage_policy(&self) -> OutagePolicy {
        self.outage_policy
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the handlers need, shared via `Extension<Arc<AppState>>`.
pub struct AppState {
    limiter: RateLimiter,
    verifier: Arc<dyn CredentialVerifier>,
    config: GuardConfig,
}

impl AppState {
    #[must_use]
    pub fn new(
        limiter: RateLimiter,
        verifier: Arc<dyn CredentialVerifier>,
        config: GuardConfig,
    ) -> Self {
        Self {
            limiter,
            verifier,
            config,
        }
    }

    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn verifier(&self) -> &dyn CredentialVerifier {
        self.verifier.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_protective() {
        let config = GuardConfig::default();
        assert!(config.login_protection());
        assert!(config.registration_protection());
        assert_eq!(config.outage_policy(), OutagePolicy::FailClosed);
    }

    #[test]
    fn builders_override_defaults() {
        let config = GuardConfig::new()
            .with_login_protection(false)
            .with_outage_policy(OutagePolicy::FailOpen);
        assert!(!config.login_protection());
        assert!(config.registration_protection());
        assert_eq!(config.outage_policy(), OutagePolicy::FailOpen);
    }
}
