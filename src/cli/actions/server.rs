use crate::bari::{self, AppState, GuardConfig, UpstreamVerifier};
use crate::bruteforce::{EscalationPolicy, RateLimiter, RedisStore, SystemClock};
use crate::cli::actions::Action;
use anyhow::{Context, Result};
use std::sync::Arc;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            redis_url,
            auth_url,
            durations,
            login_protection,
            registration_protection,
            outage_policy,
        } => {
            // Validate eagerly; a bad configuration must not survive startup.
            Url::parse(&redis_url).context("Invalid redis URL")?;
            let policy = EscalationPolicy::new(durations).context("Invalid block durations")?;

            let store = RedisStore::connect(&redis_url).await?;
            let limiter = RateLimiter::new(Arc::new(store), policy, Arc::new(SystemClock));

            let verifier = UpstreamVerifier::new(auth_url)?;
            let config = GuardConfig::new()
                .with_login_protection(login_protection)
                .with_registration_protection(registration_protection)
                .with_outage_policy(outage_policy);

            let state = Arc::new(AppState::new(limiter, Arc::new(verifier), config));

            bari::new(port, state).await?;
        }
    }

    Ok(())
}
