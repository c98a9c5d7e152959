//! The external collaborator that actually judges credentials.
//!
//! `bari` never inspects passwords or registration payloads itself; it
//! forwards them to a configured upstream service and only cares about
//! three outcomes: accepted, rejected (attributable to the client, so it
//! counts against the block record), or unavailable (upstream trouble,
//! never counted).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::error;

use crate::APP_USER_AGENT;

/// Judgement of one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    Accepted,
    Rejected,
    Unavailable,
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify_login(&self, username: &str, password: &str) -> VerifyOutcome;
    async fn verify_registration(&self, email: &str, password: &str) -> VerifyOutcome;
}

/// Verifier that POSTs to an upstream HTTP service.
///
/// `POST {base}/login/verify` and `POST {base}/register/verify`; a 2xx
/// means accepted, 4xx means rejected, anything else (including transport
/// errors) is unavailable.
pub struct UpstreamVerifier {
    client: Client,
    base_url: String,
}

impl UpstreamVerifier {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> VerifyOutcome {
        let url = format!("{}{path}", self.base_url);
        match self.client.post(&url).json(&body).send().await {
            Ok(response) => match response.status() {
                status if status.is_success() => VerifyOutcome::Accepted,
                status if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS => {
                    VerifyOutcome::Rejected
                }
                status => {
                    error!("Unexpected verifier status from {url}: {status}");
                    VerifyOutcome::Unavailable
                }
            },
            Err(err) => {
                error!("Error reaching verifier at {url}: {err}");
                VerifyOutcome::Unavailable
            }
        }
    }
}

#[async_trait]
impl CredentialVerifier for UpstreamVerifier {
    async fn verify_login(&self, username: &str, password: &str) -> VerifyOutcome {
        self.post(
            "/login/verify",
            json!({ "username": username, "password": password }),
        )
        .await
    }

    async fn verify_registration(&self, email: &str, password: &str) -> VerifyOutcome {
        self.post(
            "/register/verify",
            json!({ "email": email, "password": password }),
        )
        .await
    }
}
