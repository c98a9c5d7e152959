//! Login endpoint: the brute-force gate in front of the credential
//! verifier.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::bari::state::AppState;
use crate::bari::verifier::VerifyOutcome;
use crate::bruteforce::Key;

use super::{check_block, escalate, extract_client_ip, lift, OP_LOGIN};

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let Some(client_id) = extract_client_ip(&headers) else {
        return (
            StatusCode::BAD_REQUEST,
            "Missing client address".to_string(),
        )
            .into_response();
    };

    let protected = state.config().login_protection();
    let key = Key::new(OP_LOGIN, &client_id);

    if protected {
        if let Some(response) = check_block(&state, &key).await {
            return response;
        }
    }

    match state
        .verifier()
        .verify_login(&request.username, &request.password)
        .await
    {
        VerifyOutcome::Accepted => {
            if protected {
                lift(&state, &key).await;
            }
            (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
        }
        VerifyOutcome::Rejected => {
            debug!("Login rejected for client {client_id}");
            let wait_secs = if protected {
                escalate(&state, &key).await
            } else {
                None
            };
            let mut body = json!({ "error": "Invalid credentials" });
            if let Some(wait_secs) = wait_secs {
                body["retry_after"] = json!(wait_secs);
            }
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
        VerifyOutcome::Unavailable => (
            StatusCode::BAD_GATEWAY,
            "Credential service unavailable".to_string(),
        )
            .into_response(),
    }
}
