//! Registration endpoint, guarded the same way as login.

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

use super::{check_block, escalate, extract_client_ip, lift, OP_REGISTRATION};

#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let request: RegisterRequest = match payload {
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

    let protected = state.config().registration_protection();
    let key = Key::new(OP_REGISTRATION, &client_id);

    if protected {
        if let Some(response) = check_block(&state, &key).await {
            return response;
        }
    }

    match state
        .verifier()
        .verify_registration(&request.email, &request.password)
        .await
    {
        VerifyOutcome::Accepted => {
            if protected {
                lift(&state, &key).await;
            }
            (StatusCode::CREATED, Json(json!({ "status": "created" }))).into_response()
        }
        VerifyOutcome::Rejected => {
            debug!("Registration rejected for client {client_id}");
            let wait_secs = if protected {
                escalate(&state, &key).await
            } else {
                None
            };
            let mut body = json!({ "error": "Registration rejected" });
            if let Some(wait_secs) = wait_secs {
                body["retry_after"] = json!(wait_secs);
            }
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
        VerifyOutcome::Unavailable => (
            StatusCode::BAD_GATEWAY,
            "Registration service unavailable".to_string(),
        )
            .into_response(),
    }
}
