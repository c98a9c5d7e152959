//! Administrative unblock endpoints.
//!
//! These sit behind the deployment's own operator authentication (reverse
//! proxy / internal network); bari does not gate them itself.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::bari::state::AppState;
use crate::bruteforce::Key;

#[derive(Serialize, Deserialize, Debug)]
pub struct UnblockRequest {
    pub operation: String,
    pub client_id: String,
}

/// Lift the block for one `(operation, client_id)` pair, e.g. to allow
/// immediate login after a password reset.
pub async fn unblock(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<UnblockRequest>>,
) -> Response {
    let request: UnblockRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let key = Key::new(&request.operation, &request.client_id);
    match state.limiter().reset(&key).await {
        Ok(()) => {
            info!("Unblocked {key}");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => {
            error!("Failed to unblock {key}: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Block store unavailable".to_string(),
            )
                .into_response()
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UnblockOperationRequest {
    pub operation: String,
}

/// Bulk-clear every block record for one operation. Best effort and
/// potentially expensive on large keyspaces; meant for operational
/// recovery.
pub async fn unblock_operation(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<UnblockOperationRequest>>,
) -> Response {
    let request: UnblockOperationRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match state
        .limiter()
        .reset_all_for_operation(&request.operation)
        .await
    {
        Ok(removed) => {
            info!(
                "Unblocked {} key(s) for operation {}",
                removed.len(),
                request.operation
            );
            (StatusCode::OK, Json(json!({ "removed": removed }))).into_response()
        }
        Err(err) => {
            error!(
                "Failed to unblock operation {}: {err}",
                request.operation
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Block store unavailable".to_string(),
            )
                .into_response()
        }
    }
}
