use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde_json::json;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type carrying the resolved identity for one request.
///
/// Scoped to the request; never cached across requests.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account: Account,
}

/// Request authorizer: validates the bearer session token and attaches the
/// resolved account to the request, or rejects with 401.
///
/// Per request: missing header, malformed scheme, failed verification, and a
/// directory miss for the token's subject all terminate here; only a resolved
/// identity reaches the downstream handler.
pub async fn authorize(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer_token(&req)?;

    let username = state.token_codec.verify_session(token).map_err(|e| {
        tracing::warn!(error = %e, "Session token rejected");
        unauthorized("invalid or expired token")
    })?;

    // A subject that no longer resolves is an authentication failure; a
    // directory failure is not, and must never look like one to the caller.
    let account = state
        .account_service
        .get_account_by_username(&username)
        .await
        .map_err(|e| match e {
            AccountError::NotFound(_) => {
                tracing::warn!(username = %username, "Token subject did not resolve to an account");
                unauthorized("unauthorized")
            }
            other => ApiError::InternalServerError(other.to_string()).into_response(),
        })?;

    req.extensions_mut().insert(AuthenticatedAccount { account });

    Ok(next.run(req).await)
}

fn extract_bearer_token(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("unauthorized"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| unauthorized("unauthorized"))?;

    if !auth_str.starts_with("Bearer ") {
        return Err(unauthorized("please provide a Bearer token"));
    }

    Ok(auth_str.trim_start_matches("Bearer "))
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": message
        })),
    )
        .into_response()
}
