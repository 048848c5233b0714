use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

/// Request a password-reset token for an email address.
///
/// The response is the same generic success whether or not the email maps to
/// an account, so this endpoint cannot be used to enumerate accounts. The
/// token only appears in the body when the notifier could not deliver it;
/// with delivery disabled in configuration the body is the only channel.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequestBody>,
) -> Result<ApiSuccess<ResetPasswordResponseData>, ApiError> {
    let issued = state
        .account_service
        .request_password_reset(body.email)
        .await
        .map_err(ApiError::from)?;

    let token = match issued {
        Some(issued) if !issued.delivered => Some(issued.token),
        _ => None,
    };

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ResetPasswordResponseData {
            message: "success".to_string(),
            token,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequestBody {
    email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetPasswordResponseData {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
