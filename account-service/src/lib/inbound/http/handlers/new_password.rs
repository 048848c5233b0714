use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

/// Redeem a reset token and set a new password.
pub async fn new_password(
    State(state): State<AppState>,
    Json(body): Json<NewPasswordRequestBody>,
) -> Result<ApiSuccess<NewPasswordResponseData>, ApiError> {
    state
        .account_service
        .apply_new_password(&body.token, body.password)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        NewPasswordResponseData {
            message: "success".to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPasswordRequestBody {
    token: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPasswordResponseData {
    pub message: String,
}
