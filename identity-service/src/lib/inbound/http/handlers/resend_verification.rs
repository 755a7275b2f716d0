use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::account::models::EmailAddress;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::router::AppState;

pub async fn resend_verification<IS: IdentityServicePort>(
    State(state): State<AppState<IS>>,
    Json(body): Json<ResendVerificationRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    // Uniform with "no unverified account": a malformed email matches
    // nothing.
    let email = EmailAddress::new(&body.email)
        .map_err(|_| ApiError::NotFound("Account not found".to_string()))?;

    state
        .identity_service
        .resend_verification(&email)
        .await
        .map_err(ApiError::from)
        .map(|_| {
            ApiSuccess::new(
                StatusCode::OK,
                MessageData {
                    message: "A new verification code has been sent to your email.".to_string(),
                },
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResendVerificationRequest {
    email: String,
}
