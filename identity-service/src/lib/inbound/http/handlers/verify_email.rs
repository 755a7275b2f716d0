use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::models::EmailAddress;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::session_cookie;

pub async fn verify_email<IS: IdentityServicePort>(
    State(state): State<AppState<IS>>,
    jar: CookieJar,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<(CookieJar, ApiSuccess<AccountData>), ApiError> {
    // A malformed email cannot match any stored code; keep the response
    // uniform with every other verification failure.
    let email = EmailAddress::new(&body.email)
        .map_err(|_| ApiError::InvalidOrExpired("Invalid or expired verification code".to_string()))?;

    let account = state
        .identity_service
        .verify_email(&email, &body.otp)
        .await?;

    let token = state
        .token_issuer
        .issue(&account.id.to_string())
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    let jar = jar.add(session_cookie(token, state.session.cookie_secure));

    Ok((
        jar,
        ApiSuccess::new(StatusCode::OK, AccountData::from(&account)),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifyEmailRequest {
    email: String,
    otp: String,
}
