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

pub async fn login<IS: IdentityServicePort>(
    State(state): State<AppState<IS>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, ApiSuccess<AccountData>), ApiError> {
    // A malformed email is just a failed credential; same response either
    // way.
    let email = EmailAddress::new(&body.email)
        .map_err(|_| ApiError::InvalidCredentials("Invalid email or password".to_string()))?;

    let account = state.identity_service.login(&email, &body.password).await?;

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
pub struct LoginRequest {
    email: String,
    password: String,
}
