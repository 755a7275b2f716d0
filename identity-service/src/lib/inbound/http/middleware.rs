use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use super::handlers::ApiError;
use super::session::SESSION_COOKIE;
use crate::account::errors::IdentityError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::router::AppState;

/// Extension type carrying the authenticated account into handlers.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

/// Middleware gating protected routes on the session cookie.
///
/// The token is read from the cookie only, never from a header. Verification
/// and account resolution both happen before any handler logic; a token
/// whose subject no longer resolves to an account is rejected the same way
/// as a missing or invalid token.
pub async fn authenticate<IS: IdentityServicePort>(
    State(state): State<AppState<IS>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let jar = CookieJar::from_headers(req.headers());

    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| unauthenticated("Missing session cookie"))?;

    let subject = state.token_issuer.verify(&token).map_err(|e| {
        tracing::warn!(error = %e, "Session token rejected");
        unauthenticated("Invalid or expired session")
    })?;

    let account_id = AccountId::from_string(&subject)
        .map_err(|_| unauthenticated("Invalid or expired session"))?;

    let account = state
        .identity_service
        .get_account(&account_id)
        .await
        .map_err(|e| match e {
            // Deleted between issuance and use: not-found, not a crash.
            IdentityError::NotFound => unauthenticated("Invalid or expired session"),
            other => ApiError::from(other).into_response(),
        })?;

    req.extensions_mut().insert(CurrentAccount(account));

    Ok(next.run(req).await)
}

fn unauthenticated(message: &str) -> Response {
    ApiError::Unauthenticated(message.to_string()).into_response()
}
