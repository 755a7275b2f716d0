use axum::extract::Query;
use axum::extract::State;
use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::account::ports::IdentityServicePort;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::clear_oauth_state_cookie;
use crate::inbound::http::session::oauth_state_cookie;
use crate::inbound::http::session::session_cookie;
use crate::inbound::http::session::OAUTH_STATE_COOKIE;

/// Kick off the federated flow: redirect to the provider's consent screen
/// with a CSRF state token pinned in a short-lived cookie.
pub async fn google_redirect<IS: IdentityServicePort>(
    State(state): State<AppState<IS>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let (authorize_url, csrf_state) = state.identity_provider.authorize_url();

    let jar = jar.add(oauth_state_cookie(
        csrf_state,
        state.session.cookie_secure,
    ));

    (jar, Redirect::temporary(&authorize_url))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Provider callback. Every outcome is a redirect back into the client app:
/// the protected landing route with the session cookie set, or the login
/// route on any failure. Failure detail goes to the logs, never the query
/// string.
pub async fn google_callback<IS: IdentityServicePort>(
    State(state): State<AppState<IS>>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> (CookieJar, Redirect) {
    let stored_state = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_string());

    // The state cookie is single use regardless of outcome.
    let jar = jar.add(clear_oauth_state_cookie(state.session.cookie_secure));

    match complete_callback(&state, stored_state, query).await {
        Ok(token) => {
            let jar = jar.add(session_cookie(token, state.session.cookie_secure));
            (jar, Redirect::to(&state.session.success_redirect))
        }
        Err(reason) => {
            tracing::warn!(reason = %reason, "Federated sign-in failed");
            (jar, Redirect::to(&state.session.failure_redirect))
        }
    }
}

async fn complete_callback<IS: IdentityServicePort>(
    state: &AppState<IS>,
    stored_state: Option<String>,
    query: CallbackQuery,
) -> Result<String, String> {
    if let Some(error) = query.error {
        return Err(format!("provider returned error: {}", error));
    }

    let code = query.code.ok_or("callback missing authorization code")?;
    let returned_state = query.state.ok_or("callback missing state")?;
    let stored_state = stored_state.ok_or("state cookie missing")?;

    if returned_state != stored_state {
        return Err("state mismatch".to_string());
    }

    let identity = state
        .identity_provider
        .resolve(&code)
        .await
        .map_err(|e| format!("identity resolution failed: {}", e))?;

    let account = state
        .identity_service
        .federated_sign_in(identity)
        .await
        .map_err(|e| format!("account resolution failed: {}", e))?;

    state
        .token_issuer
        .issue(&account.id.to_string())
        .map_err(|e| format!("token issuance failed: {}", e))
}
