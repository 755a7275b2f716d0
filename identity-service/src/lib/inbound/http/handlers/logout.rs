use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;

use super::ApiSuccess;
use super::MessageData;
use crate::account::ports::IdentityServicePort;
use crate::inbound::http::router::AppState;
use crate::inbound::http::session::clear_session_cookie;

/// Stateless logout: expire the client-held cookie. The token inside it
/// stays valid until its natural expiry; nothing server-side tracks it.
pub async fn logout<IS: IdentityServicePort>(
    State(state): State<AppState<IS>>,
    jar: CookieJar,
) -> (CookieJar, ApiSuccess<MessageData>) {
    let jar = jar.add(clear_session_cookie(state.session.cookie_secure));

    (
        jar,
        ApiSuccess::new(
            StatusCode::OK,
            MessageData {
                message: "Logged out".to_string(),
            },
        ),
    )
}
