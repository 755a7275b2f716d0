use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::SameSite;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Name of the short-lived cookie pinning the OAuth CSRF state.
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Validity of the OAuth state cookie, in seconds.
const OAUTH_STATE_MAX_AGE_SECONDS: i64 = 10 * 60;

/// Build the session cookie for a freshly issued token.
///
/// httpOnly and SameSite=Strict always; `secure` outside local development.
/// Max-Age matches the token validity, so the cookie and the token it
/// carries lapse together.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::seconds(auth::TOKEN_VALIDITY_SECONDS))
        .build()
}

/// Expire the session cookie immediately. Logout is exactly this; the token
/// itself is not server-side revocable.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Pin the CSRF state for an outgoing provider redirect.
///
/// SameSite=Lax, not Strict: the provider sends the user back with a
/// top-level cross-site navigation and the cookie must accompany it.
pub fn oauth_state_cookie(state: String, secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, state))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(OAUTH_STATE_MAX_AGE_SECONDS))
        .build()
}

/// Expire the OAuth state cookie; state tokens are single use.
pub fn clear_oauth_state_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("token-value".to_string(), true);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(auth::TOKEN_VALIDITY_SECONDS))
        );
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_clear_session_cookie_expires_immediately() {
        let cookie = clear_session_cookie(false);

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }

    #[test]
    fn test_oauth_state_cookie_is_lax() {
        let cookie = oauth_state_cookie("state-value".to_string(), false);

        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.http_only(), Some(true));
    }
}
