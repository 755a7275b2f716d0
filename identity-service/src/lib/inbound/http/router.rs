use std::sync::Arc;
use std::time::Duration;

use auth::TokenIssuer;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::google::google_callback;
use super::handlers::google::google_redirect;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::profile::profile;
use super::handlers::register::register;
use super::handlers::resend_verification::resend_verification;
use super::handlers::verify_email::verify_email;
use super::middleware::authenticate as auth_middleware;
use crate::account::ports::IdentityProvider;
use crate::account::ports::IdentityServicePort;

/// Client-facing session behavior, fixed at startup.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Mark cookies `Secure`; off only in local development.
    pub cookie_secure: bool,
    /// Client route to land on after a successful federated sign-in.
    pub success_redirect: String,
    /// Client route to land on when the federated flow fails.
    pub failure_redirect: String,
}

pub struct AppState<IS: IdentityServicePort> {
    pub identity_service: Arc<IS>,
    pub token_issuer: Arc<TokenIssuer>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub session: SessionSettings,
}

// Manual impl: `#[derive(Clone)]` would demand `IS: Clone`.
impl<IS: IdentityServicePort> Clone for AppState<IS> {
    fn clone(&self) -> Self {
        Self {
            identity_service: Arc::clone(&self.identity_service),
            token_issuer: Arc::clone(&self.token_issuer),
            identity_provider: Arc::clone(&self.identity_provider),
            session: self.session.clone(),
        }
    }
}

pub fn create_router<IS: IdentityServicePort>(
    identity_service: Arc<IS>,
    token_issuer: Arc<TokenIssuer>,
    identity_provider: Arc<dyn IdentityProvider>,
    session: SessionSettings,
) -> Router {
    let state = AppState {
        identity_service,
        token_issuer,
        identity_provider,
        session,
    };

    let public_routes = Router::new()
        .route("/register", post(register::<IS>))
        .route("/verify-email", post(verify_email::<IS>))
        .route("/resend-verification", post(resend_verification::<IS>))
        .route("/login", post(login::<IS>))
        .route("/google", get(google_redirect::<IS>))
        .route("/google/callback", get(google_callback::<IS>))
        .route("/logout", post(logout::<IS>));

    let protected_routes = Router::new()
        .route("/profile", get(profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<IS>,
        ));

    // Headers stay out of the span: the session cookie is a bearer
    // credential and must never reach the logs.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
