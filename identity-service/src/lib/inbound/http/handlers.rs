use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::account::errors::IdentityError;
use crate::account::models::Account;

pub mod google;
pub mod login;
pub mod logout;
pub mod profile;
pub mod register;
pub mod resend_verification;
pub mod verify_email;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// API failure with a stable machine reason per taxonomy entry.
///
/// Internal detail (store errors, relay errors) is logged, never returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Validation(String),
    Conflict(String),
    InvalidOrExpired(String),
    NotFound(String),
    InvalidCredentials(String),
    EmailNotVerified(String),
    Unauthenticated(String),
    UpstreamFailure(String),
    InternalServerError(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The external contract maps duplicate registration and the uniform
        // lookup failures onto 400, and everything credential-shaped onto
        // 401.
        let (status, reason, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, "conflict", msg),
            ApiError::InvalidOrExpired(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_or_expired_code", msg)
            }
            ApiError::NotFound(msg) => (StatusCode::BAD_REQUEST, "not_found", msg),
            ApiError::InvalidCredentials(msg) => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", msg)
            }
            ApiError::EmailNotVerified(msg) => {
                (StatusCode::UNAUTHORIZED, "email_not_verified", msg)
            }
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, "unauthenticated", msg),
            ApiError::UpstreamFailure(detail) => {
                tracing::error!(detail = %detail, "Upstream collaborator failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_failure",
                    "An upstream service is unavailable".to_string(),
                )
            }
            ApiError::InternalServerError(detail) => {
                tracing::error!(detail = %detail, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ApiResponseBody::new_error(status, reason, message))).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidAccountId(_) | IdentityError::InvalidEmail(_) => {
                ApiError::Validation(err.to_string())
            }
            IdentityError::EmailAlreadyExists | IdentityError::ProviderAlreadyLinked => {
                ApiError::Conflict(err.to_string())
            }
            IdentityError::InvalidOrExpiredCode => ApiError::InvalidOrExpired(err.to_string()),
            IdentityError::InvalidCredentials => ApiError::InvalidCredentials(err.to_string()),
            IdentityError::EmailNotVerified => ApiError::EmailNotVerified(err.to_string()),
            IdentityError::NotFound => ApiError::NotFound(err.to_string()),
            IdentityError::EmailDispatchFailed(detail) => ApiError::UpstreamFailure(detail),
            IdentityError::Password(_)
            | IdentityError::DatabaseError(_)
            | IdentityError::Unknown(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, reason: &'static str, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { reason, message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub reason: &'static str,
    pub message: String,
}

/// Public account summary. The password hash and any pending verification
/// code are structurally absent, not merely skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountData {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl From<&Account> for AccountData {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            name: account.name.clone(),
            email: account.email.as_str().to_string(),
            photo_url: account.photo_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}
