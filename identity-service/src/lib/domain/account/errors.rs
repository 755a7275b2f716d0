use thiserror::Error;

/// Error for AccountId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for outbound email dispatch
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Email dispatch failed: {0}")]
    DispatchFailed(String),
}

/// Error for the external identity provider exchange
#[derive(Debug, Clone, Error)]
pub enum IdentityProviderError {
    #[error("Provider configuration invalid: {0}")]
    Configuration(String),

    #[error("Authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Fetching provider user info failed: {0}")]
    UserInfoFailed(String),

    #[error("Provider did not assert a verified email")]
    UnverifiedEmail,

    #[error("Provider identity is unusable: {0}")]
    InvalidIdentity(String),
}

/// Top-level error for all identity operations.
///
/// The credential-probing variants (`InvalidOrExpiredCode`,
/// `InvalidCredentials`, `NotFound`) are deliberately payload-free so callers
/// cannot distinguish which precondition failed.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid account ID: {0}")]
    InvalidAccountId(#[from] AccountIdError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    // Domain-level errors
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Provider identity already linked to another account")]
    ProviderAlreadyLinked,

    /// Wrong code, expired code, unknown email, or no verification pending.
    /// One variant for all four, to avoid leaking account state.
    #[error("Invalid or expired verification code")]
    InvalidOrExpiredCode,

    /// Unknown email, missing password hash, or hash mismatch.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Safe to disclose: only reachable once the password has matched.
    #[error("Email not verified")]
    EmailNotVerified,

    /// Covers "no such account" and "nothing pending for this account"
    /// identically.
    #[error("Account not found")]
    NotFound,

    // Infrastructure errors
    #[error("Verification email could not be dispatched: {0}")]
    EmailDispatchFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for IdentityError {
    fn from(err: anyhow::Error) -> Self {
        IdentityError::Unknown(err.to_string())
    }
}
