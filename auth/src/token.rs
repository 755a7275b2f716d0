use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Session token validity window: one day.
pub const TOKEN_VALIDITY_SECONDS: i64 = 24 * 60 * 60;

/// Error for token operations.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Claims carried by a session token.
///
/// The payload is intentionally minimal: the subject and the time bounds.
/// Nothing else about the account is trusted from the token; the current
/// account state is always loaded from the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account identifier)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issues and verifies signed, time-bounded session tokens.
///
/// Uses HS256 with a server-held secret. Verification is pure computation
/// and never blocks.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validity_seconds: i64,
}

impl TokenIssuer {
    /// Create an issuer with the default one-day validity window.
    ///
    /// The secret should be at least 256 bits (32 bytes) for HS256 and must
    /// never be compiled into the binary; it comes from configuration.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_validity(secret, TOKEN_VALIDITY_SECONDS)
    }

    /// Create an issuer with an explicit validity window in seconds.
    pub fn with_validity(secret: &[u8], validity_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            validity_seconds,
        }
    }

    /// Seconds a freshly issued token remains valid.
    pub fn validity_seconds(&self) -> i64 {
        self.validity_seconds
    }

    /// Sign a token for the given subject.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.validity_seconds)).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify a token and return its subject.
    ///
    /// Fails on a bad signature, a malformed payload, or expiry. Expiry is
    /// strict: no clock leeway is allowed.
    ///
    /// # Errors
    /// * `Expired` - Token is past its expiration time
    /// * `Invalid` - Signature or payload is invalid
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid(e.to_string()),
                }
            })?;

        Ok(token_data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    #[test]
    fn test_issue_and_verify_round_trip() {
        let issuer = TokenIssuer::new(SECRET);

        let token = issuer.issue("account-123").expect("Failed to issue token");
        let subject = issuer.verify(&token).expect("Failed to verify token");

        assert_eq!(subject, "account-123");
    }

    #[test]
    fn test_token_carries_validity_window() {
        let issuer = TokenIssuer::new(SECRET);
        let token = issuer.issue("account-123").expect("Failed to issue token");

        // Decode without strict validation to inspect the claims.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let data = decode::<Claims>(&token, &DecodingKey::from_secret(SECRET), &validation)
            .expect("Failed to decode token");

        assert_eq!(data.claims.exp - data.claims.iat, TOKEN_VALIDITY_SECONDS);
    }

    #[test]
    fn test_verify_with_wrong_secret_fails() {
        let issuer = TokenIssuer::new(SECRET);
        let other = TokenIssuer::new(b"another_secret_at_least_32_bytes!!");

        let token = issuer.issue("account-123").expect("Failed to issue token");

        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_verify_expired_token_fails() {
        // Negative validity puts the expiration in the past at issue time.
        let issuer = TokenIssuer::with_validity(SECRET, -10);

        let token = issuer.issue("account-123").expect("Failed to issue token");

        assert!(matches!(issuer.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_verify_garbage_fails() {
        let issuer = TokenIssuer::new(SECRET);
        assert!(matches!(
            issuer.verify("not.a.token"),
            Err(TokenError::Invalid(_))
        ));
    }
}
