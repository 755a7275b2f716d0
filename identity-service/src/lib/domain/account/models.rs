use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::account::errors::AccountIdError;
use crate::account::errors::EmailError;

/// Account aggregate entity.
///
/// One record per person, regardless of how they signed up. `auth_provider`
/// records the original creation path; a local account may acquire a
/// `provider_id` later through federated linking.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: EmailAddress,
    pub name: String,
    /// Salted Argon2id hash; present only for local-provider accounts.
    pub password_hash: Option<String>,
    /// External identity-provider subject id; unique when present.
    pub provider_id: Option<String>,
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
    pub auth_provider: AuthProvider,
    pub is_email_verified: bool,
    /// Present only while a verification window is open. Never exposed in
    /// any read path.
    pub verification: Option<VerificationCode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Generate a new random account ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an account ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, AccountIdError> {
        Uuid::parse_str(s)
            .map(AccountId)
            .map_err(|e| AccountIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates format using an RFC 5322 compliant parser and lowercases the
/// address, so uniqueness is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated, case-normalized email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: impl AsRef<str>) -> Result<Self, EmailError> {
        let normalized = email.as_ref().trim().to_lowercase();
        email_address::EmailAddress::from_str(&normalized)
            .map(|_| EmailAddress(normalized))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How an account was originally created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProvider {
    Local,
    Federated,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Federated => "federated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(AuthProvider::Local),
            "federated" => Some(AuthProvider::Federated),
            _ => None,
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-time email verification code.
///
/// Six numeric digits, valid for ten minutes from issuance. Exactly one code
/// is live per account: regeneration replaces the previous code outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationCode {
    pub const CODE_LENGTH: usize = 6;
    const VALIDITY_MINUTES: i64 = 10;

    /// Generate a fresh code expiring [`VALIDITY_MINUTES`] after `now`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let code = rand::thread_rng().gen_range(0..1_000_000u32);

        Self {
            code: format!("{:06}", code),
            expires_at: now + Duration::minutes(Self::VALIDITY_MINUTES),
        }
    }

    /// Whether `submitted` matches this code and the code is still live.
    ///
    /// Comparison is exact-string; expiry is strict, so a code checked at
    /// exactly `expires_at` is already expired.
    pub fn accepts(&self, submitted: &str, now: DateTime<Utc>) -> bool {
        self.code == submitted && now < self.expires_at
    }
}

/// Command to register a new local-provider account with validated fields.
#[derive(Debug)]
pub struct RegisterCommand {
    pub name: String,
    pub email: EmailAddress,
    pub password: String,
    pub phone_number: Option<String>,
}

/// Identity assertion received from the external provider after a successful
/// OAuth exchange. The email is trusted as verified because the provider
/// attests it.
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    pub provider_id: String,
    pub email: EmailAddress,
    pub name: String,
    pub photo_url: Option<String>,
}
