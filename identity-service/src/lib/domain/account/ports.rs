use async_trait::async_trait;

use crate::account::errors::IdentityError;
use crate::account::errors::IdentityProviderError;
use crate::account::errors::MailerError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::EmailAddress;
use crate::account::models::ProviderIdentity;
use crate::account::models::RegisterCommand;

/// Port for identity domain service operations.
#[async_trait]
pub trait IdentityServicePort: Send + Sync + 'static {
    /// Create a new local-provider account in the pending-verification state
    /// and dispatch a verification email.
    ///
    /// The account is persisted before the email is attempted: a dispatch
    /// failure surfaces as `EmailDispatchFailed` but does not undo the
    /// registration.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - An account with this email exists
    /// * `EmailDispatchFailed` - Account created, verification email failed
    /// * `DatabaseError` - Store operation failed
    async fn register(&self, command: RegisterCommand) -> Result<Account, IdentityError>;

    /// Confirm control of an email address with a one-time code.
    ///
    /// Succeeds iff the email resolves to an account holding an unexpired,
    /// exactly matching code. The code is consumed on success.
    ///
    /// # Errors
    /// * `InvalidOrExpiredCode` - Any precondition failed (uniform)
    /// * `DatabaseError` - Store operation failed
    async fn verify_email(
        &self,
        email: &EmailAddress,
        code: &str,
    ) -> Result<Account, IdentityError>;

    /// Replace the live verification code with a fresh one and re-send it.
    /// The previous code becomes invalid immediately.
    ///
    /// # Errors
    /// * `NotFound` - No account, already verified, or not local-provider
    ///   (uniform)
    /// * `EmailDispatchFailed` - Code replaced, email failed
    /// * `DatabaseError` - Store operation failed
    async fn resend_verification(&self, email: &EmailAddress) -> Result<(), IdentityError>;

    /// Authenticate a local-provider account by password.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, no hash, or mismatch (uniform)
    /// * `EmailNotVerified` - Password matched but email unverified
    /// * `DatabaseError` - Store operation failed
    async fn login(&self, email: &EmailAddress, password: &str) -> Result<Account, IdentityError>;

    /// Resolve a provider identity assertion to an account: already linked,
    /// linkable by email, or freshly created, in that order.
    ///
    /// # Errors
    /// * `ProviderAlreadyLinked` - Lost a linking race for this identity
    /// * `DatabaseError` - Store operation failed
    async fn federated_sign_in(
        &self,
        identity: ProviderIdentity,
    ) -> Result<Account, IdentityError>;

    /// Retrieve an account by identifier.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DatabaseError` - Store operation failed
    async fn get_account(&self, id: &AccountId) -> Result<Account, IdentityError>;
}

/// Persistence operations for the account aggregate.
///
/// Implementations must enforce uniqueness of `email` and `provider_id` at
/// the storage layer; concurrent creates for the same email must not both
/// succeed.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Persist a new account.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `ProviderAlreadyLinked` - Provider id is already claimed
    /// * `DatabaseError` - Store operation failed
    async fn create(&self, account: Account) -> Result<Account, IdentityError>;

    /// Retrieve an account by identifier (None if not found).
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, IdentityError>;

    /// Retrieve an account by case-normalized email (None if not found).
    async fn find_by_email(&self, email: &EmailAddress)
        -> Result<Option<Account>, IdentityError>;

    /// Retrieve an account by external provider subject id (None if not
    /// found).
    async fn find_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<Account>, IdentityError>;

    /// Persist changes to an existing account.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `EmailAlreadyExists` / `ProviderAlreadyLinked` - Unique constraint
    ///   violated
    /// * `DatabaseError` - Store operation failed
    async fn update(&self, account: Account) -> Result<Account, IdentityError>;
}

/// Outbound email dispatch. Delivery mechanics are a collaborator concern;
/// the service only hands over recipient, subject, and body.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(
        &self,
        to: &EmailAddress,
        subject: &str,
        body: &str,
    ) -> Result<(), MailerError>;
}

/// Gateway to the external identity provider (OAuth2 authorization-code
/// flow).
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Build the provider authorization URL plus the CSRF state token bound
    /// to it.
    fn authorize_url(&self) -> (String, String);

    /// Exchange an authorization code for the provider's identity assertion.
    async fn resolve(&self, code: &str) -> Result<ProviderIdentity, IdentityProviderError>;
}
