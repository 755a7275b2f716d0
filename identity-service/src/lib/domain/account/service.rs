use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::account::errors::IdentityError;
use crate::account::ports::AccountRepository;
use crate::account::ports::IdentityServicePort;
use crate::account::ports::Mailer;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::AuthProvider;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::ProviderIdentity;
use crate::domain::account::models::RegisterCommand;
use crate::domain::account::models::VerificationCode;

/// Domain service implementation for identity operations.
///
/// Concrete implementation of IdentityServicePort with dependency injection.
/// Owns the local registration state machine and the federated resolution
/// order; token minting stays with the HTTP layer.
pub struct IdentityService<R, M>
where
    R: AccountRepository,
    M: Mailer,
{
    repository: Arc<R>,
    mailer: Arc<M>,
    password_hasher: auth::PasswordHasher,
}

impl<R, M> IdentityService<R, M>
where
    R: AccountRepository,
    M: Mailer,
{
    pub fn new(repository: Arc<R>, mailer: Arc<M>) -> Self {
        Self {
            repository,
            mailer,
            password_hasher: auth::PasswordHasher::new(),
        }
    }

    /// Best-effort post-commit notification. The account state transition is
    /// already persisted when this runs; a failure is reported distinctly
    /// but never rolls anything back.
    async fn dispatch_verification_email(
        &self,
        account: &Account,
        code: &VerificationCode,
    ) -> Result<(), IdentityError> {
        let body = format!(
            "Hi {},\n\nYour verification code is {}. It expires in 10 minutes.\n",
            account.name, code.code
        );

        self.mailer
            .send(&account.email, "Verify your email address", &body)
            .await
            .map_err(|e| {
                tracing::error!(account_id = %account.id, error = %e, "Verification email dispatch failed");
                IdentityError::EmailDispatchFailed(e.to_string())
            })
    }
}

#[async_trait]
impl<R, M> IdentityServicePort for IdentityService<R, M>
where
    R: AccountRepository,
    M: Mailer,
{
    async fn register(&self, command: RegisterCommand) -> Result<Account, IdentityError> {
        let password_hash = self.password_hasher.hash(&command.password)?;

        let now = Utc::now();
        let verification = VerificationCode::generate(now);

        let account = Account {
            id: AccountId::new(),
            email: command.email,
            name: command.name,
            password_hash: Some(password_hash),
            provider_id: None,
            photo_url: None,
            phone_number: command.phone_number,
            auth_provider: AuthProvider::Local,
            is_email_verified: false,
            verification: Some(verification.clone()),
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.create(account).await?;

        tracing::info!(account_id = %created.id, "Account registered, pending verification");

        self.dispatch_verification_email(&created, &verification)
            .await?;

        Ok(created)
    }

    async fn verify_email(
        &self,
        email: &EmailAddress,
        code: &str,
    ) -> Result<Account, IdentityError> {
        let mut account = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or(IdentityError::InvalidOrExpiredCode)?;

        let now = Utc::now();
        let accepted = account
            .verification
            .as_ref()
            .map(|pending| pending.accepts(code, now))
            .unwrap_or(false);

        if !accepted {
            return Err(IdentityError::InvalidOrExpiredCode);
        }

        account.is_email_verified = true;
        account.verification = None;
        account.updated_at = now;

        let verified = self.repository.update(account).await?;
        tracing::info!(account_id = %verified.id, "Email verified");

        Ok(verified)
    }

    async fn resend_verification(&self, email: &EmailAddress) -> Result<(), IdentityError> {
        let mut account = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or(IdentityError::NotFound)?;

        // Same error for "already verified" and "not a local account" as for
        // "no such account".
        if account.auth_provider != AuthProvider::Local || account.is_email_verified {
            return Err(IdentityError::NotFound);
        }

        let now = Utc::now();
        let verification = VerificationCode::generate(now);
        account.verification = Some(verification.clone());
        account.updated_at = now;

        let saved = self.repository.update(account).await?;

        self.dispatch_verification_email(&saved, &verification)
            .await?;

        Ok(())
    }

    async fn login(&self, email: &EmailAddress, password: &str) -> Result<Account, IdentityError> {
        let account = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        if account.auth_provider != AuthProvider::Local {
            return Err(IdentityError::InvalidCredentials);
        }

        let stored_hash = account
            .password_hash
            .as_deref()
            .ok_or(IdentityError::InvalidCredentials)?;

        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(IdentityError::InvalidCredentials);
        }

        // Checked after the password so disclosure reveals nothing to a
        // caller who does not already hold the credentials.
        if !account.is_email_verified {
            return Err(IdentityError::EmailNotVerified);
        }

        Ok(account)
    }

    async fn federated_sign_in(
        &self,
        identity: ProviderIdentity,
    ) -> Result<Account, IdentityError> {
        // 1. Already linked: authenticate as that account.
        if let Some(account) = self
            .repository
            .find_by_provider_id(&identity.provider_id)
            .await?
        {
            return Ok(account);
        }

        // 2. Email match: link the federated identity onto the existing
        //    account. The provider attests the email, so verification is
        //    forced on.
        if let Some(mut account) = self.repository.find_by_email(&identity.email).await? {
            account.provider_id = Some(identity.provider_id);
            account.photo_url = identity.photo_url.or(account.photo_url);
            account.is_email_verified = true;
            account.updated_at = Utc::now();

            let linked = self.repository.update(account).await?;
            tracing::info!(account_id = %linked.id, "Federated identity linked to existing account");

            return Ok(linked);
        }

        // 3. First sight of this identity: create a verified federated
        //    account.
        let now = Utc::now();
        let account = Account {
            id: AccountId::new(),
            email: identity.email,
            name: identity.name,
            password_hash: None,
            provider_id: Some(identity.provider_id),
            photo_url: identity.photo_url,
            phone_number: None,
            auth_provider: AuthProvider::Federated,
            is_email_verified: true,
            verification: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.create(account).await?;
        tracing::info!(account_id = %created.id, "Federated account created");

        Ok(created)
    }

    async fn get_account(&self, id: &AccountId) -> Result<Account, IdentityError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::NotFound)
    }
}
