use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::account::errors::IdentityError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::EmailAddress;
use crate::account::ports::AccountRepository;

/// In-memory account store with the same uniqueness guarantees as the
/// Postgres implementation. Backs the HTTP test harness; not wired into the
/// production binary.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct mutation escape hatch for tests that need to age a
    /// verification code or flip a flag without going through the API.
    pub fn mutate<F>(&self, id: &AccountId, f: F) -> Result<(), IdentityError>
    where
        F: FnOnce(&mut Account),
    {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        let account = accounts.get_mut(&id.0).ok_or(IdentityError::NotFound)?;
        f(account);
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, IdentityError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        if accounts.values().any(|a| a.email == account.email) {
            return Err(IdentityError::EmailAlreadyExists);
        }
        if let Some(provider_id) = &account.provider_id {
            if accounts
                .values()
                .any(|a| a.provider_id.as_deref() == Some(provider_id))
            {
                return Err(IdentityError::ProviderAlreadyLinked);
            }
        }

        accounts.insert(account.id.0, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, IdentityError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        Ok(accounts.get(&id.0).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, IdentityError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        Ok(accounts.values().find(|a| &a.email == email).cloned())
    }

    async fn find_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<Account>, IdentityError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        Ok(accounts
            .values()
            .find(|a| a.provider_id.as_deref() == Some(provider_id))
            .cloned())
    }

    async fn update(&self, account: Account) -> Result<Account, IdentityError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        if !accounts.contains_key(&account.id.0) {
            return Err(IdentityError::NotFound);
        }
        if accounts
            .values()
            .any(|a| a.id != account.id && a.email == account.email)
        {
            return Err(IdentityError::EmailAlreadyExists);
        }
        if let Some(provider_id) = &account.provider_id {
            if accounts
                .values()
                .any(|a| a.id != account.id && a.provider_id.as_deref() == Some(provider_id))
            {
                return Err(IdentityError::ProviderAlreadyLinked);
            }
        }

        let mut account = account;
        account.updated_at = Utc::now();
        accounts.insert(account.id.0, account.clone());
        Ok(account)
    }
}
