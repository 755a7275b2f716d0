use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::errors::IdentityError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AuthProvider;
use crate::account::models::EmailAddress;
use crate::account::models::VerificationCode;
use crate::account::ports::AccountRepository;

const SELECT_ACCOUNT: &str = r#"
    SELECT id, email, name, password_hash, provider_id, photo_url,
           phone_number, auth_provider, is_email_verified,
           verification_code, verification_code_expires_at,
           created_at, updated_at
    FROM accounts
"#;

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flat row shape for the `accounts` table. The two verification columns are
/// nullable together; `TryFrom` reassembles them into the value object.
#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: Option<String>,
    provider_id: Option<String>,
    photo_url: Option<String>,
    phone_number: Option<String>,
    auth_provider: String,
    is_email_verified: bool,
    verification_code: Option<String>,
    verification_code_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = IdentityError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let auth_provider = AuthProvider::parse(&row.auth_provider).ok_or_else(|| {
            IdentityError::DatabaseError(format!(
                "unknown auth_provider value: {}",
                row.auth_provider
            ))
        })?;

        let verification = match (row.verification_code, row.verification_code_expires_at) {
            (Some(code), Some(expires_at)) => Some(VerificationCode { code, expires_at }),
            _ => None,
        };

        Ok(Account {
            id: AccountId(row.id),
            email: EmailAddress::new(row.email)?,
            name: row.name,
            password_hash: row.password_hash,
            provider_id: row.provider_id,
            photo_url: row.photo_url,
            phone_number: row.phone_number,
            auth_provider,
            is_email_verified: row.is_email_verified,
            verification,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn map_unique_violation(e: sqlx::Error) -> IdentityError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("accounts_email_key") {
                return IdentityError::EmailAlreadyExists;
            }
            if db_err.constraint() == Some("accounts_provider_id_key") {
                return IdentityError::ProviderAlreadyLinked;
            }
        }
    }
    IdentityError::DatabaseError(e.to_string())
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, IdentityError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, name, password_hash, provider_id, photo_url,
                phone_number, auth_provider, is_email_verified,
                verification_code, verification_code_expires_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(&account.provider_id)
        .bind(&account.photo_url)
        .bind(&account.phone_number)
        .bind(account.auth_provider.as_str())
        .bind(account.is_email_verified)
        .bind(account.verification.as_ref().map(|v| v.code.clone()))
        .bind(account.verification.as_ref().map(|v| v.expires_at))
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, IdentityError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{} WHERE id = $1", SELECT_ACCOUNT))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, IdentityError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{} WHERE email = $1", SELECT_ACCOUNT))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<Account>, IdentityError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "{} WHERE provider_id = $1",
            SELECT_ACCOUNT
        ))
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        row.map(Account::try_from).transpose()
    }

    async fn update(&self, account: Account) -> Result<Account, IdentityError> {
        let mut account = account;
        account.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email = $2,
                name = $3,
                password_hash = $4,
                provider_id = $5,
                photo_url = $6,
                phone_number = $7,
                auth_provider = $8,
                is_email_verified = $9,
                verification_code = $10,
                verification_code_expires_at = $11,
                updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(&account.provider_id)
        .bind(&account.photo_url)
        .bind(&account.phone_number)
        .bind(account.auth_provider.as_str())
        .bind(account.is_email_verified)
        .bind(account.verification.as_ref().map(|v| v.code.clone()))
        .bind(account.verification.as_ref().map(|v| v.expires_at))
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound);
        }

        Ok(account)
    }
}
