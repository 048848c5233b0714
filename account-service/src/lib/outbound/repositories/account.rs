use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::account::errors::AccountError;
use crate::account::errors::ValidationError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AccountRecord;
use crate::account::models::EmailAddress;
use crate::account::models::LoginIdentifier;
use crate::account::models::NewAccount;
use crate::account::models::Username;
use crate::account::ports::AccountRepository;

/// Postgres-backed account directory.
///
/// Username and email uniqueness is enforced by the table constraints, so
/// concurrent duplicate registrations lose the race here and surface as
/// conflict errors rather than double inserts.
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    email: String,
    is_active: bool,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AccountRecordRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    is_active: bool,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AccountError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId(row.id),
            username: Username::new(row.username).map_err(ValidationError::from)?,
            email: EmailAddress::new(row.email).map_err(ValidationError::from)?,
            is_active: row.is_active,
            is_verified: row.is_verified,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<AccountRecordRow> for AccountRecord {
    type Error = AccountError;

    fn try_from(row: AccountRecordRow) -> Result<Self, Self::Error> {
        let password_hash = row.password_hash.clone();
        let account = Account::try_from(AccountRow {
            id: row.id,
            username: row.username,
            email: row.email,
            is_active: row.is_active,
            is_verified: row.is_verified,
            created_at: row.created_at,
        })?;
        Ok(AccountRecord {
            account,
            password_hash,
        })
    }
}

fn map_create_error(e: sqlx::Error, account: &NewAccount) -> AccountError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("accounts_username_key") {
                return AccountError::UsernameTaken(account.username.to_string());
            }
            if db_err.constraint() == Some("accounts_email_key") {
                return AccountError::EmailTaken(account.email.to_string());
            }
        }
    }
    AccountError::Database(e.to_string())
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, is_active, is_verified, created_at
            "#,
        )
        .bind(account.username.as_str())
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_create_error(e, &account))?;

        Account::try_from(row)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, email, is_active, is_verified, created_at
            FROM accounts
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::Database(e.to_string()))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, email, is_active, is_verified, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::Database(e.to_string()))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_for_login(
        &self,
        identifier: &LoginIdentifier,
    ) -> Result<Option<AccountRecord>, AccountError> {
        let query = match identifier {
            LoginIdentifier::Username(_) => {
                r#"
                SELECT id, username, email, password_hash, is_active, is_verified, created_at
                FROM accounts
                WHERE username = $1
                "#
            }
            LoginIdentifier::Email(_) => {
                r#"
                SELECT id, username, email, password_hash, is_active, is_verified, created_at
                FROM accounts
                WHERE email = $1
                "#
            }
        };

        let value = match identifier {
            LoginIdentifier::Username(username) => username,
            LoginIdentifier::Email(email) => email,
        };

        let row = sqlx::query_as::<_, AccountRecordRow>(query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        row.map(AccountRecord::try_from).transpose()
    }

    async fn update_password(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), AccountError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
