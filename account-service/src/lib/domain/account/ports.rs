use async_trait::async_trait;

use crate::account::errors::AccountError;
use crate::account::errors::NotifierError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AccountRecord;
use crate::account::models::AuthenticatedSession;
use crate::account::models::LoginCommand;
use crate::account::models::LoginIdentifier;
use crate::account::models::NewAccount;
use crate::account::models::RegisterCommand;
use crate::account::models::ResetTokenIssued;

/// Port for account domain service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Register a new account with validated credentials.
    ///
    /// # Errors
    /// * `UsernameTaken` - username is already registered
    /// * `EmailTaken` - email is already registered
    /// * `Hashing` - password hashing failed
    /// * `Database` - directory operation failed
    async fn register(&self, command: RegisterCommand) -> Result<Account, AccountError>;

    /// Authenticate by username or email and mint a session token.
    ///
    /// A lookup miss and a password mismatch return the same error.
    ///
    /// # Errors
    /// * `MissingPassword` - no password supplied
    /// * `MissingLoginIdentifier` - neither username nor email supplied
    /// * `IncorrectCredentials` - no such account or wrong password
    /// * `Database` / `Hashing` / `Internal` - infrastructure failure
    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, AccountError>;

    /// Resolve the account behind a verified session token subject.
    ///
    /// # Errors
    /// * `NotFound` - no account with this username
    /// * `Database` - directory operation failed
    async fn get_account_by_username(&self, username: &str) -> Result<Account, AccountError>;

    /// Issue a reset token for an email, delivering it via the notifier.
    ///
    /// Returns `Ok(None)` when the email maps to no account: the boundary
    /// responds with the same generic success either way, so callers cannot
    /// enumerate accounts. Delivery failure is non-fatal; the issued token is
    /// still returned with `delivered == false`.
    ///
    /// # Errors
    /// * `Validation` - email shape is invalid
    /// * `Database` / `Internal` - infrastructure failure
    async fn request_password_reset(
        &self,
        email: String,
    ) -> Result<Option<ResetTokenIssued>, AccountError>;

    /// Redeem a reset token and replace the account password.
    ///
    /// # Errors
    /// * `Validation` - new password fails the length rule
    /// * `InvalidToken` - token is not a valid, unexpired reset token
    /// * `NotFound` - the token's email no longer maps to an account
    /// * `Hashing` / `Database` - infrastructure failure
    async fn apply_new_password(
        &self,
        token: &str,
        new_password: String,
    ) -> Result<(), AccountError>;
}

/// Directory port: persistence operations for the account store.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Persist a new account; the store assigns the id.
    ///
    /// # Errors
    /// * `UsernameTaken` / `EmailTaken` - uniqueness constraint violated,
    ///   including by a concurrent registration
    /// * `Database` - operation failed
    async fn create(&self, account: NewAccount) -> Result<Account, AccountError>;

    /// Look up the visible account by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountError>;

    /// Look up the visible account by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    /// Look up the full record, including the stored hash, for login.
    async fn find_for_login(
        &self,
        identifier: &LoginIdentifier,
    ) -> Result<Option<AccountRecord>, AccountError>;

    /// Replace the stored password hash for an account.
    ///
    /// # Errors
    /// * `NotFound` - no account with this id
    /// * `Database` - operation failed
    async fn update_password(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), AccountError>;
}

/// Notification port: out-of-band delivery of reset tokens.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Deliver a message to a recipient address.
    ///
    /// # Errors
    /// * `NotEnabled` - no delivery channel is configured
    /// * `InvalidMessage` - the message could not be built
    /// * `DeliveryFailed` - the transport rejected the message
    async fn deliver(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifierError>;
}
