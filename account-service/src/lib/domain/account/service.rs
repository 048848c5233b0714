use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenCodec;

use crate::account::errors::AccountError;
use crate::account::errors::ValidationError;
use crate::account::models::Account;
use crate::account::models::AuthenticatedSession;
use crate::account::models::EmailAddress;
use crate::account::models::LoginCommand;
use crate::account::models::NewAccount;
use crate::account::models::Password;
use crate::account::models::RegisterCommand;
use crate::account::models::ResetTokenIssued;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;
use crate::account::ports::Notifier;

const RESET_EMAIL_SUBJECT: &str = "Your reset password token";

// Well-formed Argon2id hash matching no password; verified against on a login
// lookup miss so a miss and a mismatch cost the same hashing work.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Domain service implementation for account operations.
///
/// Stateless over injected dependencies: the directory, the notifier, and the
/// credential infrastructure. Safe to share across concurrent requests.
pub struct AccountService<R, N>
where
    R: AccountRepository,
    N: Notifier,
{
    repository: Arc<R>,
    notifier: Arc<N>,
    password_hasher: PasswordHasher,
    token_codec: Arc<TokenCodec>,
}

impl<R, N> AccountService<R, N>
where
    R: AccountRepository,
    N: Notifier,
{
    /// Create a new account service with injected dependencies.
    pub fn new(repository: Arc<R>, notifier: Arc<N>, token_codec: Arc<TokenCodec>) -> Self {
        Self {
            repository,
            notifier,
            password_hasher: PasswordHasher::new(),
            token_codec,
        }
    }
}

#[async_trait]
impl<R, N> AccountServicePort for AccountService<R, N>
where
    R: AccountRepository,
    N: Notifier,
{
    async fn register(&self, command: RegisterCommand) -> Result<Account, AccountError> {
        // Uniqueness pre-checks keep the common conflict off the insert path;
        // a concurrent duplicate still surfaces as the same conflict error
        // from the directory's own constraint.
        if self
            .repository
            .find_by_username(command.username.as_str())
            .await?
            .is_some()
        {
            return Err(AccountError::UsernameTaken(command.username.to_string()));
        }

        if self
            .repository
            .find_by_email(command.email.as_str())
            .await?
            .is_some()
        {
            return Err(AccountError::EmailTaken(command.email.to_string()));
        }

        let password_hash = self
            .password_hasher
            .hash(command.password.as_str())
            .map_err(|e| AccountError::Hashing(e.to_string()))?;

        let account = self
            .repository
            .create(NewAccount {
                username: command.username,
                email: command.email,
                password_hash,
            })
            .await?;

        tracing::info!(account_id = %account.id, username = %account.username, "Account registered");

        Ok(account)
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, AccountError> {
        let password = command
            .password
            .as_deref()
            .ok_or(AccountError::MissingPassword)?;

        let identifier = command
            .identifier()
            .ok_or(AccountError::MissingLoginIdentifier)?;

        let record = self.repository.find_for_login(&identifier).await?;

        // A miss and a mismatch must be indistinguishable to the caller, in
        // response time as well as in the error: burn a verification against
        // the dummy hash before answering a miss.
        let Some(record) = record else {
            let _ = self.password_hasher.verify(password, DUMMY_PASSWORD_HASH);
            return Err(AccountError::IncorrectCredentials);
        };

        let matches = self
            .password_hasher
            .verify(password, &record.password_hash)
            .map_err(|e| AccountError::Hashing(e.to_string()))?;

        if !matches {
            return Err(AccountError::IncorrectCredentials);
        }

        let token = self
            .token_codec
            .issue_session(record.account.username.as_str())
            .map_err(|e| AccountError::Internal(e.to_string()))?;

        tracing::info!(username = %record.account.username, "Session token issued");

        Ok(AuthenticatedSession {
            account: record.account,
            token,
        })
    }

    async fn get_account_by_username(&self, username: &str) -> Result<Account, AccountError> {
        self.repository
            .find_by_username(username)
            .await?
            .ok_or_else(|| AccountError::NotFound(username.to_string()))
    }

    async fn request_password_reset(
        &self,
        email: String,
    ) -> Result<Option<ResetTokenIssued>, AccountError> {
        let email = EmailAddress::new(email).map_err(ValidationError::from)?;

        let Some(account) = self.repository.find_by_email(email.as_str()).await? else {
            // Quiet success: the boundary answers identically whether or not
            // the account exists.
            tracing::debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = self
            .token_codec
            .issue_reset(account.email.as_str())
            .map_err(|e| AccountError::Internal(e.to_string()))?;

        let body = format!("Your reset password token is: {token}");
        let delivered = match self
            .notifier
            .deliver(account.email.as_str(), RESET_EMAIL_SUBJECT, &body)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to deliver reset token, falling back to response");
                false
            }
        };

        Ok(Some(ResetTokenIssued { token, delivered }))
    }

    async fn apply_new_password(
        &self,
        token: &str,
        new_password: String,
    ) -> Result<(), AccountError> {
        // Password shape first, before any token work or directory access.
        let new_password = Password::new(new_password).map_err(ValidationError::from)?;

        let email = self.token_codec.verify_reset(token).map_err(|e| {
            tracing::debug!(error = %e, "Reset token rejected");
            AccountError::InvalidToken
        })?;

        let account = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AccountError::NotFound(email.clone()))?;

        let password_hash = self
            .password_hasher
            .hash(new_password.as_str())
            .map_err(|e| AccountError::Hashing(e.to_string()))?;

        self.repository
            .update_password(account.id, &password_hash)
            .await?;

        tracing::info!(account_id = %account.id, "Password replaced via reset token");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::account::errors::EmailError;
    use crate::account::errors::NotifierError;
    use crate::account::errors::PasswordRuleError;
    use crate::account::errors::UsernameError;
    use crate::account::models::AccountId;
    use crate::account::models::AccountRecord;
    use crate::account::models::LoginIdentifier;
    use crate::account::models::Username;

    const TEST_SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    mock! {
        pub TestRepository {}

        #[async_trait]
        impl AccountRepository for TestRepository {
            async fn create(&self, account: NewAccount) -> Result<Account, AccountError>;
            async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;
            async fn find_for_login(&self, identifier: &LoginIdentifier) -> Result<Option<AccountRecord>, AccountError>;
            async fn update_password(&self, id: AccountId, password_hash: &str) -> Result<(), AccountError>;
        }
    }

    mock! {
        pub TestNotifier {}

        #[async_trait]
        impl Notifier for TestNotifier {
            async fn deliver(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifierError>;
        }
    }

    fn test_account(id: i64, username: &str, email: &str) -> Account {
        Account {
            id: AccountId(id),
            username: Username::new(username.to_string()).unwrap(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            is_active: true,
            is_verified: false,
            created_at: Utc::now(),
        }
    }

    fn service(
        repository: MockTestRepository,
        notifier: MockTestNotifier,
    ) -> AccountService<MockTestRepository, MockTestNotifier> {
        AccountService::new(
            Arc::new(repository),
            Arc::new(notifier),
            Arc::new(TokenCodec::new(TEST_SECRET, 24)),
        )
    }

    fn register_command(username: &str, email: &str, password: &str) -> RegisterCommand {
        RegisterCommand::new(
            username.to_string(),
            email.to_string(),
            password.to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut repository = MockTestRepository::new();

        repository
            .expect_find_by_username()
            .with(eq("valid_user"))
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_find_by_email()
            .with(eq("user@example.com"))
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create()
            .withf(|new_account| {
                new_account.username.as_str() == "valid_user"
                    && new_account.email.as_str() == "user@example.com"
                    && new_account.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|new_account| {
                Ok(Account {
                    id: AccountId(1),
                    username: new_account.username,
                    email: new_account.email,
                    is_active: true,
                    is_verified: false,
                    created_at: Utc::now(),
                })
            });

        let service = service(repository, MockTestNotifier::new());

        let account = service
            .register(register_command(
                "valid_user",
                "user@example.com",
                "longenough1",
            ))
            .await
            .unwrap();

        assert_eq!(account.id, AccountId(1));
        assert_eq!(account.username.as_str(), "valid_user");
        assert!(account.is_active);
        assert!(!account.is_verified);
    }

    #[tokio::test]
    async fn test_register_username_taken() {
        let mut repository = MockTestRepository::new();

        repository
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(Some(test_account(1, "valid_user", "other@example.com"))));
        repository.expect_find_by_email().times(0);
        repository.expect_create().times(0);

        let service = service(repository, MockTestNotifier::new());

        let result = service
            .register(register_command(
                "valid_user",
                "user@example.com",
                "longenough1",
            ))
            .await;

        assert!(matches!(result, Err(AccountError::UsernameTaken(_))));
    }

    #[tokio::test]
    async fn test_register_email_taken() {
        let mut repository = MockTestRepository::new();

        repository
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(test_account(1, "other_user", "user@example.com"))));
        repository.expect_create().times(0);

        let service = service(repository, MockTestNotifier::new());

        let result = service
            .register(register_command(
                "valid_user",
                "user@example.com",
                "longenough1",
            ))
            .await;

        assert!(matches!(result, Err(AccountError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_register_concurrent_duplicate_surfaces_conflict() {
        // The directory constraint wins the race: pre-checks pass but the
        // insert reports the duplicate.
        let mut repository = MockTestRepository::new();

        repository
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create()
            .times(1)
            .returning(|new_account| {
                Err(AccountError::UsernameTaken(
                    new_account.username.to_string(),
                ))
            });

        let service = service(repository, MockTestNotifier::new());

        let result = service
            .register(register_command(
                "valid_user",
                "user@example.com",
                "longenough1",
            ))
            .await;

        assert!(matches!(result, Err(AccountError::UsernameTaken(_))));
    }

    #[test]
    fn test_register_validation_rule_order() {
        assert!(matches!(
            RegisterCommand::new("ab".into(), "user@example.com".into(), "longenough1".into()),
            Err(ValidationError::Username(UsernameError::Length { .. }))
        ));
        assert!(matches!(
            RegisterCommand::new("   ".into(), "user@example.com".into(), "longenough1".into()),
            Err(ValidationError::Username(UsernameError::InvalidCharacters))
        ));
        assert!(matches!(
            RegisterCommand::new("valid_user".into(), "s@s.c".into(), "longenough1".into()),
            Err(ValidationError::Email(EmailError::Length { .. }))
        ));
        assert!(matches!(
            RegisterCommand::new(
                "valid_user".into(),
                "invalidEmail".into(),
                "longenough1".into()
            ),
            Err(ValidationError::Email(EmailError::InvalidFormat(_)))
        ));
        assert!(matches!(
            RegisterCommand::new(
                "valid_user".into(),
                "user@example.com".into(),
                "sss".into()
            ),
            Err(ValidationError::Password(PasswordRuleError::Length { .. }))
        ));
    }

    #[test]
    fn test_dummy_hash_is_well_formed_and_matches_nothing() {
        // The miss path relies on this hash parsing cleanly so the full
        // Argon2 pass runs instead of erroring out early.
        let hasher = PasswordHasher::new();
        let result = hasher.verify("any_password_at_all", DUMMY_PASSWORD_HASH);
        assert!(!result.unwrap());
    }

    #[tokio::test]
    async fn test_login_missing_password() {
        let service = service(MockTestRepository::new(), MockTestNotifier::new());

        let result = service
            .login(LoginCommand {
                username: Some("alice".to_string()),
                email: None,
                password: None,
            })
            .await;

        assert!(matches!(result, Err(AccountError::MissingPassword)));
    }

    #[tokio::test]
    async fn test_login_missing_identifier() {
        let service = service(MockTestRepository::new(), MockTestNotifier::new());

        let result = service
            .login(LoginCommand {
                username: None,
                email: None,
                password: Some("password123".to_string()),
            })
            .await;

        assert!(matches!(result, Err(AccountError::MissingLoginIdentifier)));
    }

    #[tokio::test]
    async fn test_login_unknown_account_and_wrong_password_same_error() {
        let hasher = PasswordHasher::new();
        let stored_hash = hasher.hash("the_right_password").unwrap();

        // Unknown account
        let mut repository = MockTestRepository::new();
        repository
            .expect_find_for_login()
            .times(1)
            .returning(|_| Ok(None));
        let unknown = service(repository, MockTestNotifier::new())
            .login(LoginCommand {
                username: Some("ghost".to_string()),
                email: None,
                password: Some("whatever123".to_string()),
            })
            .await
            .unwrap_err();

        // Wrong password
        let mut repository = MockTestRepository::new();
        repository
            .expect_find_for_login()
            .times(1)
            .returning(move |_| {
                Ok(Some(AccountRecord {
                    account: test_account(1, "alice", "alice@example.com"),
                    password_hash: stored_hash.clone(),
                }))
            });
        let mismatch = service(repository, MockTestNotifier::new())
            .login(LoginCommand {
                username: Some("alice".to_string()),
                email: None,
                password: Some("the_wrong_password".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(unknown, AccountError::IncorrectCredentials));
        assert!(matches!(mismatch, AccountError::IncorrectCredentials));
        assert_eq!(unknown.to_string(), mismatch.to_string());
    }

    #[tokio::test]
    async fn test_login_success_with_username_mints_valid_session() {
        let hasher = PasswordHasher::new();
        let stored_hash = hasher.hash("password123").unwrap();

        let mut repository = MockTestRepository::new();
        repository
            .expect_find_for_login()
            .withf(|identifier| {
                *identifier == LoginIdentifier::Username("alice".to_string())
            })
            .times(1)
            .returning(move |_| {
                Ok(Some(AccountRecord {
                    account: test_account(1, "alice", "alice@example.com"),
                    password_hash: stored_hash.clone(),
                }))
            });

        let service = service(repository, MockTestNotifier::new());

        let session = service
            .login(LoginCommand {
                username: Some("alice".to_string()),
                email: None,
                password: Some("password123".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(session.account.username.as_str(), "alice");

        // The minted token verifies as a session for the account's username.
        let codec = TokenCodec::new(TEST_SECRET, 24);
        assert_eq!(codec.verify_session(&session.token).unwrap(), "alice");
        assert!(codec.verify_reset(&session.token).is_err());
    }

    #[tokio::test]
    async fn test_login_success_with_email() {
        let hasher = PasswordHasher::new();
        let stored_hash = hasher.hash("password123").unwrap();

        let mut repository = MockTestRepository::new();
        repository
            .expect_find_for_login()
            .withf(|identifier| {
                *identifier == LoginIdentifier::Email("alice@example.com".to_string())
            })
            .times(1)
            .returning(move |_| {
                Ok(Some(AccountRecord {
                    account: test_account(1, "alice", "alice@example.com"),
                    password_hash: stored_hash.clone(),
                }))
            });

        let service = service(repository, MockTestNotifier::new());

        let session = service
            .login(LoginCommand {
                username: None,
                email: Some("alice@example.com".to_string()),
                password: Some("password123".to_string()),
            })
            .await
            .unwrap();

        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn test_request_reset_unknown_email_is_quiet() {
        let mut repository = MockTestRepository::new();
        repository
            .expect_find_by_email()
            .with(eq("unknown@example.com"))
            .times(1)
            .returning(|_| Ok(None));

        let mut notifier = MockTestNotifier::new();
        notifier.expect_deliver().times(0);

        let service = service(repository, notifier);

        let result = service
            .request_password_reset("unknown@example.com".to_string())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_request_reset_invalid_email_shape() {
        let service = service(MockTestRepository::new(), MockTestNotifier::new());

        let result = service
            .request_password_reset("not-an-email".to_string())
            .await;

        assert!(matches!(
            result,
            Err(AccountError::Validation(ValidationError::Email(_)))
        ));
    }

    #[tokio::test]
    async fn test_request_reset_known_email_delivers_token() {
        let mut repository = MockTestRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(test_account(1, "alice", "alice@example.com"))));

        let mut notifier = MockTestNotifier::new();
        notifier
            .expect_deliver()
            .withf(|recipient, subject, body| {
                recipient == "alice@example.com"
                    && subject == RESET_EMAIL_SUBJECT
                    && body.starts_with("Your reset password token is: ")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = service(repository, notifier);

        let issued = service
            .request_password_reset("alice@example.com".to_string())
            .await
            .unwrap()
            .expect("token should be issued");

        assert!(issued.delivered);

        // The issued token redeems for the right email and only as a reset.
        let codec = TokenCodec::new(TEST_SECRET, 24);
        assert_eq!(
            codec.verify_reset(&issued.token).unwrap(),
            "alice@example.com"
        );
        assert!(codec.verify_session(&issued.token).is_err());
    }

    #[tokio::test]
    async fn test_request_reset_delivery_failure_falls_back_to_token() {
        let mut repository = MockTestRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(test_account(1, "alice", "alice@example.com"))));

        let mut notifier = MockTestNotifier::new();
        notifier
            .expect_deliver()
            .times(1)
            .returning(|_, _, _| Err(NotifierError::NotEnabled));

        let service = service(repository, notifier);

        let issued = service
            .request_password_reset("alice@example.com".to_string())
            .await
            .unwrap()
            .expect("token should be issued");

        assert!(!issued.delivered);
        assert!(!issued.token.is_empty());
    }

    #[tokio::test]
    async fn test_apply_new_password_rejects_short_password_first() {
        // Repository is never touched: the password rule runs before the
        // token is even looked at.
        let service = service(MockTestRepository::new(), MockTestNotifier::new());

        let result = service
            .apply_new_password("irrelevant-token", "sss".to_string())
            .await;

        assert!(matches!(
            result,
            Err(AccountError::Validation(ValidationError::Password(_)))
        ));
    }

    #[tokio::test]
    async fn test_apply_new_password_rejects_garbage_token() {
        let service = service(MockTestRepository::new(), MockTestNotifier::new());

        let result = service
            .apply_new_password("not.a.token", "longenough1".to_string())
            .await;

        assert!(matches!(result, Err(AccountError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_apply_new_password_rejects_expired_token() {
        let expired_codec = TokenCodec::new(TEST_SECRET, -1);
        let token = expired_codec.issue_reset("alice@example.com").unwrap();

        let service = service(MockTestRepository::new(), MockTestNotifier::new());

        let result = service
            .apply_new_password(&token, "longenough1".to_string())
            .await;

        assert!(matches!(result, Err(AccountError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_apply_new_password_rejects_session_token() {
        let codec = TokenCodec::new(TEST_SECRET, 24);
        let token = codec.issue_session("alice").unwrap();

        let service = service(MockTestRepository::new(), MockTestNotifier::new());

        let result = service
            .apply_new_password(&token, "longenough1".to_string())
            .await;

        assert!(matches!(result, Err(AccountError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_apply_new_password_vanished_account() {
        let codec = TokenCodec::new(TEST_SECRET, 24);
        let token = codec.issue_reset("gone@example.com").unwrap();

        let mut repository = MockTestRepository::new();
        repository
            .expect_find_by_email()
            .with(eq("gone@example.com"))
            .times(1)
            .returning(|_| Ok(None));
        repository.expect_update_password().times(0);

        let service = service(repository, MockTestNotifier::new());

        let result = service
            .apply_new_password(&token, "longenough1".to_string())
            .await;

        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_apply_new_password_success() {
        let codec = TokenCodec::new(TEST_SECRET, 24);
        let token = codec.issue_reset("alice@example.com").unwrap();

        let mut repository = MockTestRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(test_account(7, "alice", "alice@example.com"))));
        repository
            .expect_update_password()
            .withf(|id, password_hash| {
                *id == AccountId(7) && password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service(repository, MockTestNotifier::new());

        service
            .apply_new_password(&token, "brand_new_password".to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_account_by_username_not_found() {
        let mut repository = MockTestRepository::new();
        repository
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(repository, MockTestNotifier::new());

        let result = service.get_account_by_username("ghost").await;
        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }
}
