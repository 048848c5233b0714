use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;

use crate::account::errors::EmailError;
use crate::account::errors::PasswordRuleError;
use crate::account::errors::UsernameError;
use crate::account::errors::ValidationError;

/// Account unique identifier.
///
/// Assigned by the directory on creation and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Ensures the username is 3-20 characters of ASCII alphanumerics and
/// underscore. Length is checked before characters so error reporting is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 20;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `Length` - outside [3,20]
    /// * `InvalidCharacters` - anything but `[A-Za-z0-9_]`
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let length = username.len();
        if length < Self::MIN_LENGTH || length > Self::MAX_LENGTH {
            return Err(UsernameError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }

        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(UsernameError::InvalidCharacters);
        }

        Ok(Self(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address value type
///
/// Length is checked first, then the `local@domain.tld` shape: the RFC 5322
/// parser alone would accept dotless domains, so the dot in the domain part
/// is required explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    const MIN_LENGTH: usize = 6;
    const MAX_LENGTH: usize = 255;

    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `Length` - outside [6,255]
    /// * `InvalidFormat` - not a `local@domain.tld` shaped address
    pub fn new(email: String) -> Result<Self, EmailError> {
        let length = email.len();
        if length < Self::MIN_LENGTH || length > Self::MAX_LENGTH {
            return Err(EmailError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }

        let parsed = email_address::EmailAddress::from_str(&email)
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))?;

        if !parsed.domain().contains('.') {
            return Err(EmailError::InvalidFormat(
                "domain must contain a top-level part".to_string(),
            ));
        }

        Ok(Self(email))
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

/// Plaintext password value type
///
/// Only the length rule applies; the plaintext never leaves the domain layer
/// and is redacted from debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;
    const MAX_LENGTH: usize = 64;

    /// Create a new valid password.
    ///
    /// # Errors
    /// * `Length` - outside [8,64]
    pub fn new(password: String) -> Result<Self, PasswordRuleError> {
        let length = password.len();
        if length < Self::MIN_LENGTH || length > Self::MAX_LENGTH {
            return Err(PasswordRuleError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }

        Ok(Self(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Account entity as exposed to the rest of the system.
///
/// The password hash is deliberately absent; it only travels inside
/// [`AccountRecord`] between the directory and the login path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub username: Username,
    pub email: EmailAddress,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Full directory record including the stored credential.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub account: Account,
    pub password_hash: String,
}

/// Data handed to the directory to persist a new account.
#[derive(Debug)]
pub struct NewAccount {
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
}

/// Command to register a new account with validated fields.
#[derive(Debug)]
pub struct RegisterCommand {
    pub username: Username,
    pub email: EmailAddress,
    pub password: Password,
}

impl RegisterCommand {
    /// Validate raw registration input.
    ///
    /// Rules run in a fixed order with short-circuiting: username length,
    /// username characters, email length, email format, password length.
    /// The first failure is returned and later rules are not evaluated.
    pub fn new(
        username: String,
        email: String,
        password: String,
    ) -> Result<Self, ValidationError> {
        let username = Username::new(username)?;
        let email = EmailAddress::new(email)?;
        let password = Password::new(password)?;
        Ok(Self {
            username,
            email,
            password,
        })
    }
}

/// Which credential a caller logs in with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    Username(String),
    Email(String),
}

/// Raw login input; both identifier fields are optional at the boundary and
/// the service decides which applies.
#[derive(Debug, Default)]
pub struct LoginCommand {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginCommand {
    /// Pick the identifier to look up by; username wins when both are given.
    pub fn identifier(&self) -> Option<LoginIdentifier> {
        if let Some(username) = &self.username {
            Some(LoginIdentifier::Username(username.clone()))
        } else {
            self.email.clone().map(LoginIdentifier::Email)
        }
    }
}

/// Successful login outcome: the visible account plus a freshly minted
/// session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub account: Account,
    pub token: String,
}

/// Outcome of a reset request for an email that maps to an account.
///
/// `delivered` records whether the notifier accepted the message; when it did
/// not, the boundary falls back to returning the token in the response.
#[derive(Debug, Clone)]
pub struct ResetTokenIssued {
    pub token: String,
    pub delivered: bool,
}
