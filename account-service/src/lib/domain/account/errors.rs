use thiserror::Error;

/// Error for username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("username length should be between {min} and {max}, got {actual}")]
    Length {
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("username should only contain letters, digits, and underscore")]
    InvalidCharacters,
}

/// Error for email validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("email length should be between {min} and {max}, got {actual}")]
    Length {
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("email is not valid: {0}")]
    InvalidFormat(String),
}

/// Error for password shape failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordRuleError {
    #[error("password length should be between {min} and {max}, got {actual}")]
    Length {
        min: usize,
        max: usize,
        actual: usize,
    },
}

/// Shape failure on one input field.
///
/// Carries the offending field name so clients can target form errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    Username(#[from] UsernameError),

    #[error("{0}")]
    Email(#[from] EmailError),

    #[error("{0}")]
    Password(#[from] PasswordRuleError),
}

impl ValidationError {
    /// Name of the field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Username(_) => "username",
            ValidationError::Email(_) => "email",
            ValidationError::Password(_) => "password",
        }
    }
}

/// Error for notification delivery operations
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("notification delivery is not enabled")]
    NotEnabled,

    #[error("failed to build notification message: {0}")]
    InvalidMessage(String),

    #[error("failed to deliver notification: {0}")]
    DeliveryFailed(String),
}

/// Top-level error for all account operations
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    // Input shape failures, reported before any side effect
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    // Uniqueness conflicts; distinct from the syntactic kinds above so
    // client messaging stays distinguishable
    #[error("username already exists: {0}")]
    UsernameTaken(String),

    #[error("email already exists: {0}")]
    EmailTaken(String),

    // Login input failures
    #[error("password is required")]
    MissingPassword,

    #[error("username or email is required")]
    MissingLoginIdentifier,

    // Deliberately identical for a lookup miss and a password mismatch so
    // responses never reveal whether the account exists
    #[error("username or password is incorrect")]
    IncorrectCredentials,

    // Token failures on redemption; no detail beyond "invalid" reaches the
    // caller
    #[error("token is not valid")]
    InvalidToken,

    // Redemption against a vanished account; a definite answer, not a quiet
    // success, since the caller holds a validly signed token
    #[error("no account found for {0}")]
    NotFound(String),

    // Infrastructure errors, always kept distinct from the authentication
    // kinds above
    #[error("password hashing error: {0}")]
    Hashing(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        AccountError::Internal(err.to_string())
    }
}
