use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Intended use of a token.
///
/// Both token kinds are signed with the same secret, so the purpose claim is
/// the only thing preventing a reset token from being replayed as a session
/// token (and vice versa). It is always embedded and always checked; a token
/// without it does not deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Session,
    PasswordReset,
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPurpose::Session => write!(f, "session"),
            TokenPurpose::PasswordReset => write!(f, "password_reset"),
        }
    }
}

/// Claim set embedded in every issued token.
///
/// All fields are mandatory: a token missing any of them fails verification
/// at deserialization, so no partially-trusted claims ever reach a caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject: username for session tokens, email for reset tokens
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Purpose discriminator
    pub purpose: TokenPurpose,
}

impl Claims {
    /// Build a claim set expiring `ttl` after `issued_at`.
    pub fn new(
        purpose: TokenPurpose,
        subject: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: subject.into(),
            exp: (issued_at + ttl).timestamp(),
            iat: issued_at.timestamp(),
            purpose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_expiry_offset() {
        let now = Utc::now();
        let claims = Claims::new(TokenPurpose::Session, "alice", now, Duration::hours(24));

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert_eq!(claims.purpose, TokenPurpose::Session);
    }

    #[test]
    fn test_purpose_serializes_as_snake_case() {
        let json = serde_json::to_string(&TokenPurpose::PasswordReset).unwrap();
        assert_eq!(json, "\"password_reset\"");
    }
}
