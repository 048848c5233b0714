use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::TokenPurpose;
use super::errors::TokenError;

/// Issues and verifies the two token kinds over one symmetric secret.
///
/// Session tokens prove an authenticated login; reset tokens authorize a
/// single password replacement. Verification checks the signature, the
/// algorithm, the expiry, and the purpose discriminator before any claim is
/// returned. Uses HS256 (HMAC with SHA-256).
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenCodec {
    /// Create a codec over a signing secret.
    ///
    /// # Arguments
    /// * `secret` - symmetric signing key; should be at least 32 bytes and
    ///   come from configuration, never from code
    /// * `ttl_hours` - lifetime applied to every issued token
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a session token for a username.
    pub fn issue_session(&self, username: &str) -> Result<String, TokenError> {
        self.issue(TokenPurpose::Session, username)
    }

    /// Issue a password-reset token for an email address.
    pub fn issue_reset(&self, email: &str) -> Result<String, TokenError> {
        self.issue(TokenPurpose::PasswordReset, email)
    }

    /// Verify a session token and return its username subject.
    ///
    /// # Errors
    /// * `Expired` - the expiry instant has passed
    /// * `Invalid` - bad signature, unexpected algorithm, or missing claims
    /// * `PurposeMismatch` - the token was issued for password reset
    pub fn verify_session(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token, TokenPurpose::Session).map(|c| c.sub)
    }

    /// Verify a password-reset token and return its email subject.
    ///
    /// # Errors
    /// * `Expired` - the expiry instant has passed
    /// * `Invalid` - bad signature, unexpected algorithm, or missing claims
    /// * `PurposeMismatch` - the token was issued for a session
    pub fn verify_reset(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token, TokenPurpose::PasswordReset)
            .map(|c| c.sub)
    }

    fn issue(&self, purpose: TokenPurpose, subject: &str) -> Result<String, TokenError> {
        let claims = Claims::new(purpose, subject, Utc::now(), self.ttl);
        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    fn verify(&self, token: &str, expected: TokenPurpose) -> Result<Claims, TokenError> {
        // Only the configured algorithm is accepted; `exp` is mandatory and
        // validated, and `sub`/`purpose` are mandatory through the Claims
        // shape itself.
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid(e.to_string()),
                }
            })?;

        let claims = token_data.claims;
        if claims.purpose != expected {
            return Err(TokenError::PurposeMismatch {
                expected,
                actual: claims.purpose,
            });
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    #[test]
    fn test_issue_and_verify_session() {
        let codec = TokenCodec::new(SECRET, 24);

        let token = codec.issue_session("alice").expect("Failed to issue");
        assert!(!token.is_empty());

        let username = codec.verify_session(&token).expect("Failed to verify");
        assert_eq!(username, "alice");
    }

    #[test]
    fn test_issue_and_verify_reset() {
        let codec = TokenCodec::new(SECRET, 24);

        let token = codec
            .issue_reset("alice@example.com")
            .expect("Failed to issue");

        let email = codec.verify_reset(&token).expect("Failed to verify");
        assert_eq!(email, "alice@example.com");
    }

    #[test]
    fn test_session_token_rejected_as_reset() {
        let codec = TokenCodec::new(SECRET, 24);

        let token = codec.issue_session("alice").unwrap();
        let result = codec.verify_reset(&token);

        assert!(matches!(
            result,
            Err(TokenError::PurposeMismatch {
                expected: TokenPurpose::PasswordReset,
                actual: TokenPurpose::Session,
            })
        ));
    }

    #[test]
    fn test_reset_token_rejected_as_session() {
        let codec = TokenCodec::new(SECRET, 24);

        let token = codec.issue_reset("alice@example.com").unwrap();
        let result = codec.verify_session(&token);

        assert!(matches!(
            result,
            Err(TokenError::PurposeMismatch {
                expected: TokenPurpose::Session,
                actual: TokenPurpose::PasswordReset,
            })
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // A negative lifetime produces an already-expired token.
        let issuing = TokenCodec::new(SECRET, -1);
        let verifying = TokenCodec::new(SECRET, 24);

        let token = issuing.issue_session("alice").unwrap();
        let result = verifying.verify_session(&token);

        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let codec1 = TokenCodec::new(b"secret1_at_least_32_bytes_long_key!", 24);
        let codec2 = TokenCodec::new(b"secret2_at_least_32_bytes_long_key!", 24);

        let token = codec1.issue_session("alice").unwrap();
        let result = codec2.verify_session(&token);

        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let codec = TokenCodec::new(SECRET, 24);

        let result = codec.verify_session("not.a.token");
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_foreign_token_without_purpose_rejected() {
        // A token signed with the right secret but missing the purpose claim
        // must not verify for either kind.
        #[derive(serde::Serialize)]
        struct BareClaims {
            sub: String,
            exp: i64,
        }

        let codec = TokenCodec::new(SECRET, 24);
        let claims = BareClaims {
            sub: "alice".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            codec.verify_session(&token),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            codec.verify_reset(&token),
            Err(TokenError::Invalid(_))
        ));
    }
}
