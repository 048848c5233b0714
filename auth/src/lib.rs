//! Credential infrastructure library
//!
//! Provides the two security-critical building blocks of the account service:
//! - Password hashing (Argon2id)
//! - Purpose-discriminated token issuance and verification (HS256 JWT)
//!
//! Both are stateless once constructed and safe to share across requests.
//! The signing secret and token lifetime are injected at construction; nothing
//! in this crate reads ambient process state.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Tokens
//! ```
//! use auth::TokenCodec;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!", 24);
//!
//! // Session tokens carry a username subject
//! let token = codec.issue_session("alice").unwrap();
//! assert_eq!(codec.verify_session(&token).unwrap(), "alice");
//!
//! // A session token is never accepted where a reset token is expected
//! assert!(codec.verify_reset(&token).is_err());
//! ```

pub mod password;
pub mod token;

// Re-export commonly used items
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::Claims;
pub use token::TokenCodec;
pub use token::TokenError;
pub use token::TokenPurpose;
