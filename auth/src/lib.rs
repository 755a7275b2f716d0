//! Authentication infrastructure library
//!
//! Provides the security primitives the identity service builds on:
//! - Password hashing (Argon2id)
//! - Signed, time-bounded session tokens (JWT, HS256)
//!
//! The library is deliberately domain-free: token subjects are opaque strings
//! and the service layer decides what they identify.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::TokenIssuer;
//!
//! let issuer = TokenIssuer::new(b"secret_key_at_least_32_bytes_long!");
//! let token = issuer.issue("account-123").unwrap();
//! assert_eq!(issuer.verify(&token).unwrap(), "account-123");
//! ```

pub mod password;
pub mod token;

// Re-export commonly used items
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::Claims;
pub use token::TokenError;
pub use token::TokenIssuer;
pub use token::TOKEN_VALIDITY_SECONDS;
