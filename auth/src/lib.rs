//! Authentication utilities library
//!
//! Provides the credential primitives used by the identity service:
//! - Password hashing (Argon2id, tunable cost)
//! - JWT bearer token issuance and verification
//! - Authentication coordination (timing-uniform credential checks)
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
//! ## JWT Tokens
//! ```
//! use auth::JwtHandler;
//! use chrono::Duration;
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!");
//! let token = handler.issue("user123", Duration::hours(1)).unwrap();
//! assert_eq!(handler.verify(&token).unwrap(), "user123");
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::Authenticator;
//! use chrono::Duration;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!");
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and generate token
//! auth.verify_credentials("password123", Some(&hash)).unwrap();
//! let token = auth.issue_token("user123", Duration::hours(1)).unwrap();
//!
//! // Validate token
//! assert_eq!(auth.validate_token(&token).unwrap(), "user123");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::HashCost;
pub use password::PasswordError;
pub use password::PasswordHasher;
