use chrono::Duration;

use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::password::HashCost;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and JWT generation.
///
/// Provides high-level authentication operations by coordinating
/// password hashing and JWT token handling.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Any token verification failure. The inner error is for logs only.
    #[error("Invalid token")]
    InvalidToken(#[source] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(JwtError),
}

impl Authenticator {
    /// Create a new authenticator with default hashing cost.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for JWT signing
    pub fn new(jwt_secret: &[u8]) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(jwt_secret),
        }
    }

    /// Create a new authenticator with an explicit hashing cost.
    ///
    /// # Errors
    /// * `PasswordError` - Cost parameters are invalid
    pub fn with_cost(jwt_secret: &[u8], cost: HashCost) -> Result<Self, PasswordError> {
        Ok(Self {
            password_hasher: PasswordHasher::with_cost(cost)?,
            jwt_handler: JwtHandler::new(jwt_secret),
        })
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed or the password is empty
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password against the stored hash of the identity being logged into.
    ///
    /// `stored_hash` is `None` when no such identity exists; a dummy
    /// verification is still performed so that both failure branches do
    /// comparable work. A malformed stored hash counts as a mismatch.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown identity, wrong password, or unreadable hash
    pub fn verify_credentials(
        &self,
        password: &str,
        stored_hash: Option<&str>,
    ) -> Result<(), AuthenticationError> {
        let Some(stored_hash) = stored_hash else {
            self.password_hasher.verify_dummy(password);
            return Err(AuthenticationError::InvalidCredentials);
        };

        match self.password_hasher.verify(password, stored_hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthenticationError::InvalidCredentials),
            Err(e) => {
                tracing::error!(error = %e, "Stored password hash failed integrity check");
                Err(AuthenticationError::InvalidCredentials)
            }
        }
    }

    /// Issue a bearer token for a subject.
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn issue_token(&self, subject: &str, ttl: Duration) -> Result<String, AuthenticationError> {
        self.jwt_handler
            .issue(subject, ttl)
            .map_err(AuthenticationError::JwtError)
    }

    /// Validate a bearer token and return its subject.
    ///
    /// # Errors
    /// * `InvalidToken` - Malformed, tampered or expired, without saying which
    pub fn validate_token(&self, token: &str) -> Result<String, AuthenticationError> {
        self.jwt_handler
            .verify(token)
            .map_err(AuthenticationError::InvalidToken)
    }
}
