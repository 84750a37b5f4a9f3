use thiserror::Error;

/// Error type for password operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    /// The plaintext handed to the hasher is unusable (empty).
    #[error("Invalid password input: {0}")]
    InvalidInput(String),

    /// The stored hash could not be parsed.
    #[error("Stored password hash is malformed: {0}")]
    Integrity(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid hashing cost: {0}")]
    InvalidCost(String),
}
