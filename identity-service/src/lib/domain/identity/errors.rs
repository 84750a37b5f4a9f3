use std::fmt;

use thiserror::Error;

/// Error for IdentityId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for DisplayName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DisplayNameError {
    #[error("name is required")]
    Empty,

    #[error("name must be at most {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("email is required")]
    Empty,

    #[error("email is not a valid email address: {0}")]
    InvalidFormat(String),
}

/// Error for password policy failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("password is required")]
    Empty,

    #[error("password must be at least {min} characters long")]
    TooShort { min: usize, actual: usize },

    #[error("password must be at most {max} characters long")]
    TooLong { max: usize, actual: usize },
}

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, error: impl fmt::Display) -> Self {
        Self {
            field,
            message: error.to_string(),
        }
    }
}

/// Structural rejection of registration or login input.
///
/// Lists every failing field; the rendered message always names them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(fields: Vec<FieldError>) -> Self {
        Self { fields }
    }

    /// Rejection of a body that could not be read at all.
    pub fn malformed_body(reason: impl fmt::Display) -> Self {
        Self::new(vec![FieldError::new("body", reason)])
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request validation failed")?;
        for (i, field) in self.fields.iter().enumerate() {
            let separator = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", separator, field.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Top-level error for all identity-related operations
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // Domain-level errors
    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Identity not found: {0}")]
    NotFound(String),

    // Infrastructure errors
    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
