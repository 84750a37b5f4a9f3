use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::identity::errors::DisplayNameError;
use crate::identity::errors::EmailError;
use crate::identity::errors::IdentityIdError;
use crate::identity::errors::PasswordPolicyError;

/// Identity aggregate entity.
///
/// Represents a registered user. `password_hash` never leaves the service:
/// response types are built from the other fields only.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: IdentityId,
    pub name: DisplayName,
    pub email: EmailAddress,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Identity unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    /// Generate a new random identity ID.
    ///
    /// # Returns
    /// IdentityId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identity ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, IdentityIdError> {
        Uuid::parse_str(s)
            .map(IdentityId)
            .map_err(|e| IdentityIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name value type
///
/// Ensures the name is non-blank and at most 100 characters. Surrounding
/// whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    const MAX_LENGTH: usize = 100;

    /// Create a new valid display name.
    ///
    /// # Errors
    /// * `Empty` - Name is empty or only whitespace
    /// * `TooLong` - Name longer than 100 characters
    pub fn new(name: String) -> Result<Self, DisplayNameError> {
        let name = name.trim();
        let length = name.chars().count();

        if length == 0 {
            Err(DisplayNameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(DisplayNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser. Stored trimmed and
/// lowercased, which makes it the case-insensitive identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `Empty` - Email is empty or only whitespace
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = Self::normalize(&email);

        if email.is_empty() {
            return Err(EmailError::Empty);
        }

        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Canonical form used for lookups, without format validation.
    pub fn normalize(email: &str) -> String {
        email.trim().to_lowercase()
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

/// Plaintext password supplied with a single request.
///
/// Its `Debug` output is redacted so it cannot end up in logs.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;
    const MAX_LENGTH: usize = 128;

    /// Accept a password that satisfies the strength policy.
    ///
    /// # Errors
    /// * `Empty` - Password is empty
    /// * `TooShort` - Fewer than 8 characters
    /// * `TooLong` - More than 128 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();

        if length == 0 {
            Err(PasswordPolicyError::Empty)
        } else if length < Self::MIN_LENGTH {
            Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(PasswordPolicyError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(password))
        }
    }

    /// Accept any non-empty password, without the strength policy (login).
    ///
    /// # Errors
    /// * `Empty` - Password is empty
    pub fn presented(password: String) -> Result<Self, PasswordPolicyError> {
        if password.is_empty() {
            Err(PasswordPolicyError::Empty)
        } else {
            Ok(Self(password))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Raw registration input, as received.
#[derive(Clone, Default)]
pub struct RegistrationInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for RegistrationInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Raw login input, as received.
#[derive(Clone, Default)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Command to register a new identity with validated fields
#[derive(Debug)]
pub struct RegisterCommand {
    pub name: DisplayName,
    pub email: EmailAddress,
    pub password: Password,
}

/// Command to log into an existing identity.
///
/// `email` is normalized but not format-checked.
#[derive(Debug)]
pub struct LoginCommand {
    pub email: String,
    pub password: Password,
}

/// Outcome of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub identity: Identity,
    pub token: String,
}
