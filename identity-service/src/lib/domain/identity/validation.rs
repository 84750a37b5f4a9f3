use crate::identity::errors::EmailError;
use crate::identity::errors::FieldError;
use crate::identity::errors::ValidationError;
use crate::identity::models::DisplayName;
use crate::identity::models::EmailAddress;
use crate::identity::models::LoginCommand;
use crate::identity::models::LoginInput;
use crate::identity::models::Password;
use crate::identity::models::RegisterCommand;
use crate::identity::models::RegistrationInput;

/// Validate registration input into a command.
///
/// Every field is checked; the error lists all failures, not only the first.
///
/// # Errors
/// * `ValidationError` - At least one of name, email or password is rejected
pub fn validate_registration(input: RegistrationInput) -> Result<RegisterCommand, ValidationError> {
    let mut failures = Vec::new();

    let name = DisplayName::new(input.name.unwrap_or_default())
        .map_err(|e| failures.push(FieldError::new("name", e)))
        .ok();
    let email = EmailAddress::new(input.email.unwrap_or_default())
        .map_err(|e| failures.push(FieldError::new("email", e)))
        .ok();
    let password = Password::new(input.password.unwrap_or_default())
        .map_err(|e| failures.push(FieldError::new("password", e)))
        .ok();

    match (name, email, password) {
        (Some(name), Some(email), Some(password)) => Ok(RegisterCommand {
            name,
            email,
            password,
        }),
        _ => Err(ValidationError::new(failures)),
    }
}

/// Validate login input into a command.
///
/// Only presence is checked; the email is normalized for lookup.
///
/// # Errors
/// * `ValidationError` - Email or password missing or blank
pub fn validate_login(input: LoginInput) -> Result<LoginCommand, ValidationError> {
    let mut failures = Vec::new();

    let email = EmailAddress::normalize(input.email.as_deref().unwrap_or_default());
    if email.is_empty() {
        failures.push(FieldError::new("email", EmailError::Empty));
    }

    let password = Password::presented(input.password.unwrap_or_default())
        .map_err(|e| failures.push(FieldError::new("password", e)))
        .ok();

    match password {
        Some(password) if failures.is_empty() => Ok(LoginCommand { email, password }),
        _ => Err(ValidationError::new(failures)),
    }
}
