use async_trait::async_trait;

use crate::domain::identity::models::AuthSession;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::LoginInput;
use crate::domain::identity::models::RegistrationInput;
use crate::identity::errors::IdentityError;

/// Port for identity domain service operations.
#[async_trait]
pub trait IdentityServicePort: Send + Sync + 'static {
    /// Register a new identity and open a session for it.
    ///
    /// # Arguments
    /// * `input` - Raw name, email and password
    ///
    /// # Returns
    /// Created identity with a freshly issued token
    ///
    /// # Errors
    /// * `Validation` - Input failed structural validation
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, input: RegistrationInput) -> Result<AuthSession, IdentityError>;

    /// Verify credentials and open a session.
    ///
    /// # Arguments
    /// * `input` - Raw email and password
    ///
    /// # Returns
    /// Matching identity with a freshly issued token
    ///
    /// # Errors
    /// * `Validation` - Email or password missing
    /// * `InvalidCredentials` - Unknown email or wrong password
    /// * `DatabaseError` - Database operation failed
    async fn login(&self, input: LoginInput) -> Result<AuthSession, IdentityError>;

    /// Resolve a bearer token to the identity it was issued for.
    ///
    /// # Errors
    /// * `InvalidToken` - Token does not verify or its subject no longer exists
    /// * `DatabaseError` - Database operation failed
    async fn authenticate(&self, token: &str) -> Result<Identity, IdentityError>;
}

/// Persistence operations for identity aggregate.
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    /// Persist new identity to storage.
    ///
    /// # Arguments
    /// * `identity` - Identity entity to create
    ///
    /// # Returns
    /// Created identity entity
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered (any letter case)
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, identity: Identity) -> Result<Identity, IdentityError>;

    /// Retrieve identity by identifier.
    ///
    /// # Returns
    /// Optional identity entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError>;

    /// Retrieve identity by email address.
    ///
    /// # Arguments
    /// * `email` - Normalized email address string
    ///
    /// # Returns
    /// Optional identity entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityError>;

    /// Remove identity from storage.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, id: &IdentityId) -> Result<(), IdentityError>;
}
