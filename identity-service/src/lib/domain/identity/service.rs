use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Duration;
use chrono::Utc;

use crate::domain::identity::models::AuthSession;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::LoginInput;
use crate::domain::identity::models::RegistrationInput;
use crate::domain::identity::validation::validate_login;
use crate::domain::identity::validation::validate_registration;
use crate::identity::errors::IdentityError;
use crate::identity::ports::IdentityRepository;
use crate::identity::ports::IdentityServicePort;

/// Domain service implementation for identity operations.
///
/// Concrete implementation of IdentityServicePort with dependency injection.
pub struct IdentityService<R>
where
    R: IdentityRepository,
{
    repository: Arc<R>,
    authenticator: Arc<Authenticator>,
    token_ttl: Duration,
}

impl<R> IdentityService<R>
where
    R: IdentityRepository,
{
    /// Create a new identity service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Identity persistence implementation
    /// * `authenticator` - Password hashing and token signing
    /// * `token_ttl` - Lifetime of issued tokens
    ///
    /// # Returns
    /// Configured identity service instance
    pub fn new(repository: Arc<R>, authenticator: Arc<Authenticator>, token_ttl: Duration) -> Self {
        Self {
            repository,
            authenticator,
            token_ttl,
        }
    }

    fn open_session(&self, identity: Identity) -> Result<AuthSession, IdentityError> {
        let token = self
            .authenticator
            .issue_token(&identity.id.to_string(), self.token_ttl)
            .map_err(|e| IdentityError::Token(e.to_string()))?;

        Ok(AuthSession { identity, token })
    }

    async fn hash_password(&self, password: String) -> Result<String, IdentityError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| IdentityError::Unknown(format!("Password hashing task failed: {}", e)))?
            .map_err(IdentityError::from)
    }

    async fn verify_password(
        &self,
        password: String,
        stored_hash: Option<String>,
    ) -> Result<(), IdentityError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || {
            authenticator.verify_credentials(&password, stored_hash.as_deref())
        })
        .await
        .map_err(|e| IdentityError::Unknown(format!("Password verification task failed: {}", e)))?
        .map_err(|e| match e {
            AuthenticationError::PasswordError(err) => IdentityError::Password(err),
            _ => IdentityError::InvalidCredentials,
        })
    }
}

#[async_trait]
impl<R> IdentityServicePort for IdentityService<R>
where
    R: IdentityRepository,
{
    async fn register(&self, input: RegistrationInput) -> Result<AuthSession, IdentityError> {
        let command = validate_registration(input)?;

        if self
            .repository
            .find_by_email(command.email.as_str())
            .await?
            .is_some()
        {
            return Err(IdentityError::EmailAlreadyExists(
                command.email.as_str().to_string(),
            ));
        }

        let password_hash = self
            .hash_password(command.password.expose().to_string())
            .await?;

        let identity = Identity {
            id: IdentityId::new(),
            name: command.name,
            email: command.email,
            password_hash,
            created_at: Utc::now(),
        };

        let created = self.repository.create(identity).await?;
        tracing::info!(identity_id = %created.id, "Identity registered");

        self.open_session(created)
    }

    async fn login(&self, input: LoginInput) -> Result<AuthSession, IdentityError> {
        let command = validate_login(input)?;

        let identity = self.repository.find_by_email(&command.email).await?;
        let stored_hash = identity.as_ref().map(|i| i.password_hash.clone());

        self.verify_password(command.password.expose().to_string(), stored_hash)
            .await?;

        // verify_password only succeeds when a stored hash was present
        let identity = identity.ok_or(IdentityError::InvalidCredentials)?;
        tracing::info!(identity_id = %identity.id, "Identity logged in");

        self.open_session(identity)
    }

    async fn authenticate(&self, token: &str) -> Result<Identity, IdentityError> {
        let subject = self.authenticator.validate_token(token).map_err(|e| {
            tracing::debug!(error = ?e, "Bearer token rejected");
            IdentityError::InvalidToken
        })?;

        let id = IdentityId::from_string(&subject).map_err(|_| IdentityError::InvalidToken)?;

        self.repository.find_by_id(&id).await?.ok_or_else(|| {
            tracing::debug!(identity_id = %id, "Token subject no longer exists");
            IdentityError::InvalidToken
        })
    }
}

#[cfg(test)]
mod tests {
    use auth::HashCost;
    use mockall::mock;

    use super::*;
    use crate::domain::identity::models::DisplayName;
    use crate::domain::identity::models::EmailAddress;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    mock! {
        pub TestIdentityRepository {}

        #[async_trait]
        impl IdentityRepository for TestIdentityRepository {
            async fn create(&self, identity: Identity) -> Result<Identity, IdentityError>;
            async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityError>;
            async fn delete(&self, id: &IdentityId) -> Result<(), IdentityError>;
        }
    }

    fn test_authenticator() -> Arc<Authenticator> {
        Arc::new(
            Authenticator::with_cost(
                SECRET,
                HashCost {
                    memory_kib: 1024,
                    iterations: 1,
                    parallelism: 1,
                },
            )
            .unwrap(),
        )
    }

    fn service(repository: MockTestIdentityRepository) -> IdentityService<MockTestIdentityRepository> {
        IdentityService::new(
            Arc::new(repository),
            test_authenticator(),
            Duration::minutes(60),
        )
    }

    fn stored_identity(authenticator: &Authenticator, password: &str) -> Identity {
        Identity {
            id: IdentityId::new(),
            name: DisplayName::new("John Doe".to_string()).unwrap(),
            email: EmailAddress::new("john@example.com".to_string()).unwrap(),
            password_hash: authenticator.hash_password(password).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn registration() -> RegistrationInput {
        RegistrationInput {
            name: Some("John Doe".to_string()),
            email: Some("John@Example.com".to_string()),
            password: Some("SecurePass123!".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut repository = MockTestIdentityRepository::new();

        repository
            .expect_find_by_email()
            .withf(|email| email == "john@example.com")
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create()
            .withf(|identity| {
                identity.email.as_str() == "john@example.com"
                    && identity.password_hash.starts_with("$argon2id$")
                    && !identity.password_hash.contains("SecurePass123!")
            })
            .times(1)
            .returning(Ok);

        let session = service(repository).register(registration()).await.unwrap();

        assert_eq!(session.identity.name.as_str(), "John Doe");
        let subject = test_authenticator().validate_token(&session.token).unwrap();
        assert_eq!(subject, session.identity.id.to_string());
    }

    #[tokio::test]
    async fn test_register_validation_failure_skips_store() {
        let mut repository = MockTestIdentityRepository::new();
        repository.expect_find_by_email().times(0);
        repository.expect_create().times(0);

        let input = RegistrationInput {
            password: Some("123".to_string()),
            ..registration()
        };

        let result = service(repository).register(input).await;
        match result {
            Err(IdentityError::Validation(e)) => assert!(e.has_field("password")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email_precheck() {
        let authenticator = test_authenticator();
        let existing = stored_identity(&authenticator, "SecurePass123!");

        let mut repository = MockTestIdentityRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repository.expect_create().times(0);

        let result = service(repository).register(registration()).await;
        assert!(matches!(result, Err(IdentityError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_from_store() {
        let mut repository = MockTestIdentityRepository::new();
        repository.expect_find_by_email().returning(|_| Ok(None));
        repository
            .expect_create()
            .times(1)
            .returning(|identity| {
                Err(IdentityError::EmailAlreadyExists(
                    identity.email.as_str().to_string(),
                ))
            });

        let result = service(repository).register(registration()).await;
        assert!(matches!(result, Err(IdentityError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_login_success() {
        let authenticator = test_authenticator();
        let existing = stored_identity(&authenticator, "SecurePass123!");
        let expected_id = existing.id;

        let mut repository = MockTestIdentityRepository::new();
        repository
            .expect_find_by_email()
            .withf(|email| email == "john@example.com")
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));

        let session = service(repository)
            .login(LoginInput {
                email: Some("JOHN@example.com".to_string()),
                password: Some("SecurePass123!".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(session.identity.id, expected_id);
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email_are_identical() {
        let authenticator = test_authenticator();
        let existing = stored_identity(&authenticator, "SecurePass123!");

        let mut repository = MockTestIdentityRepository::new();
        repository
            .expect_find_by_email()
            .returning(move |email| {
                Ok((email == "john@example.com").then(|| existing.clone()))
            });
        let service = service(repository);

        let wrong_password = service
            .login(LoginInput {
                email: Some("john@example.com".to_string()),
                password: Some("WrongPassword!".to_string()),
            })
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginInput {
                email: Some("nobody@example.com".to_string()),
                password: Some("SecurePass123!".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, IdentityError::InvalidCredentials));
        assert!(matches!(unknown_email, IdentityError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_authenticate_resolves_subject() {
        let authenticator = test_authenticator();
        let existing = stored_identity(&authenticator, "SecurePass123!");
        let token = authenticator
            .issue_token(&existing.id.to_string(), Duration::minutes(5))
            .unwrap();
        let expected_id = existing.id;

        let mut repository = MockTestIdentityRepository::new();
        repository
            .expect_find_by_id()
            .withf(move |id| *id == expected_id)
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));

        let identity = service(repository).authenticate(&token).await.unwrap();
        assert_eq!(identity.id, expected_id);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_tokens() {
        let authenticator = test_authenticator();
        let expired = authenticator
            .issue_token(&IdentityId::new().to_string(), Duration::minutes(-5))
            .unwrap();
        let not_a_uuid = authenticator
            .issue_token("user123", Duration::minutes(5))
            .unwrap();

        let mut repository = MockTestIdentityRepository::new();
        repository.expect_find_by_id().times(0);
        let service = service(repository);

        for token in ["garbage", "a.b.c", expired.as_str(), not_a_uuid.as_str()] {
            let result = service.authenticate(token).await;
            assert!(matches!(result, Err(IdentityError::InvalidToken)));
        }
    }

    #[tokio::test]
    async fn test_authenticate_deleted_subject() {
        let token = test_authenticator()
            .issue_token(&IdentityId::new().to_string(), Duration::minutes(5))
            .unwrap();

        let mut repository = MockTestIdentityRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let result = service(repository).authenticate(&token).await;
        assert!(matches!(result, Err(IdentityError::InvalidToken)));
    }
}
