use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::ports::IdentityRepository;
use crate::identity::errors::IdentityError;

/// Process-local identity store for development and tests.
///
/// Uniqueness of email is checked and enforced under the same write lock.
#[derive(Default)]
pub struct InMemoryIdentityRepository {
    identities: RwLock<HashMap<IdentityId, Identity>>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn create(&self, identity: Identity) -> Result<Identity, IdentityError> {
        let mut identities = self.identities.write().await;

        if identities
            .values()
            .any(|existing| existing.email == identity.email)
        {
            return Err(IdentityError::EmailAlreadyExists(
                identity.email.as_str().to_string(),
            ));
        }

        identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError> {
        Ok(self.identities.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityError> {
        let email = EmailAddress::normalize(email);

        Ok(self
            .identities
            .read()
            .await
            .values()
            .find(|identity| identity.email.as_str() == email)
            .cloned())
    }

    async fn delete(&self, id: &IdentityId) -> Result<(), IdentityError> {
        self.identities
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or(IdentityError::NotFound(id.to_string()))
    }
}
