use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;
use serde::Deserialize;

use super::errors::PasswordError;

/// Plaintext used to build the hash that absorbs verifications for unknown identities.
const DUMMY_PASSWORD: &str = "dummy-password-for-timing-equalisation";

/// Argon2id cost parameters.
///
/// Higher values make every hash (and therefore every brute-force guess) slower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HashCost {
    /// Memory size in KiB
    pub memory_kib: u32,
    /// Number of passes over memory
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Password hashing implementation.
///
/// Provides cryptographic password hashing (internally uses Argon2id).
pub struct PasswordHasher {
    params: Params,
    dummy_hash: Option<String>,
}

impl PasswordHasher {
    /// Create a new password hasher instance.
    ///
    /// # Returns
    /// PasswordHasher instance configured with secure defaults
    pub fn new() -> Self {
        Self::from_params(Params::default())
    }

    /// Create a password hasher with explicit cost parameters.
    ///
    /// # Errors
    /// * `InvalidCost` - Parameters are outside the ranges Argon2 accepts
    pub fn with_cost(cost: HashCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::InvalidCost(e.to_string()))?;

        Ok(Self::from_params(params))
    }

    /// The dummy hash is built here so the first unknown-identity login
    /// costs the same as every later one.
    fn from_params(params: Params) -> Self {
        let mut hasher = Self {
            params,
            dummy_hash: None,
        };
        hasher.dummy_hash = hasher.hash(DUMMY_PASSWORD).ok();
        hasher
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password securely.
    ///
    /// Uses Argon2id with random salt generation.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `InvalidInput` - Password is empty
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// The comparison is constant-time; the cost parameters are read from the stored hash.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored password hash in PHC string format
    ///
    /// # Returns
    /// True if password matches, false otherwise
    ///
    /// # Errors
    /// * `Integrity` - Stored hash is not a valid PHC string
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| PasswordError::Integrity(e.to_string()))?;

        Ok(self
            .argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Spend the same work as a real verification without any stored hash.
    ///
    /// Used when the identity being authenticated does not exist, so that the
    /// miss costs as much as a wrong password.
    pub fn verify_dummy(&self, password: &str) {
        match &self.dummy_hash {
            Some(hash) => {
                let _ = self.verify(password, hash);
            }
            None => tracing::error!("Dummy password hash unavailable"),
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_cost(HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("valid cost")
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let password = "my_secure_password";

        // Hash the password
        let hash = hasher.hash(password).expect("Failed to hash password");

        // Verify correct password
        assert!(hasher
            .verify(password, &hash)
            .expect("Failed to verify password"));

        // Verify incorrect password
        assert!(!hasher
            .verify("wrong_password", &hash)
            .expect("Failed to verify password"));
    }

    #[test]
    fn test_hash_is_salted_and_never_plaintext() {
        let hasher = fast_hasher();

        let first = hasher.hash("SecurePass123!").unwrap();
        let second = hasher.hash("SecurePass123!").unwrap();

        assert_ne!(first, "SecurePass123!");
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_length_is_fixed_for_a_cost() {
        let hasher = fast_hasher();

        let short = hasher.hash("abcdefgh").unwrap();
        let long = hasher.hash("a much longer passphrase with spaces").unwrap();

        assert_eq!(short.len(), long.len());
    }

    #[test]
    fn test_hash_empty_password_is_rejected() {
        let hasher = fast_hasher();
        let result = hasher.hash("");
        assert!(matches!(result, Err(PasswordError::InvalidInput(_))));
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = fast_hasher();
        let result = hasher.verify("password", "invalid_hash");
        assert!(matches!(result, Err(PasswordError::Integrity(_))));
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        let result = PasswordHasher::with_cost(HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(PasswordError::InvalidCost(_))));
    }

    #[test]
    fn test_dummy_hash_is_ready_after_construction() {
        let hasher = fast_hasher();

        let dummy = hasher.dummy_hash.as_deref().expect("dummy hash built");
        assert!(dummy.starts_with("$argon2id$"));
        assert!(hasher.verify(DUMMY_PASSWORD, dummy).unwrap());
    }

    #[test]
    fn test_verify_dummy_does_not_panic() {
        let hasher = fast_hasher();
        hasher.verify_dummy("anything");
        hasher.verify_dummy("");
    }
}
