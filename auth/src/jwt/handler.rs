use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::JwtError;

/// JWT token handler for issuing and verifying bearer tokens.
///
/// Uses HS256 (HMAC with SHA-256). The signing secret is fixed at construction.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Returns
    /// JwtHandler instance configured with HS256 algorithm
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Issue a signed token for `subject`, valid for `ttl`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, JwtError> {
        self.encode(&Claims::for_subject(subject, ttl))
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify a token and return its subject.
    ///
    /// # Errors
    /// * `Malformed` - Token does not have the issued shape or cannot be decoded
    /// * `BadSignature` - Token was tampered with or signed with another secret
    /// * `Expired` - Token is well-formed and signed, but past its expiration
    pub fn verify(&self, token: &str) -> Result<String, JwtError> {
        self.decode(token).map(|claims| claims.sub)
    }

    /// Decode and validate a JWT token.
    ///
    /// # Errors
    /// Same as [`JwtHandler::verify`].
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        check_shape(token)?;

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => JwtError::BadSignature,
                    ErrorKind::ExpiredSignature => JwtError::Expired,
                    _ => JwtError::Malformed(e.to_string()),
                }
            })?;

        // The library accepts `exp == now`; a token is only valid strictly before it.
        if token_data.claims.is_expired(Utc::now().timestamp()) {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims)
    }
}

/// Three non-empty, dot-separated base64url segments.
fn check_shape(token: &str) -> Result<(), JwtError> {
    let segments: Vec<&str> = token.split('.').collect();

    if segments.len() != 3 {
        return Err(JwtError::Malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let is_base64url = |segment: &&str| {
        !segment.is_empty()
            && segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    };

    if !segments.iter().all(is_base64url) {
        return Err(JwtError::Malformed(
            "segments must be non-empty base64url".to_string(),
        ));
    }

    Ok(())
}
