use thiserror::Error;

/// Error type for JWT operations.
///
/// Verification failures stay distinguishable here; callers facing the
/// outside world are expected to collapse them into a single condition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature does not match")]
    BadSignature,

    #[error("Token is expired")]
    Expired,
}
