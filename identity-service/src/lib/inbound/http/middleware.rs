use std::sync::Arc;

use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::errors::ApiError;
use crate::domain::identity::models::Identity;
use crate::identity::ports::IdentityServicePort;
use crate::inbound::http::router::AppState;

const BEARER_SCHEME: &str = "Bearer";

/// Extension type holding the identity resolved from the bearer token.
///
/// Read-only for handlers; shared so cloning the extension is cheap.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity(Arc<Identity>);

impl AuthenticatedIdentity {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

/// Middleware that validates the bearer token and adds the identity to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(req.headers())?;

    let identity = state
        .identity_service
        .authenticate(token)
        .await
        .map_err(ApiError::from)?;

    tracing::debug!(identity_id = %identity.id, "Request authenticated");

    req.extensions_mut()
        .insert(AuthenticatedIdentity(Arc::new(identity)));

    Ok(next.run(req).await)
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// An absent header or an empty token means no token was provided; anything
/// else that is not a bearer credential is an invalid token.
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(ApiError::NoToken);
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::InvalidToken)?
        .trim();

    if value.is_empty() {
        return Err(ApiError::NoToken);
    }

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(ApiError::InvalidToken);
    }

    match token.trim() {
        "" => Err(ApiError::NoToken),
        token => Ok(token),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        for value in ["Bearer abc.def.ghi", "bearer   abc.def.ghi "] {
            let map = headers(value);
            assert_eq!(extract_bearer_token(&map).unwrap(), "abc.def.ghi");
        }
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert!(matches!(
            extract_bearer_token(&HeaderMap::new()),
            Err(ApiError::NoToken)
        ));
        for value in ["", "Bearer", "Bearer "] {
            assert!(matches!(
                extract_bearer_token(&headers(value)),
                Err(ApiError::NoToken)
            ));
        }
    }

    #[test]
    fn test_other_schemes_are_invalid() {
        for value in ["Basic dXNlcjpwYXNz", "Token abc", "abc.def.ghi"] {
            assert!(matches!(
                extract_bearer_token(&headers(value)),
                Err(ApiError::InvalidToken)
            ));
        }
    }
}
