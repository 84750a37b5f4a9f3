use std::any::Any;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use super::request_context::RequestContext;
use crate::identity::errors::IdentityError;
use crate::identity::errors::ValidationError;

/// Every failure the HTTP surface can report.
///
/// This is the only type rendered as an error body; the mapping from kind to
/// status and message lives in [`ApiError::status`] and [`ApiError::message`].
#[derive(Debug, Clone)]
pub enum ApiError {
    ValidationError(ValidationError),
    DuplicateIdentity,
    InvalidCredentials,
    NoToken,
    InvalidToken,
    RouteNotFound,
    MethodNotAllowed,
    /// Internal detail, logged and only shown outside production.
    Unexpected(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateIdentity => StatusCode::CONFLICT,
            ApiError::InvalidCredentials | ApiError::NoToken | ApiError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::ValidationError(e) => e.to_string(),
            ApiError::DuplicateIdentity => "An account with this email already exists".to_string(),
            ApiError::InvalidCredentials => "Invalid email or password".to_string(),
            ApiError::NoToken => "Access denied. No token provided.".to_string(),
            ApiError::InvalidToken => "Invalid token.".to_string(),
            ApiError::RouteNotFound => "Route not found".to_string(),
            ApiError::MethodNotAllowed => "Method not allowed".to_string(),
            ApiError::Unexpected(_) => "Internal server error".to_string(),
        }
    }

    fn kind(&self) -> Option<&'static str> {
        match self {
            ApiError::ValidationError(_) => Some("validation"),
            _ => None,
        }
    }

    fn log(&self, request_id: &str) {
        match self {
            ApiError::Unexpected(detail) => {
                tracing::error!(request_id, error = %detail, "Unexpected failure")
            }
            ApiError::InvalidCredentials | ApiError::NoToken | ApiError::InvalidToken => {
                tracing::warn!(request_id, status = self.status().as_u16(), "{}", self.message())
            }
            _ => tracing::debug!(request_id, status = self.status().as_u16(), "{}", self.message()),
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (request_id, expose_internals) = match RequestContext::current() {
            Some(context) => (context.request_id, context.expose_internals),
            // Outside the request middleware nothing is known about the
            // environment, so assume production.
            None => (Uuid::new_v4().to_string(), false),
        };

        self.log(&request_id);

        let envelope = ErrorEnvelope {
            error: self.message(),
            kind: self.kind(),
            request_id,
            stack: expose_internals.then(|| format!("{:?}", self)),
        };

        (self.status(), Json(envelope)).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Validation(e) => ApiError::ValidationError(e),
            IdentityError::EmailAlreadyExists(_) => ApiError::DuplicateIdentity,
            IdentityError::InvalidCredentials => ApiError::InvalidCredentials,
            IdentityError::InvalidToken => ApiError::InvalidToken,
            IdentityError::NotFound(_)
            | IdentityError::Password(_)
            | IdentityError::Token(_)
            | IdentityError::DatabaseError(_)
            | IdentityError::Unknown(_) => ApiError::Unexpected(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationError(ValidationError::malformed_body(rejection.body_text()))
    }
}

/// Response for a handler that panicked, installed on `CatchPanicLayer`.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Unexpected(format!("Handler panicked: {}", detail)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;
    use crate::config::Environment;
    use crate::identity::errors::FieldError;

    async fn render(error: ApiError, environment: Environment) -> (StatusCode, Value) {
        let context = RequestContext::new("req-1".to_string(), environment);
        let response = context.scope(async move { error.into_response() }).await;

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_status_and_message_table() {
        let cases = [
            (ApiError::DuplicateIdentity, 409, "An account with this email already exists"),
            (ApiError::InvalidCredentials, 401, "Invalid email or password"),
            (ApiError::NoToken, 401, "Access denied. No token provided."),
            (ApiError::InvalidToken, 401, "Invalid token."),
            (ApiError::RouteNotFound, 404, "Route not found"),
            (ApiError::MethodNotAllowed, 405, "Method not allowed"),
            (ApiError::Unexpected("pool timed out".to_string()), 500, "Internal server error"),
        ];

        for (error, status, message) in cases {
            let (actual_status, body) = render(error, Environment::Production).await;
            assert_eq!(actual_status.as_u16(), status);
            assert_eq!(body["error"], message);
            assert_eq!(body["requestId"], "req-1");
            assert!(body.get("type").is_none());
        }
    }

    #[tokio::test]
    async fn test_validation_envelope() {
        let error = ApiError::ValidationError(ValidationError::new(vec![FieldError::new(
            "password",
            "password must be at least 8 characters long",
        )]));

        let (status, body) = render(error, Environment::Development).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "validation");
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("validation"));
        assert!(message.contains("password"));
    }

    #[tokio::test]
    async fn test_stack_only_outside_production() {
        let error = ApiError::Unexpected("connection refused".to_string());

        let (_, development) = render(error.clone(), Environment::Development).await;
        assert!(development["stack"]
            .as_str()
            .unwrap()
            .contains("connection refused"));

        let (_, production) = render(error, Environment::Production).await;
        assert!(production.get("stack").is_none());
        assert!(!production.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_without_context_request_id_is_still_present() {
        let response = ApiError::RouteNotFound.into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();

        assert!(!body["requestId"].as_str().unwrap().is_empty());
        assert!(body.get("stack").is_none());
    }

    #[test]
    fn test_identity_errors_collapse_to_taxonomy() {
        assert!(matches!(
            ApiError::from(IdentityError::EmailAlreadyExists("a@b.c".to_string())),
            ApiError::DuplicateIdentity
        ));
        assert!(matches!(
            ApiError::from(IdentityError::DatabaseError("boom".to_string())),
            ApiError::Unexpected(_)
        ));
        assert!(matches!(
            ApiError::from(IdentityError::InvalidToken),
            ApiError::InvalidToken
        ));
    }

    #[tokio::test]
    async fn test_panic_is_reported_as_unexpected() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
