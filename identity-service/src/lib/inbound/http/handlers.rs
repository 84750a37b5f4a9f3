use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::errors::ApiError;
use crate::identity::models::AuthSession;
use crate::identity::models::Identity;

pub mod health;
pub mod login;
pub mod profile;
pub mod register;

/// Successful response; `data` is the whole JSON body.
#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// JSON request body whose rejections are reported as validation failures.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Public view of an identity. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for UserData {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            name: identity.name.as_str().to_string(),
            email: identity.email.as_str().to_string(),
            created_at: identity.created_at,
        }
    }
}

/// Body returned by register and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponseData {
    pub user: UserData,
    pub token: String,
}

impl From<&AuthSession> for SessionResponseData {
    fn from(session: &AuthSession) -> Self {
        Self {
            user: (&session.identity).into(),
            token: session.token.clone(),
        }
    }
}

/// Fallback for requests no route matches.
pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// The path exists but not for this method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
