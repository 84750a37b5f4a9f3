use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiSuccess;
use super::JsonBody;
use super::SessionResponseData;
use crate::identity::models::RegistrationInput;
use crate::identity::ports::IdentityServicePort;
use crate::inbound::http::errors::ApiError;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequestBody>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    state
        .identity_service
        .register(body.into())
        .await
        .map_err(ApiError::from)
        .map(|ref session| ApiSuccess::new(StatusCode::CREATED, session.into()))
}

/// HTTP request body for registration (raw JSON). Missing fields are
/// reported by validation, not by deserialization.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequestBody {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

impl From<RegisterRequestBody> for RegistrationInput {
    fn from(body: RegisterRequestBody) -> Self {
        RegistrationInput {
            name: body.name,
            email: body.email,
            password: body.password,
        }
    }
}
