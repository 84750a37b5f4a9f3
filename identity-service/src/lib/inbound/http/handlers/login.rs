use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiSuccess;
use super::JsonBody;
use super::SessionResponseData;
use crate::identity::models::LoginInput;
use crate::identity::ports::IdentityServicePort;
use crate::inbound::http::errors::ApiError;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequestBody>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    state
        .identity_service
        .login(body.into())
        .await
        .map_err(ApiError::from)
        .map(|ref session| ApiSuccess::new(StatusCode::OK, session.into()))
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequestBody {
    email: Option<String>,
    password: Option<String>,
}

impl From<LoginRequestBody> for LoginInput {
    fn from(body: LoginRequestBody) -> Self {
        LoginInput {
            email: body.email,
            password: body.password,
        }
    }
}
