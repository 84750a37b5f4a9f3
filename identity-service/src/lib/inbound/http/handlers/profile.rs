use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiSuccess;
use super::UserData;
use crate::inbound::http::middleware::AuthenticatedIdentity;

pub async fn profile(
    Extension(authenticated): Extension<AuthenticatedIdentity>,
) -> ApiSuccess<ProfileResponseData> {
    ApiSuccess::new(
        StatusCode::OK,
        ProfileResponseData {
            user: authenticated.identity().into(),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileResponseData {
    pub user: UserData,
}
