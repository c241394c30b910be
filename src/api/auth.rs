//! Authentication endpoint

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

use super::users::UserInfo;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Check credentials and return the user
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = UserInfo),
        (status = 401, description = "Unknown email or wrong password")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<UserInfo>> {
    let user = state
        .services
        .users
        .authenticate(&request.email, &request.password)
        .await
        .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

    tracing::info!(email = %user.email, "User logged in");
    Ok(Json(user.into()))
}
