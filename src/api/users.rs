//! User management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{CreateUser, Loan, Role, RoleProfile, User},
};

/// Public view of a user; the password never leaves the server
#[derive(Serialize, ToSchema)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub borrow_limit: usize,
    pub blocked: bool,
    pub profile: RoleProfile,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            role: user.role(),
            borrow_limit: user.borrow_limit(),
            name: user.name,
            email: user.email,
            blocked: user.blocked,
            profile: user.profile,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SetBlockedRequest {
    pub blocked: bool,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserInfo),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<UserInfo>)> {
    let user = state.services.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Get a user by email
#[utoipa::path(
    get,
    path = "/users/{email}",
    tag = "users",
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "User details", body = UserInfo),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<UserInfo>> {
    let user = state.services.users.find_by_email(&email).await?;
    Ok(Json(user.into()))
}

/// Loan history of a user
#[utoipa::path(
    get,
    path = "/users/{email}/loans",
    tag = "users",
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "All loans of the user, oldest first", body = Vec<Loan>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_loans(
    State(state): State<crate::AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.lending.list_loans_for(&email).await?;
    Ok(Json(loans))
}

/// Set or clear the blocked flag by hand
#[utoipa::path(
    put,
    path = "/users/{email}/blocked",
    tag = "users",
    params(
        ("email" = String, Path, description = "User email")
    ),
    request_body = SetBlockedRequest,
    responses(
        (status = 200, description = "Updated user", body = UserInfo),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_blocked(
    State(state): State<crate::AppState>,
    Path(email): Path<String>,
    Json(request): Json<SetBlockedRequest>,
) -> AppResult<Json<UserInfo>> {
    let user = state
        .services
        .lending
        .set_user_blocked(&email, request.blocked)
        .await?;
    Ok(Json(user.into()))
}
