use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::SqlErr;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::NoQuery;
use crate::models::user::{
    CreateUserRequest, UserPatch, UserResponse, validate_create_user_request, validate_user_patch,
};
use crate::state::AppState;
use crate::utils::hash;

#[utoipa::path(
    post,
    path = "/user",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create an account",
    description = "Public. The username must be an e-mail address and is immutable afterwards.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip_all, fields(username = %payload.username))]
pub async fn create_user(
    _no_query: NoQuery,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_user_request(&payload)?;

    let username = payload.username.trim().to_string();

    if state
        .identities
        .find_user_by_username(&username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("user already exists".into()));
    }

    let password = hash::hash_password(&payload.password)
        .await
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let now = Utc::now();
    let new_user = user::Model {
        id: Uuid::new_v4().to_string(),
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        username,
        password,
        account_created: now,
        account_updated: now,
    };

    let created = state
        .identities
        .insert_user(new_user)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                tracing::debug!("Registration race: unique constraint caught on insert");
                AppError::Conflict("user already exists".into())
            }
            _ => AppError::from(e),
        })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/user/{user_id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get your own account",
    params(("user_id" = String, Path, description = "User ID; must be the caller's")),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 400, description = "Query string supplied (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Another user's account (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn get_user(
    auth_user: AuthUser,
    _no_query: NoQuery,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_self(&user_id)?;

    let user = find_user(&state, &user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/user/{user_id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update your own account",
    description = "Partial update. Absent fields are left unchanged; `username` may not be sent.",
    params(("user_id" = String, Path, description = "User ID; must be the caller's")),
    request_body = UserPatch,
    responses(
        (status = 204, description = "Account updated"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Another user's account (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn update_user(
    auth_user: AuthUser,
    _no_query: NoQuery,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppJson(patch): AppJson<UserPatch>,
) -> Result<StatusCode, AppError> {
    auth_user.require_self(&user_id)?;
    validate_user_patch(&patch)?;

    let mut user = find_user(&state, &user_id).await?;

    if let Some(first_name) = patch.first_name {
        user.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = patch.last_name {
        user.last_name = last_name.trim().to_string();
    }
    if let Some(password) = patch.password {
        user.password = hash::hash_password(&password)
            .await
            .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;
    }
    user.account_updated = Utc::now();

    state.identities.update_user(user).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_user(state: &AppState, user_id: &str) -> Result<user::Model, AppError> {
    state
        .identities
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))
}
