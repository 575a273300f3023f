use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::shared::{double_option, require_non_blank};
use crate::entity::user;
use crate::error::AppError;

/// Request body for account creation.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    /// E-mail address, used as the login name.
    #[schema(example = "jane.doe@example.edu")]
    pub username: String,
    /// At least 8 characters.
    #[schema(example = "skyline-42")]
    pub password: String,
}

pub fn validate_create_user_request(payload: &CreateUserRequest) -> Result<(), AppError> {
    validate_name(&payload.first_name, "first_name")?;
    validate_name(&payload.last_name, "last_name")?;
    require_non_blank(&payload.username, "username")?;
    if payload.password.trim().is_empty() {
        return Err(AppError::Validation("password is required".into()));
    }
    if !is_valid_email(payload.username.trim()) {
        return Err(AppError::Validation("invalid email format".into()));
    }
    validate_password(&payload.password)
}

/// Partial update of the caller's own account.
///
/// `username` is captured only so that its presence can be rejected with a
/// specific message; any other unknown key fails deserialization.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    #[serde(default)]
    #[schema(example = "Janet")]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(ignore)]
    pub username: Option<Option<serde_json::Value>>,
}

pub fn validate_user_patch(patch: &UserPatch) -> Result<(), AppError> {
    if patch.username.is_some() {
        return Err(AppError::Validation("username cannot be changed".into()));
    }
    if let Some(first_name) = &patch.first_name {
        validate_name(first_name, "first_name")?;
    }
    if let Some(last_name) = &patch.last_name {
        validate_name(last_name, "last_name")?;
    }
    if let Some(password) = &patch.password {
        validate_password(password)?;
    }
    Ok(())
}

/// Public view of an account. The password hash is never serialized.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = "0f8e4c1a-6a55-4c43-9d5e-0c7a8e3d2b11")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub account_created: DateTime<Utc>,
    pub account_updated: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            username: u.username,
            account_created: u.account_created,
            account_updated: u.account_updated,
        }
    }
}

fn validate_name(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if value.chars().any(char::is_numeric) {
        return Err(AppError::Validation(format!(
            "{field} cannot contain numbers"
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

/// `local@domain.tld` with the character classes mail providers accept.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}
