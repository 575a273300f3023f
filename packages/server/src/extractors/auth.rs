use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the `Authorization: Basic <base64>` header.
///
/// Add this as a handler parameter to require authentication. Routes that
/// address a user-owned resource additionally call [`AuthUser::require_self`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
}

impl AuthUser {
    /// Returns `Ok(())` if the path-addressed user is the caller, `Err(PermissionDenied)` otherwise.
    pub fn require_self(&self, user_id: &str) -> Result<(), AppError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::CredentialsMissing)?
            .to_str()
            .map_err(|_| AppError::InvalidCredentials)?;

        let (username, secret) = parse_basic(auth_header).ok_or(AppError::InvalidCredentials)?;

        let user = state
            .verifier
            .verify(&username, &secret)
            .await?
            .ok_or_else(|| {
                debug!(username = %username, "Credential check failed");
                AppError::InvalidCredentials
            })?;

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
        })
    }
}

/// Decode `Basic <base64(username:secret)>`.
///
/// The scheme is matched case-insensitively; the secret may contain `:`.
pub fn parse_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, secret) = decoded.split_once(':')?;
    if username.is_empty() {
        return None;
    }
    Some((username.to_string(), secret.to_string()))
}
