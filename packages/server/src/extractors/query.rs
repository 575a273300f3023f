use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Rejects requests that carry a query string.
#[derive(Debug)]
pub struct NoQuery;

impl<S> FromRequestParts<S> for NoQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.uri.query() {
            Some(q) if !q.is_empty() => Err(AppError::Validation(
                "query parameters are not allowed".into(),
            )),
            _ => Ok(NoQuery),
        }
    }
}
