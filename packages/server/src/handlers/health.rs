use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::error::{AppError, ErrorBody};
use crate::extractors::query::NoQuery;
use crate::state::AppState;

const NO_CACHE: [(header::HeaderName, &str); 3] = [
    (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
    (header::PRAGMA, "no-cache"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
];

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Health",
    operation_id = "healthCheck",
    summary = "Liveness and database reachability",
    responses(
        (status = 200, description = "Metadata store reachable", body = String),
        (status = 400, description = "Query string or body supplied (VALIDATION_ERROR)", body = ErrorBody),
        (status = 503, description = "Metadata store unreachable"),
    ),
)]
pub async fn health(
    _no_query: NoQuery,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let has_body = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|len| len > 0);
    if has_body {
        return Err(AppError::Validation("request body is not allowed".into()));
    }

    match state.metadata.ping().await {
        Ok(()) => Ok((StatusCode::OK, NO_CACHE, "OK").into_response()),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            Ok((StatusCode::SERVICE_UNAVAILABLE, NO_CACHE).into_response())
        }
    }
}
