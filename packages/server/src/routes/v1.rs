use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Multipart framing and the text fields on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(user_routes())
        .merge(trace_routes(config.storage.max_upload_size))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::user::create_user))
        .routes(routes!(
            handlers::user::get_user,
            handlers::user::update_user
        ))
}

fn trace_routes(max_upload_size: u64) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(
            handlers::trace::create_trace,
            handlers::trace::list_course_traces
        ))
        .layer(upload_body_limit(max_upload_size));

    OpenApiRouter::new()
        .routes(routes!(
            handlers::trace::get_trace,
            handlers::trace::delete_trace
        ))
        .routes(routes!(handlers::trace::download_trace_content))
        .routes(routes!(handlers::trace::list_all_traces))
        .merge(upload)
}

/// Body limit layer for the upload route.
fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = max_upload_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}
