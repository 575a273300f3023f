use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use common::storage::ObjectLocation;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::trace;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::NoQuery;
use crate::models::trace::{TraceResponse, TraceUploadForm};
use crate::models::upload::SubmissionForm;
use crate::pipeline::{DeletionPipeline, SubmissionPipeline, TraceSubmission};
use crate::state::AppState;
use crate::utils::filename::content_disposition_value;

#[utoipa::path(
    post,
    path = "/course/{course_id}/trace",
    tag = "Traces",
    operation_id = "createTrace",
    summary = "Upload a trace for a course",
    description = "Stores the `file` part in the object store, records the trace and emits an \
        upload notification. The notification is best effort and never affects the response.",
    params(("course_id" = String, Path, description = "Course ID")),
    request_body(content = TraceUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Trace created", body = TraceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all, fields(course_id = %course_id, user_id = %auth_user.user_id))]
pub async fn create_trace(
    auth_user: AuthUser,
    _no_query: NoQuery,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let multipart = multipart
        .map_err(|e| AppError::Validation(format!("failed to parse multipart form: {e}")))?;
    let form =
        SubmissionForm::from_multipart(multipart, state.config.storage.max_upload_size).await?;

    let saved = SubmissionPipeline::from_state(&state)
        .submit(TraceSubmission {
            course_id,
            uploader_id: auth_user.user_id,
            instructor_id: form.instructor_id,
            semester_term: form.semester_term,
            section: form.section,
            upload: form.upload,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TraceResponse::from(saved))))
}

#[utoipa::path(
    get,
    path = "/course/{course_id}/trace",
    tag = "Traces",
    operation_id = "listCourseTraces",
    summary = "List traces of a course",
    params(("course_id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Traces, oldest first", body = Vec<TraceResponse>),
        (status = 400, description = "Query string supplied (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all, fields(course_id = %course_id))]
pub async fn list_course_traces(
    _auth_user: AuthUser,
    _no_query: NoQuery,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<TraceResponse>>, AppError> {
    let course_id = parse_course_id(&course_id)?;
    if !state.metadata.course_exists(course_id).await? {
        return Err(AppError::NotFound("Course not found".into()));
    }

    let traces = state.metadata.list_traces_by_course(course_id).await?;
    Ok(Json(traces.into_iter().map(TraceResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/course/{course_id}/trace/{trace_id}",
    tag = "Traces",
    operation_id = "getTrace",
    summary = "Get one trace",
    params(
        ("course_id" = String, Path, description = "Course ID"),
        ("trace_id" = String, Path, description = "Trace ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Trace", body = TraceResponse),
        (status = 400, description = "Invalid trace ID or query string (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Trace not found in this course (NOT_FOUND)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all, fields(course_id = %course_id, trace_id = %trace_id))]
pub async fn get_trace(
    _auth_user: AuthUser,
    _no_query: NoQuery,
    State(state): State<AppState>,
    Path((course_id, trace_id)): Path<(String, String)>,
) -> Result<Json<TraceResponse>, AppError> {
    let trace = find_course_trace(&state, &course_id, &trace_id).await?;
    Ok(Json(trace.into()))
}

#[utoipa::path(
    delete,
    path = "/course/{course_id}/trace/{trace_id}",
    tag = "Traces",
    operation_id = "deleteTrace",
    summary = "Delete a trace and its stored object",
    description = "Deletes the object first and the record second. If the object store is \
        unreachable the record is kept and the request can be retried.",
    params(
        ("course_id" = String, Path, description = "Course ID"),
        ("trace_id" = String, Path, description = "Trace ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Trace deleted"),
        (status = 400, description = "Invalid trace ID or query string (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Trace not found in this course (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Object delete failed (INTERNAL_ERROR)", body = ErrorBody),
        (status = 503, description = "Object store unreachable (STORE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all, fields(course_id = %course_id, trace_id = %trace_id, user_id = %auth_user.user_id))]
pub async fn delete_trace(
    auth_user: AuthUser,
    _no_query: NoQuery,
    State(state): State<AppState>,
    Path((course_id, trace_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let course_id = parse_course_id(&course_id)?;
    let trace_id = parse_trace_id(&trace_id)?;

    DeletionPipeline::from_state(&state)
        .delete(course_id, trace_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/course/{course_id}/trace/{trace_id}/content",
    tag = "Traces",
    operation_id = "downloadTrace",
    summary = "Download the stored file of a trace",
    params(
        ("course_id" = String, Path, description = "Course ID"),
        ("trace_id" = String, Path, description = "Trace ID (UUID)"),
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Invalid trace ID or query string (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Trace or object not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Object store unreachable (STORE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all, fields(course_id = %course_id, trace_id = %trace_id))]
pub async fn download_trace_content(
    _auth_user: AuthUser,
    _no_query: NoQuery,
    State(state): State<AppState>,
    Path((course_id, trace_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let trace = find_course_trace(&state, &course_id, &trace_id).await?;

    let location = ObjectLocation::parse(&trace.bucket_path).map_err(|e| {
        AppError::Internal(format!("Stored location for trace {} is malformed: {e}", trace.id))
    })?;
    let object = state.objects.get(&location).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, object.content_type)
        .header(header::CONTENT_LENGTH, object.bytes.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&trace.file_name),
        )
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from(object.bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    get,
    path = "/traces",
    tag = "Traces",
    operation_id = "listTraces",
    summary = "List all traces",
    responses(
        (status = 200, description = "Traces, oldest first", body = Vec<TraceResponse>),
        (status = 400, description = "Query string supplied (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all)]
pub async fn list_all_traces(
    _auth_user: AuthUser,
    _no_query: NoQuery,
    State(state): State<AppState>,
) -> Result<Json<Vec<TraceResponse>>, AppError> {
    let traces = state.metadata.list_traces().await?;
    Ok(Json(traces.into_iter().map(TraceResponse::from).collect()))
}

fn parse_course_id(raw: &str) -> Result<&str, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "Course ID cannot be empty or just blank".into(),
        ));
    }
    Ok(trimmed)
}

fn parse_trace_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation("invalid UUID format".into()))
}

/// Look up a trace that must belong to `course_id`.
async fn find_course_trace(
    state: &AppState,
    course_id: &str,
    trace_id: &str,
) -> Result<trace::Model, AppError> {
    let course_id = parse_course_id(course_id)?;
    let trace_id = parse_trace_id(trace_id)?;

    state
        .metadata
        .find_trace(trace_id)
        .await?
        .filter(|t| t.course_id == course_id)
        .ok_or_else(|| AppError::NotFound("Trace not found".into()))
}
