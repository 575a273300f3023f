use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::trace;

/// A stored trace.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TraceResponse {
    #[schema(example = "8b4f7f9e-3d5c-4c6e-9b1f-2f0c6a1d7e42")]
    pub trace_id: Uuid,
    /// Uploader.
    #[schema(example = "U1")]
    pub user_id: String,
    #[schema(example = "syllabus.pdf")]
    pub file_name: String,
    pub date_created: DateTime<Utc>,
    /// Object location, `s3://{bucket}/{path}`.
    #[schema(example = "s3://traces/uploads/1741664748290248000-syllabus.pdf")]
    pub bucket_path: String,
    #[schema(example = "C1")]
    pub course_id: String,
    #[schema(example = "I1")]
    pub instructor_id: String,
    #[schema(example = "2024B")]
    pub semester_term: String,
    #[schema(example = "A")]
    pub section: String,
}

impl From<trace::Model> for TraceResponse {
    fn from(t: trace::Model) -> Self {
        Self {
            trace_id: t.id,
            user_id: t.user_id,
            file_name: t.file_name,
            date_created: t.created_at,
            bucket_path: t.bucket_path,
            course_id: t.course_id,
            instructor_id: t.instructor_id,
            semester_term: t.semester_term,
            section: t.section,
        }
    }
}

/// Multipart body accepted by the trace upload endpoint. Documentation only.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct TraceUploadForm {
    /// The artifact. Its declared filename is kept as `file_name`.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    #[schema(example = "I1")]
    pub instructor_id: String,
    #[schema(example = "2024B")]
    pub semester_term: String,
    #[schema(example = "A")]
    pub section: String,
}
