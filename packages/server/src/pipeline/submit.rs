use chrono::Utc;
use common::event::TraceUploaded;
use common::storage::ObjectStore;
use mq::NotificationPublisher;
use tracing::{Span, error, info, instrument};
use uuid::Uuid;

use crate::entity::trace;
use crate::error::AppError;
use crate::models::shared::require_non_blank;
use crate::models::upload::UploadPayload;
use crate::state::AppState;
use crate::store::MetadataStore;
use crate::utils::filename::validate_flat_filename;

/// One decoded upload request.
pub struct TraceSubmission {
    pub course_id: String,
    pub uploader_id: String,
    pub instructor_id: String,
    pub semester_term: String,
    pub section: String,
    pub upload: Option<UploadPayload>,
}

/// Fields that passed validation, trimmed.
struct Validated<'s> {
    file_name: &'s str,
    course_id: &'s str,
    instructor_id: &'s str,
    semester_term: &'s str,
    section: &'s str,
    upload: &'s UploadPayload,
}

/// Drives object store, then metadata store, then notification.
pub struct SubmissionPipeline<'a> {
    metadata: &'a dyn MetadataStore,
    objects: &'a dyn ObjectStore,
    notifier: &'a NotificationPublisher,
}

impl<'a> SubmissionPipeline<'a> {
    pub fn new(
        metadata: &'a dyn MetadataStore,
        objects: &'a dyn ObjectStore,
        notifier: &'a NotificationPublisher,
    ) -> Self {
        Self {
            metadata,
            objects,
            notifier,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(&*state.metadata, &*state.objects, &state.notifier)
    }

    /// Run one submission to completion.
    ///
    /// Validation failures return before any store is written. A failed
    /// metadata insert leaves the written object behind; it is logged with its
    /// location and surfaces through [`super::reconcile::find_orphaned_objects`].
    /// The notification outcome never affects the result.
    #[instrument(
        skip_all,
        fields(course_id = %submission.course_id, user_id = %submission.uploader_id, trace_id)
    )]
    pub async fn submit(&self, submission: TraceSubmission) -> Result<trace::Model, AppError> {
        let valid = self.validate(&submission).await?;

        let reader = valid.upload.open().await?;
        let location = self
            .objects
            .put(reader, valid.file_name)
            .await
            .map_err(|e| AppError::Internal(format!("Object store write failed: {e}")))?;

        let trace_id = Uuid::new_v4();
        Span::current().record("trace_id", tracing::field::display(trace_id));

        let row = trace::Model {
            id: trace_id,
            user_id: submission.uploader_id.clone(),
            file_name: valid.file_name.to_string(),
            bucket_path: location.to_string(),
            course_id: valid.course_id.to_string(),
            instructor_id: valid.instructor_id.to_string(),
            semester_term: valid.semester_term.to_string(),
            section: valid.section.to_string(),
            created_at: Utc::now(),
        };

        let saved = match self.metadata.insert_trace(row).await {
            Ok(saved) => saved,
            Err(e) => {
                error!(
                    orphaned_object = %location,
                    error = %e,
                    "Metadata write failed after object write; object left for reconciliation"
                );
                return Err(AppError::Internal(format!("Metadata write failed: {e}")));
            }
        };

        info!(location = %location, size = valid.upload.size(), "Trace stored");

        self.notifier
            .publish(&TraceUploaded {
                trace_id: saved.id.to_string(),
                course_id: saved.course_id.clone(),
                file_name: saved.file_name.clone(),
                store_bucket: location.bucket().to_string(),
                store_path: location.path().to_string(),
                instructor_id: saved.instructor_id.clone(),
                semester_term: saved.semester_term.clone(),
                section: saved.section.clone(),
                uploaded_by: saved.user_id.clone(),
                uploaded_at: saved.created_at,
            })
            .await;

        Ok(saved)
    }

    /// Field checks first, then reference lookups.
    async fn validate<'s>(
        &self,
        submission: &'s TraceSubmission,
    ) -> Result<Validated<'s>, AppError> {
        let upload = submission
            .upload
            .as_ref()
            .ok_or_else(|| AppError::Validation("failed to get file from request".into()))?;
        let file_name = validate_flat_filename(upload.declared_name())
            .map_err(|e| AppError::Validation(e.message().into()))?;

        let section = require_non_blank(&submission.section, "Section")?;
        let semester_term = require_non_blank(&submission.semester_term, "Semester term")?;
        let instructor_id = require_non_blank(&submission.instructor_id, "Instructor ID")?;
        let course_id = require_non_blank(&submission.course_id, "Course ID")?;

        if !self.metadata.instructor_exists(instructor_id).await? {
            return Err(AppError::Validation(format!(
                "Instructor '{instructor_id}' does not exist"
            )));
        }
        if !self.metadata.course_exists(course_id).await? {
            return Err(AppError::NotFound("Course not found".into()));
        }
        if !self.metadata.semester_term_exists(semester_term).await? {
            return Err(AppError::Validation(format!(
                "Semester term '{semester_term}' does not exist"
            )));
        }

        Ok(Validated {
            file_name,
            course_id,
            instructor_id,
            semester_term,
            section,
            upload,
        })
    }
}
