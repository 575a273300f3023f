use common::storage::{ObjectLocation, ObjectStore, StorageError};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::store::MetadataStore;

/// Removes a trace's object, then its row.
///
/// The row is kept whenever the object delete fails for any reason other than
/// the object already being gone, so the location is never lost while the
/// object may still exist.
pub struct DeletionPipeline<'a> {
    metadata: &'a dyn MetadataStore,
    objects: &'a dyn ObjectStore,
}

impl<'a> DeletionPipeline<'a> {
    pub fn new(metadata: &'a dyn MetadataStore, objects: &'a dyn ObjectStore) -> Self {
        Self { metadata, objects }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(&*state.metadata, &*state.objects)
    }

    #[instrument(skip_all, fields(course_id = %course_id, trace_id = %trace_id))]
    pub async fn delete(&self, course_id: &str, trace_id: Uuid) -> Result<(), AppError> {
        let trace = self
            .metadata
            .find_trace(trace_id)
            .await?
            .filter(|t| t.course_id == course_id)
            .ok_or_else(|| AppError::NotFound("Trace not found".into()))?;

        let location = ObjectLocation::parse(&trace.bucket_path).map_err(|e| {
            AppError::Internal(format!("Stored location for trace {trace_id} is malformed: {e}"))
        })?;

        match self.objects.delete(&location).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                warn!(location = %location, "Object already absent, removing metadata anyway");
            }
            Err(StorageError::Unavailable(detail)) => {
                warn!(location = %location, error = %detail, "Object store unavailable, metadata kept");
                return Err(AppError::StoreUnavailable(detail));
            }
            Err(e) => {
                return Err(AppError::Internal(format!(
                    "Object delete failed for {location}: {e}"
                )));
            }
        }

        if !self.metadata.delete_trace(trace_id).await? {
            return Err(AppError::NotFound("Trace not found".into()));
        }

        info!(location = %location, "Trace deleted");
        Ok(())
    }
}
