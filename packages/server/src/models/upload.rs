use std::path::PathBuf;

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use common::storage::BoxReader;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;

/// An uploaded file spooled to a temp file for the duration of one request.
///
/// The temp file is removed when the payload is dropped.
pub struct UploadPayload {
    declared_name: String,
    path: PathBuf,
    size: u64,
}

impl UploadPayload {
    fn reserve(declared_name: String) -> Self {
        Self {
            declared_name,
            path: std::env::temp_dir().join(format!("trace-upload-{}", Uuid::new_v4())),
            size: 0,
        }
    }

    /// Stream a multipart field to disk, enforcing `max_size`.
    pub async fn from_field(mut field: Field<'_>, max_size: u64) -> Result<Self, AppError> {
        let declared_name = field.file_name().unwrap_or_default().to_string();
        let mut payload = Self::reserve(declared_name);

        let mut temp_file = tokio::fs::File::create(&payload.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            payload.size += chunk.len() as u64;
            if payload.size > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

        Ok(payload)
    }

    /// Build a payload from an in-memory buffer.
    pub async fn from_bytes(declared_name: &str, bytes: &[u8]) -> Result<Self, AppError> {
        let mut payload = Self::reserve(declared_name.to_string());
        tokio::fs::write(&payload.path, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        payload.size = bytes.len() as u64;
        Ok(payload)
    }

    /// Filename as sent by the client, untrimmed and unvalidated.
    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Open the spooled bytes for reading.
    pub async fn open(&self) -> Result<BoxReader, AppError> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        Ok(Box::new(file))
    }
}

impl Drop for UploadPayload {
    fn drop(&mut self) {
        // Best effort.
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Decoded trace upload form. Missing text fields decode as empty strings.
#[derive(Default)]
pub struct SubmissionForm {
    pub upload: Option<UploadPayload>,
    pub instructor_id: String,
    pub semester_term: String,
    pub section: String,
}

impl SubmissionForm {
    pub async fn from_multipart(mut multipart: Multipart, max_size: u64) -> Result<Self, AppError> {
        let mut form = SubmissionForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("failed to parse multipart form: {e}")))?
        {
            match field.name() {
                Some("file") => {
                    if form.upload.is_some() {
                        return Err(AppError::Validation(
                            "Only one file may be uploaded".into(),
                        ));
                    }
                    form.upload = Some(UploadPayload::from_field(field, max_size).await?);
                }
                Some("instructor_id") => form.instructor_id = read_text(field).await?,
                Some("semester_term") => form.semester_term = read_text(field).await?,
                Some("section") => form.section = read_text(field).await?,
                _ => {} // Ignore unknown fields.
            }
        }

        Ok(form)
    }
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}
