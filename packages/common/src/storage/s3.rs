use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::error::StorageError;
use super::location::{ObjectLocation, upload_key};
use super::traits::{BoxReader, ObjectStore, StoredObject, check_declared_name};
use crate::config::StorageConfig;

/// S3-compatible object store backed by a single path-style bucket.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    bucket_name: String,
    max_size: u64,
    timeout: Duration,
}

impl S3ObjectStore {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse::<Region>()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .with_path_style();

        Ok(Self {
            bucket,
            bucket_name: config.bucket.clone(),
            max_size: config.max_upload_size,
            timeout: config.request_timeout(),
        })
    }

    /// Run one round trip under the configured deadline.
    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, S3Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(map_s3_error),
            Err(_) => Err(StorageError::Unavailable(format!(
                "{op} timed out after {:?}",
                self.timeout
            ))),
        }
    }

    fn ensure_own_bucket(&self, location: &ObjectLocation) -> Result<(), StorageError> {
        if location.bucket() != self.bucket_name {
            return Err(StorageError::Backend(format!(
                "location {location} is outside bucket {}",
                self.bucket_name
            )));
        }
        Ok(())
    }
}

fn map_s3_error(err: S3Error) -> StorageError {
    match err {
        S3Error::HttpFailWithBody(status, body) => status_error(status, &body),
        // Everything else is a transport or signing failure before a status came back.
        other => StorageError::Unavailable(other.to_string()),
    }
}

fn status_error(status: u16, context: &str) -> StorageError {
    match status {
        404 => StorageError::NotFound(context.to_string()),
        500..=599 => StorageError::Unavailable(format!("status {status}: {context}")),
        _ => StorageError::Backend(format!("status {status}: {context}")),
    }
}

fn check_status(status: u16, location: &ObjectLocation) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(status_error(status, &location.to_string()))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    async fn put(
        &self,
        mut reader: BoxReader,
        declared_name: &str,
    ) -> Result<ObjectLocation, StorageError> {
        check_declared_name(declared_name)?;

        let mut data = Vec::new();
        let read = (&mut reader)
            .take(self.max_size + 1)
            .read_to_end(&mut data)
            .await?;
        if read as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: read as u64,
                limit: self.max_size,
            });
        }

        let location = ObjectLocation::new(self.bucket_name.clone(), upload_key(declared_name))
            .map_err(|e| StorageError::InvalidName(e.to_string()))?;
        let content_type = mime_guess::from_path(declared_name)
            .first_or_octet_stream()
            .to_string();

        let response = self
            .bounded(
                "put",
                self.bucket
                    .put_object_with_content_type(location.path(), &data, &content_type),
            )
            .await?;
        check_status(response.status_code(), &location)?;

        debug!(%location, size = data.len(), "Stored object");
        Ok(location)
    }

    async fn get(&self, location: &ObjectLocation) -> Result<StoredObject, StorageError> {
        self.ensure_own_bucket(location)?;
        let response = self
            .bounded("get", self.bucket.get_object(location.path()))
            .await?;
        check_status(response.status_code(), location)?;

        let content_type = response
            .headers()
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| {
                mime_guess::from_path(location.file_name())
                    .first_or_octet_stream()
                    .to_string()
            });
        Ok(StoredObject {
            bytes: response.to_vec(),
            content_type,
        })
    }

    async fn delete(&self, location: &ObjectLocation) -> Result<(), StorageError> {
        self.ensure_own_bucket(location)?;

        // S3 deletes are idempotent, so absence has to be detected up front.
        let (_, status) = self
            .bounded("head", self.bucket.head_object(location.path()))
            .await?;
        check_status(status, location)?;

        let response = self
            .bounded("delete", self.bucket.delete_object(location.path()))
            .await?;
        check_status(response.status_code(), location)?;

        debug!(%location, "Deleted object");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectLocation>, StorageError> {
        let pages = self
            .bounded("list", self.bucket.list(prefix.to_string(), None))
            .await?;

        let mut found: Vec<ObjectLocation> = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .filter_map(|object| ObjectLocation::new(self.bucket_name.clone(), object.key).ok())
            .collect();
        found.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(found)
    }
}
