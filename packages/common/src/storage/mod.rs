mod error;
mod location;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::sync::Arc;

use tracing::info;

pub use error::{LocationError, StorageError};
pub use location::{LOCATION_SCHEME, ObjectLocation, UPLOAD_PREFIX, upload_key};
pub use traits::{BoxReader, MAX_DECLARED_NAME_BYTES, ObjectStore, StoredObject};

use crate::config::{StorageBackend, StorageConfig};

/// Build the configured object store.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => {
            info!(
                base_path = %config.base_path.display(),
                bucket = %config.bucket,
                "Using filesystem object store"
            );
            let store = filesystem::FilesystemObjectStore::new(
                config.base_path.clone(),
                config.bucket.clone(),
                config.max_upload_size,
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "object-storage")]
        StorageBackend::S3 => {
            info!(
                bucket = %config.bucket,
                endpoint = ?config.endpoint,
                region = %config.region,
                "Using S3 object store"
            );
            Ok(Arc::new(s3::S3ObjectStore::new(config)?))
        }
        #[cfg(not(feature = "object-storage"))]
        StorageBackend::S3 => Err(StorageError::Backend(
            "S3 backend requested but the `object-storage` feature is disabled".into(),
        )),
    }
}
