use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::location::ObjectLocation;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// An object read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Blob storage addressed by generated keys under [`super::UPLOAD_PREFIX`].
///
/// No operation retries on its own; callers decide what a failure means.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket new objects are written to.
    fn bucket(&self) -> &str;

    /// Write the stream under a freshly generated key and return its location.
    ///
    /// Fails with [`StorageError::Unavailable`] if the store cannot be reached or
    /// the write does not complete in time.
    async fn put(
        &self,
        reader: BoxReader,
        declared_name: &str,
    ) -> Result<ObjectLocation, StorageError>;

    /// Write an in-memory buffer.
    async fn put_bytes(
        &self,
        data: &[u8],
        declared_name: &str,
    ) -> Result<ObjectLocation, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put(reader, declared_name).await
    }

    /// Read an object and its content type.
    async fn get(&self, location: &ObjectLocation) -> Result<StoredObject, StorageError>;

    /// Delete an object.
    ///
    /// Returns [`StorageError::NotFound`] if the object is already absent.
    async fn delete(&self, location: &ObjectLocation) -> Result<(), StorageError>;

    /// List every object in this store's bucket whose path starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectLocation>, StorageError>;
}

/// Longest declared name, in bytes, that still fits a generated key segment
/// under the 255-byte filename limit of common filesystems.
pub const MAX_DECLARED_NAME_BYTES: usize = 200;

/// Reject declared names that cannot become a single key segment.
pub(crate) fn check_declared_name(declared_name: &str) -> Result<(), StorageError> {
    if declared_name.trim().is_empty() {
        return Err(StorageError::InvalidName("name is empty".into()));
    }
    if declared_name.len() > MAX_DECLARED_NAME_BYTES {
        return Err(StorageError::InvalidName(format!(
            "name is {} bytes, limit is {MAX_DECLARED_NAME_BYTES}",
            declared_name.len()
        )));
    }
    if declared_name.contains('/') || declared_name.contains('\\') {
        return Err(StorageError::InvalidName(format!(
            "name contains a path separator: {declared_name}"
        )));
    }
    Ok(())
}
