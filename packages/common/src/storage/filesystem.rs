use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::error::StorageError;
use super::location::{ObjectLocation, upload_key};
use super::traits::{BoxReader, ObjectStore, StoredObject, check_declared_name};

/// Filesystem-backed object store.
///
/// Objects live at `{base_path}/{bucket}/{path}`, so a location written here
/// resolves the same way it would against a real bucket.
pub struct FilesystemObjectStore {
    base_path: PathBuf,
    bucket: String,
    max_size: u64,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    pub async fn new(
        base_path: PathBuf,
        bucket: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        let bucket = bucket.into();
        fs::create_dir_all(base_path.join(&bucket)).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            bucket,
            max_size,
        })
    }

    /// Compute the filesystem path for a location.
    fn object_path(&self, location: &ObjectLocation) -> Result<PathBuf, StorageError> {
        let relative = Path::new(location.path());
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidName(format!(
                "path escapes the bucket: {location}"
            )));
        }
        Ok(self.base_path.join(location.bucket()).join(relative))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        mut reader: BoxReader,
        declared_name: &str,
    ) -> Result<ObjectLocation, StorageError> {
        check_declared_name(declared_name)?;

        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;
        let mut buf = vec![0u8; 64 * 1024];
        let mut temp_file = fs::File::create(&temp_path).await?;

        let copied: Result<(), StorageError> = async {
            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                total_bytes += n as u64;
                if total_bytes > self.max_size {
                    return Err(StorageError::SizeLimitExceeded {
                        actual: total_bytes,
                        limit: self.max_size,
                    });
                }
                temp_file.write_all(&buf[..n]).await?;
            }
            temp_file.flush().await?;
            Ok(())
        }
        .await;
        drop(temp_file);

        if let Err(e) = copied {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        let location = ObjectLocation::new(self.bucket.clone(), upload_key(declared_name))
            .map_err(|e| StorageError::InvalidName(e.to_string()))?;
        let object_path = self.object_path(&location)?;

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(location)
    }

    async fn get(&self, location: &ObjectLocation) -> Result<StoredObject, StorageError> {
        let object_path = self.object_path(location)?;
        let bytes = match fs::read(&object_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(location.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let content_type = mime_guess::from_path(location.file_name())
            .first_or_octet_stream()
            .to_string();
        Ok(StoredObject {
            bytes,
            content_type,
        })
    }

    async fn delete(&self, location: &ObjectLocation) -> Result<(), StorageError> {
        let object_path = self.object_path(location)?;
        match fs::remove_file(&object_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(location.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectLocation>, StorageError> {
        let bucket_root = self.base_path.join(&self.bucket);
        let mut pending = vec![bucket_root.clone()];
        let mut found = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&bucket_root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .filter_map(|c| c.as_os_str().to_str())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(prefix)
                    && let Ok(location) = ObjectLocation::new(self.bucket.clone(), key)
                {
                    found.push(location);
                }
            }
        }

        found.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(found)
    }
}
