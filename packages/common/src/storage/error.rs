use thiserror::Error;

/// Errors that can occur during object store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The addressed object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
    /// The store could not be reached or did not answer before the deadline.
    #[error("object store unavailable: {0}")]
    Unavailable(String),
    /// An I/O error occurred on the local side.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The object exceeds the configured size limit.
    #[error("object exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The declared name cannot be turned into an object key.
    #[error("invalid object name: {0}")]
    InvalidName(String),
    /// The store answered with an unexpected status or error.
    #[error("object store error: {0}")]
    Backend(String),
}

/// A stored location string that does not decompose into `(bucket, path)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location is missing the `s3://` scheme: {0}")]
    MissingScheme(String),
    #[error("location has no object path: {0}")]
    MissingPath(String),
    #[error("location has an empty bucket: {0}")]
    EmptyBucket(String),
}
