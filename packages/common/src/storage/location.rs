use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::LocationError;

/// Scheme every stored location starts with.
pub const LOCATION_SCHEME: &str = "s3://";

/// Logical prefix all uploads are written under.
pub const UPLOAD_PREFIX: &str = "uploads/";

/// Last timestamp handed out by [`upload_key`].
static LAST_KEY_NANOS: AtomicU64 = AtomicU64::new(0);

/// A fully-qualified object address: `s3://{bucket}/{path}`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    bucket: String,
    path: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Result<Self, LocationError> {
        let bucket = bucket.into();
        let path = path.into();
        if bucket.is_empty() || bucket.contains('/') {
            return Err(LocationError::EmptyBucket(format!("{LOCATION_SCHEME}{bucket}/{path}")));
        }
        if path.is_empty() {
            return Err(LocationError::MissingPath(format!("{LOCATION_SCHEME}{bucket}/")));
        }
        Ok(Self { bucket, path })
    }

    /// Split a stored location into `(bucket, path)`.
    ///
    /// The bucket is everything between the scheme and the first `/`; the path
    /// is the remainder, which may itself contain `/`.
    pub fn parse(s: &str) -> Result<Self, LocationError> {
        let rest = s
            .strip_prefix(LOCATION_SCHEME)
            .ok_or_else(|| LocationError::MissingScheme(s.to_string()))?;
        let (bucket, path) = rest
            .split_once('/')
            .ok_or_else(|| LocationError::MissingPath(s.to_string()))?;
        if bucket.is_empty() {
            return Err(LocationError::EmptyBucket(s.to_string()));
        }
        if path.is_empty() {
            return Err(LocationError::MissingPath(s.to_string()));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment, used for content-type guessing.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LOCATION_SCHEME}{}/{}", self.bucket, self.path)
    }
}

impl fmt::Debug for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectLocation({self})")
    }
}

impl FromStr for ObjectLocation {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Generate a fresh upload key: `uploads/{unix_nanos}-{declared_name}`.
///
/// The timestamp component is strictly increasing within the process, so two
/// uploads of the same name never share a key even inside one clock tick.
pub fn upload_key(declared_name: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0);

    let mut previous = LAST_KEY_NANOS.load(Ordering::Relaxed);
    let nanos = loop {
        let next = now.max(previous.saturating_add(1));
        match LAST_KEY_NANOS.compare_exchange_weak(
            previous,
            next,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => break next,
            Err(actual) => previous = actual,
        }
    };

    format!("{UPLOAD_PREFIX}{nanos}-{declared_name}")
}
