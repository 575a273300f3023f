pub mod config;
pub mod event;
pub mod storage;

pub use config::{NotificationConfig, StorageBackend, StorageConfig};
pub use event::{Event, EventEnvelope, TraceUploaded};
