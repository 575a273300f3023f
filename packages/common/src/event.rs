use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Core event trait for everything published on the notification channel.
pub trait Event: Serialize + Send + Sync {
    /// Stable event type name carried in the envelope.
    fn event_type() -> &'static str
    where
        Self: Sized;

    /// Key that routes every message about the same entity to the same ordering unit.
    fn correlation_key(&self) -> &str;
}

/// Payload emitted after a trace's object and metadata row are both durable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceUploaded {
    pub trace_id: String,
    pub course_id: String,
    pub file_name: String,
    pub store_bucket: String,
    pub store_path: String,
    pub instructor_id: String,
    pub semester_term: String,
    pub section: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Event for TraceUploaded {
    fn event_type() -> &'static str {
        "trace.uploaded"
    }

    fn correlation_key(&self) -> &str {
        &self.trace_id
    }
}

/// Transport envelope around a serialized event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_type: String,
    /// Correlation key; equal to the trace id for upload events.
    pub key: String,
    pub content_type: String,
    pub source: String,
    pub emitted_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Wrap a typed event.
    pub fn wrap<E: Event>(event: &E, source: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_type: E::event_type().to_string(),
            key: event.correlation_key().to_string(),
            content_type: "application/json".into(),
            source: source.to_string(),
            emitted_at: Utc::now(),
            payload: serde_json::to_value(event)?,
        })
    }

    /// Deserialize the payload back into a typed event.
    pub fn into_event<E: Event + serde::de::DeserializeOwned>(
        self,
    ) -> Result<E, serde_json::Error> {
        serde_json::from_value(self.payload)
    }
}
