use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MqError {
    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid broker configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

impl From<broccoli_queue::error::BroccoliError> for MqError {
    fn from(e: broccoli_queue::error::BroccoliError) -> Self {
        MqError::Internal(e.to_string())
    }
}

impl From<common::config::IncompleteCredentials> for MqError {
    fn from(e: common::config::IncompleteCredentials) -> Self {
        MqError::Config(e.to_string())
    }
}
