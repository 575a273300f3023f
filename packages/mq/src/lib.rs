pub mod channel;
pub mod error;
pub mod publisher;

pub use channel::{BroccoliChannel, EventChannel};
pub use error::MqError;
pub use publisher::NotificationPublisher;
