use std::sync::Arc;
use std::time::Duration;

use common::config::NotificationConfig;
use common::event::{Event, EventEnvelope};
use parking_lot::RwLock;
use tokio_util::task::TaskTracker;
use tracing::{info, instrument, warn};

use crate::channel::{BroccoliChannel, EventChannel};
use crate::error::MqError;

/// Fire-and-forget publisher for domain events.
///
/// Publishing never fails the caller. Concurrent publishes share the channel
/// through a reader-preferring lock; `shutdown` takes the writer side, waits
/// for tracked sends to drain and closes the channel exactly once.
pub struct NotificationPublisher {
    channel: RwLock<Option<Arc<dyn EventChannel>>>,
    in_flight: TaskTracker,
    write_timeout: Duration,
    shutdown_timeout: Duration,
    source: String,
}

impl NotificationPublisher {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            channel: RwLock::new(None),
            in_flight: TaskTracker::new(),
            write_timeout: config.write_timeout(),
            shutdown_timeout: config.shutdown_timeout(),
            source: config.source.clone(),
        }
    }

    /// A publisher with no channel; every publish is a no-op.
    pub fn disabled() -> Self {
        Self::new(&NotificationConfig::default())
    }

    pub fn with_channel(config: &NotificationConfig, channel: Arc<dyn EventChannel>) -> Self {
        let publisher = Self::new(config);
        publisher.install(channel);
        publisher
    }

    /// Connect to the configured broker.
    ///
    /// A missing URL or an unreachable broker yields a disabled publisher
    /// instead of an error so the service can still start.
    pub async fn connect(config: &NotificationConfig) -> Self {
        let publisher = Self::new(config);
        match Self::open_channel(config).await {
            Ok(Some(channel)) => {
                publisher.install(channel);
                info!(queue = %config.queue_name, "Notification channel connected");
            }
            Ok(None) => info!("Notifications disabled: no broker url configured"),
            Err(e) => warn!(error = %e, "Notification channel unavailable, continuing without it"),
        }
        publisher
    }

    async fn open_channel(
        config: &NotificationConfig,
    ) -> Result<Option<Arc<dyn EventChannel>>, MqError> {
        let Some(url) = config.broker_url()? else {
            return Ok(None);
        };
        let channel =
            BroccoliChannel::connect(&url, config.pool_size, config.queue_name.clone()).await?;
        Ok(Some(Arc::new(channel)))
    }

    /// Replace the active channel.
    pub fn install(&self, channel: Arc<dyn EventChannel>) {
        *self.channel.write() = Some(channel);
    }

    pub fn is_enabled(&self) -> bool {
        self.channel.read_recursive().is_some()
    }

    /// Publish one event, reporting the outcome.
    ///
    /// Returns `Ok(false)` when no channel is configured or shutdown has begun.
    pub async fn try_publish<E: Event>(&self, event: &E) -> Result<bool, MqError> {
        let channel = match self.channel.read_recursive().as_ref() {
            Some(channel) => Arc::clone(channel),
            None => return Ok(false),
        };

        // Registered before the closed check: shutdown either waits for this
        // send or has already closed and the send is skipped.
        let _in_flight = self.in_flight.token();
        if self.in_flight.is_closed() {
            return Ok(false);
        }

        let envelope = EventEnvelope::wrap(event, &self.source)?;
        match tokio::time::timeout(self.write_timeout, channel.send(&envelope)).await {
            Ok(result) => result?,
            Err(_) => return Err(MqError::Timeout(self.write_timeout)),
        }
        Ok(true)
    }

    /// Publish one event; failures are logged and swallowed.
    #[instrument(skip_all, fields(event_type = E::event_type(), key = event.correlation_key()))]
    pub async fn publish<E: Event>(&self, event: &E) {
        match self.try_publish(event).await {
            Ok(true) => {}
            Ok(false) => info!("Notifications disabled, event not sent"),
            Err(e) => warn!(error = %e, "Failed to publish event"),
        }
    }

    /// Drain in-flight publishes and close the channel.
    ///
    /// Safe to call more than once; only the first call closes anything.
    pub async fn shutdown(&self) {
        let channel = self.channel.write().take();
        let Some(channel) = channel else {
            return;
        };

        self.in_flight.close();
        if tokio::time::timeout(self.shutdown_timeout, self.in_flight.wait())
            .await
            .is_err()
        {
            warn!(
                pending = self.in_flight.len(),
                "Shutdown deadline reached with publishes still in flight"
            );
        }

        if let Err(e) = channel.close().await {
            warn!(error = %e, "Failed to close notification channel");
        }
        info!("Notification channel closed");
    }
}
