use std::sync::Arc;

use common::storage::ObjectStore;
use mq::NotificationPublisher;

use crate::config::AppConfig;
use crate::credentials::CredentialVerifier;
use crate::store::{DeadlineIdentityStore, DeadlineMetadataStore, IdentityStore, MetadataStore};

/// Shared handler state. Store calls made through it are bounded by
/// `database.query_timeout_secs`.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub metadata: Arc<dyn MetadataStore>,
    pub identities: Arc<dyn IdentityStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub notifier: Arc<NotificationPublisher>,
    pub verifier: CredentialVerifier,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        metadata: Arc<dyn MetadataStore>,
        identities: Arc<dyn IdentityStore>,
        objects: Arc<dyn ObjectStore>,
        notifier: Arc<NotificationPublisher>,
    ) -> Self {
        let limit = config.database.query_timeout();
        let metadata: Arc<dyn MetadataStore> = Arc::new(DeadlineMetadataStore::new(metadata, limit));
        let identities: Arc<dyn IdentityStore> =
            Arc::new(DeadlineIdentityStore::new(identities, limit));
        let verifier = CredentialVerifier::new(Arc::clone(&identities));
        Self {
            config,
            metadata,
            identities,
            objects,
            notifier,
            verifier,
        }
    }
}
