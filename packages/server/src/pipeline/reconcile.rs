use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use common::storage::{ObjectLocation, ObjectStore, UPLOAD_PREFIX};
use tracing::{debug, error, info, warn};

use crate::store::MetadataStore;

/// Objects under the upload prefix that no trace row references.
///
/// Read-only; acting on the result is an operator decision. An upload in
/// progress between its object write and its row insert also shows up here.
pub async fn find_orphaned_objects(
    metadata: &dyn MetadataStore,
    objects: &dyn ObjectStore,
) -> anyhow::Result<Vec<ObjectLocation>> {
    let referenced: HashSet<String> = metadata.trace_locations().await?.into_iter().collect();
    let listed = objects.list(UPLOAD_PREFIX).await?;

    Ok(listed
        .into_iter()
        .filter(|location| !referenced.contains(&location.to_string()))
        .collect())
}

/// Periodically log orphaned objects.
pub async fn run_orphan_scanner(
    metadata: Arc<dyn MetadataStore>,
    objects: Arc<dyn ObjectStore>,
    scan_interval: Duration,
) {
    info!(
        scan_interval_secs = scan_interval.as_secs(),
        "Starting orphaned object scanner"
    );

    let mut interval = tokio::time::interval(scan_interval);

    loop {
        interval.tick().await;

        match find_orphaned_objects(&*metadata, &*objects).await {
            Ok(orphans) if orphans.is_empty() => debug!("No orphaned objects"),
            Ok(orphans) => {
                for location in &orphans {
                    warn!(location = %location, "Orphaned object");
                }
                warn!(count = orphans.len(), "Found objects with no trace row");
            }
            Err(e) => error!(error = %e, "Orphaned object scan failed"),
        }
    }
}
