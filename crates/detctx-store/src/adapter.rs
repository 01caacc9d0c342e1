use std::sync::Arc;

use detctx_core::ContextEntry;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::{Collection, StoreError};

/// Reads and writes per-detection context entries.
///
/// Listing is best effort: an entry whose individual read fails is dropped
/// from the result, because a partial context view beats none. Failures of
/// the key search itself, and of writes and deletes, are returned as-is.
/// Nothing is retried here.
#[derive(Clone)]
pub struct ContextStore {
    collection: Arc<dyn Collection>,
}

impl ContextStore {
    pub fn new(collection: Arc<dyn Collection>) -> Self {
        Self { collection }
    }

    /// All readable entries attached to `detection_id`, each tagged with its key.
    pub async fn list_entries(&self, detection_id: &str) -> Result<Vec<ContextEntry>, StoreError> {
        let keys = self.collection.search(detection_id).await?;
        debug!(detection_id, count = keys.len(), "listed context keys");

        let reads = keys.iter().map(|key| self.collection.read(key));
        let results = join_all(reads).await;

        let entries = keys
            .into_iter()
            .zip(results)
            .filter_map(|(key, result)| match result {
                Ok(mut entry) => {
                    entry.object_key = key;
                    Some(entry)
                }
                Err(e) => {
                    warn!(object_key = %key, error = %e, "dropping unreadable context entry");
                    None
                }
            })
            .collect();
        Ok(entries)
    }

    pub async fn write_entry(&self, object_key: &str, entry: &ContextEntry) -> Result<(), StoreError> {
        debug!(object_key, "writing context entry");
        self.collection.write(object_key, entry).await
    }

    pub async fn delete_entry(&self, object_key: &str) -> Result<(), StoreError> {
        debug!(object_key, "deleting context entry");
        self.collection.delete(object_key).await
    }
}
