//! Inventory bootstrap from configuration.

use std::sync::Arc;

use tracing::{info, warn};

use netsot_persistence::{InventorySnapshot, MemoryPersistService, PersistenceService};

use crate::model::Configuration;

/// Build the in-memory store and import the configured snapshot, if any
pub fn load_inventory(
    configuration: &Configuration,
) -> anyhow::Result<Arc<dyn PersistenceService>> {
    let store = MemoryPersistService::new(configuration.feature_registry()?);

    match configuration.snapshot_path() {
        Some(path) => {
            info!(path = %path, "Loading inventory snapshot");
            InventorySnapshot::load_from_path(&path)?.import_into(&store)?;
        }
        None => warn!("No inventory snapshot configured, starting with an empty inventory"),
    }

    Ok(Arc::new(store))
}
