//! Persistence traits for the storage abstraction layer
//!
//! The config context engine only reads through these traits; any backend
//! that can list active contexts and resolve a target's axes can feed it.

pub mod extras;
pub mod inventory;

pub use extras::ExtrasPersistence;
pub use inventory::InventoryPersistence;

use netsot_common::FeatureRegistry;

/// Unified persistence service trait
pub trait PersistenceService: ExtrasPersistence + InventoryPersistence + Send + Sync {
    /// Feature registry the backend was constructed with
    fn features(&self) -> &FeatureRegistry;
}
