//! netsot Persistence - Inventory data model and storage layer
//!
//! This crate provides:
//! - Domain model types for inventory objects, config contexts, and computed fields
//! - Persistence trait abstractions the config context engine reads through
//! - An in-memory backend built on concurrent maps
//! - Snapshot import from YAML or JSON documents

pub mod memory;
pub mod model;
pub mod snapshot;
pub mod traits;

// Re-export persistence traits
pub use traits::{ExtrasPersistence, InventoryPersistence, PersistenceService};

// Re-export in-memory backend
pub use memory::{MemoryPersistService, TaggedItemIndex};

// Re-export snapshot loading
pub use snapshot::{ImportSummary, InventorySnapshot};

// Re-export model types
pub use model::{
    Axis, ComputedField, ComputedFieldForm, ConfigContext, ConfigContextForm, ContextAssociations,
    ContextData, Device, DeviceForm, TargetAxes, TargetKind, TargetRef, VirtualMachine,
    VirtualMachineForm,
};
