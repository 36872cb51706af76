//! Inventory persistence trait
//!
//! Read access to devices and virtual machines, and resolution of a target
//! into the axis values the config context engine matches against.

use serde_json::Value;

use crate::model::{Device, TargetAxes, TargetKind, TargetRef, VirtualMachine};

pub trait InventoryPersistence: Send + Sync {
    fn device_find_by_name(&self, name: &str) -> anyhow::Result<Option<Device>>;

    fn virtual_machine_find_by_name(&self, name: &str) -> anyhow::Result<Option<VirtualMachine>>;

    /// References to every stored target of a kind, ordered by name
    fn target_find_all(&self, kind: TargetKind) -> anyhow::Result<Vec<TargetRef>>;

    /// Flatten a target into its axis values; `None` when it does not exist
    fn target_axes(&self, target: TargetRef) -> anyhow::Result<Option<TargetAxes>>;

    /// JSON view of a target used as template context; `None` when it does not exist
    fn target_view(&self, target: TargetRef) -> anyhow::Result<Option<Value>>;
}
