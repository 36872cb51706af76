//! Domain model types for the persistence layer
//!
//! These types are returned from the persistence traits and consumed by the
//! config context engine, decoupled from any concrete storage backend.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use netsot_common::{
    ContentType, DEFAULT_COMPUTED_FIELD_WEIGHT, DEFAULT_CONFIG_CONTEXT_WEIGHT, slugify,
};

/// JSON object used for config context data and local context data
pub type ContextData = Map<String, Value>;

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Kind of object a config context can be rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Device,
    VirtualMachine,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Device => "device",
            TargetKind::VirtualMachine => "virtual_machine",
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            TargetKind::Device => ContentType::Device,
            TargetKind::VirtualMachine => ContentType::VirtualMachine,
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "device" => Ok(TargetKind::Device),
            "virtual_machine" | "vm" => Ok(TargetKind::VirtualMachine),
            _ => Err(format!("Invalid target kind: {}", s)),
        }
    }
}

/// Typed reference to a device or virtual machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    pub kind: TargetKind,
    pub id: Uuid,
}

impl TargetRef {
    pub fn device(id: Uuid) -> Self {
        Self {
            kind: TargetKind::Device,
            id,
        }
    }

    pub fn virtual_machine(id: Uuid) -> Self {
        Self {
            kind: TargetKind::VirtualMachine,
            id,
        }
    }
}

impl std::fmt::Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// ---------------------------------------------------------------------------
// Association axes
// ---------------------------------------------------------------------------

/// One association dimension of a config context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Region,
    Site,
    Role,
    Platform,
    TenantGroup,
    Tenant,
    ClusterGroup,
    Cluster,
    Tag,
}

impl Axis {
    pub const ALL: [Axis; 9] = [
        Axis::Region,
        Axis::Site,
        Axis::Role,
        Axis::Platform,
        Axis::TenantGroup,
        Axis::Tenant,
        Axis::ClusterGroup,
        Axis::Cluster,
        Axis::Tag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Region => "region",
            Axis::Site => "site",
            Axis::Role => "role",
            Axis::Platform => "platform",
            Axis::TenantGroup => "tenant_group",
            Axis::Tenant => "tenant",
            Axis::ClusterGroup => "cluster_group",
            Axis::Cluster => "cluster",
            Axis::Tag => "tag",
        }
    }

    /// Whether the axis is evaluated for the given target kind
    ///
    /// Devices have no cluster association, so cluster axes never reject them.
    pub fn applies_to(&self, kind: TargetKind) -> bool {
        match self {
            Axis::ClusterGroup | Axis::Cluster => kind == TargetKind::VirtualMachine,
            _ => true,
        }
    }

    /// Content type of the objects referenced on this axis
    pub fn content_type(&self) -> ContentType {
        match self {
            Axis::Region => ContentType::Region,
            Axis::Site => ContentType::Site,
            Axis::Role => ContentType::DeviceRole,
            Axis::Platform => ContentType::Platform,
            Axis::TenantGroup => ContentType::TenantGroup,
            Axis::Tenant => ContentType::Tenant,
            Axis::ClusterGroup => ContentType::ClusterGroup,
            Axis::Cluster => ContentType::Cluster,
            Axis::Tag => ContentType::Tag,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Association sets of a config context, one per axis
///
/// An empty set is a wildcard on that axis.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextAssociations {
    pub regions: BTreeSet<Uuid>,
    pub sites: BTreeSet<Uuid>,
    pub roles: BTreeSet<Uuid>,
    pub platforms: BTreeSet<Uuid>,
    pub tenant_groups: BTreeSet<Uuid>,
    pub tenants: BTreeSet<Uuid>,
    pub cluster_groups: BTreeSet<Uuid>,
    pub clusters: BTreeSet<Uuid>,
    pub tags: BTreeSet<Uuid>,
}

impl ContextAssociations {
    pub fn get(&self, axis: Axis) -> &BTreeSet<Uuid> {
        match axis {
            Axis::Region => &self.regions,
            Axis::Site => &self.sites,
            Axis::Role => &self.roles,
            Axis::Platform => &self.platforms,
            Axis::TenantGroup => &self.tenant_groups,
            Axis::Tenant => &self.tenants,
            Axis::ClusterGroup => &self.cluster_groups,
            Axis::Cluster => &self.clusters,
            Axis::Tag => &self.tags,
        }
    }

    pub fn get_mut(&mut self, axis: Axis) -> &mut BTreeSet<Uuid> {
        match axis {
            Axis::Region => &mut self.regions,
            Axis::Site => &mut self.sites,
            Axis::Role => &mut self.roles,
            Axis::Platform => &mut self.platforms,
            Axis::TenantGroup => &mut self.tenant_groups,
            Axis::Tenant => &mut self.tenants,
            Axis::ClusterGroup => &mut self.cluster_groups,
            Axis::Cluster => &mut self.clusters,
            Axis::Tag => &mut self.tags,
        }
    }

    pub fn with(mut self, axis: Axis, id: Uuid) -> Self {
        self.get_mut(axis).insert(id);
        self
    }

    /// True when no axis is constrained
    pub fn is_empty(&self) -> bool {
        Axis::ALL.iter().all(|axis| self.get(*axis).is_empty())
    }
}

// ---------------------------------------------------------------------------
// Config contexts
// ---------------------------------------------------------------------------

/// A named, weighted configuration fragment with association constraints
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigContext {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub weight: u32,
    pub is_active: bool,
    pub data: ContextData,
    pub associations: ContextAssociations,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Create/update request for a config context
///
/// `data` is untyped here; the store rejects anything but a JSON object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigContextForm {
    pub name: String,
    pub description: String,
    pub weight: Option<u32>,
    pub is_active: Option<bool>,
    pub data: Value,
    pub associations: ContextAssociations,
}

impl ConfigContextForm {
    pub fn new(name: &str, weight: u32, data: Value) -> Self {
        Self {
            name: name.to_string(),
            weight: Some(weight),
            data,
            ..Default::default()
        }
    }

    pub fn with(mut self, axis: Axis, id: Uuid) -> Self {
        self.associations.get_mut(axis).insert(id);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = Some(false);
        self
    }

    pub fn weight_or_default(&self) -> u32 {
        self.weight.unwrap_or(DEFAULT_CONFIG_CONTEXT_WEIGHT)
    }

    pub fn is_active_or_default(&self) -> bool {
        self.is_active.unwrap_or(true)
    }
}

// ---------------------------------------------------------------------------
// Organizational objects
// ---------------------------------------------------------------------------

/// Hierarchical geographic grouping of sites
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub region: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantGroup {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub group: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterGroup {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: Uuid,
    pub name: String,
    pub group: Option<Uuid>,
    pub site: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Functional role shared by devices and virtual machines
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRole {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl Tag {
    /// Build a tag whose slug is derived from its name
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Devices and virtual machines
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    pub site: Uuid,
    pub device_role: Uuid,
    pub platform: Option<Uuid>,
    pub tenant: Option<Uuid>,
    pub local_context_data: Option<ContextData>,
}

/// Create request for a device; `local_context_data` must be an object when set
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceForm {
    pub name: String,
    pub site: Uuid,
    pub device_role: Uuid,
    #[serde(default)]
    pub platform: Option<Uuid>,
    #[serde(default)]
    pub tenant: Option<Uuid>,
    #[serde(default)]
    pub local_context_data: Option<Value>,
}

impl DeviceForm {
    pub fn new(name: &str, site: Uuid, device_role: Uuid) -> Self {
        Self {
            name: name.to_string(),
            site,
            device_role,
            platform: None,
            tenant: None,
            local_context_data: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachine {
    pub id: Uuid,
    pub name: String,
    pub cluster: Uuid,
    pub role: Option<Uuid>,
    pub platform: Option<Uuid>,
    pub tenant: Option<Uuid>,
    pub local_context_data: Option<ContextData>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VirtualMachineForm {
    pub name: String,
    pub cluster: Uuid,
    #[serde(default)]
    pub role: Option<Uuid>,
    #[serde(default)]
    pub platform: Option<Uuid>,
    #[serde(default)]
    pub tenant: Option<Uuid>,
    #[serde(default)]
    pub local_context_data: Option<Value>,
}

impl VirtualMachineForm {
    pub fn new(name: &str, cluster: Uuid) -> Self {
        Self {
            name: name.to_string(),
            cluster,
            role: None,
            platform: None,
            tenant: None,
            local_context_data: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved target axes
// ---------------------------------------------------------------------------

/// A target flattened into its per-axis values
///
/// `regions` holds the site's region followed by its ancestors, nearest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetAxes {
    pub target: TargetRef,
    pub name: String,
    pub regions: Vec<Uuid>,
    pub site: Option<Uuid>,
    pub role: Option<Uuid>,
    pub platform: Option<Uuid>,
    pub tenant_group: Option<Uuid>,
    pub tenant: Option<Uuid>,
    pub cluster_group: Option<Uuid>,
    pub cluster: Option<Uuid>,
    pub tags: BTreeSet<Uuid>,
    pub local_context_data: Option<ContextData>,
}

impl TargetAxes {
    /// An unassociated target with no values on any axis
    pub fn new(target: TargetRef, name: &str) -> Self {
        Self {
            target,
            name: name.to_string(),
            regions: Vec::new(),
            site: None,
            role: None,
            platform: None,
            tenant_group: None,
            tenant: None,
            cluster_group: None,
            cluster: None,
            tags: BTreeSet::new(),
            local_context_data: None,
        }
    }

    /// The target's values on one axis; empty when it has none
    pub fn values(&self, axis: Axis) -> Vec<Uuid> {
        match axis {
            Axis::Region => self.regions.clone(),
            Axis::Site => self.site.into_iter().collect(),
            Axis::Role => self.role.into_iter().collect(),
            Axis::Platform => self.platform.into_iter().collect(),
            Axis::TenantGroup => self.tenant_group.into_iter().collect(),
            Axis::Tenant => self.tenant.into_iter().collect(),
            Axis::ClusterGroup => self.cluster_group.into_iter().collect(),
            Axis::Cluster => self.cluster.into_iter().collect(),
            Axis::Tag => self.tags.iter().copied().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Computed fields
// ---------------------------------------------------------------------------

/// A read-only field whose value is rendered from a template
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedField {
    pub id: Uuid,
    pub slug: String,
    pub label: String,
    pub description: String,
    pub content_type: ContentType,
    pub template: String,
    pub fallback_value: String,
    pub weight: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComputedFieldForm {
    #[serde(default)]
    pub slug: Option<String>,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub content_type: ContentType,
    pub template: String,
    #[serde(default)]
    pub fallback_value: String,
    #[serde(default)]
    pub weight: Option<u32>,
}

impl ComputedFieldForm {
    pub fn new(label: &str, content_type: ContentType, template: &str) -> Self {
        Self {
            slug: None,
            label: label.to_string(),
            description: String::new(),
            content_type,
            template: template.to_string(),
            fallback_value: String::new(),
            weight: None,
        }
    }

    /// Explicit slug, or one derived from the label
    pub fn slug_or_default(&self) -> String {
        self.slug
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| slugify(&self.label))
    }

    pub fn weight_or_default(&self) -> u32 {
        self.weight.unwrap_or(DEFAULT_COMPUTED_FIELD_WEIGHT)
    }
}
