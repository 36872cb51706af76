//! Inventory snapshot import
//!
//! A snapshot is a YAML or JSON document describing a complete inventory with
//! every reference expressed by name. Entities are imported in dependency
//! order, so a region's parent must be listed before the region itself.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use netsot_common::{ContentType, NetsotError};

use crate::memory::MemoryPersistService;
use crate::model::{
    Axis, ComputedFieldForm, ConfigContextForm, ContextAssociations, DeviceForm, TargetRef,
    VirtualMachineForm,
};
use crate::traits::ExtrasPersistence;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionEntry {
    pub name: String,
    pub parent: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteEntry {
    pub name: String,
    pub region: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedEntry {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantEntry {
    pub name: String,
    pub group: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterEntry {
    pub name: String,
    pub group: Option<String>,
    pub site: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceEntry {
    pub name: String,
    pub site: String,
    pub role: String,
    pub platform: Option<String>,
    pub tenant: Option<String>,
    pub tags: Vec<String>,
    pub local_context_data: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMachineEntry {
    pub name: String,
    pub cluster: String,
    pub role: Option<String>,
    pub platform: Option<String>,
    pub tenant: Option<String>,
    pub tags: Vec<String>,
    pub local_context_data: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigContextEntry {
    pub name: String,
    pub description: String,
    pub weight: Option<u32>,
    pub is_active: bool,
    pub data: Value,
    pub regions: Vec<String>,
    pub sites: Vec<String>,
    pub roles: Vec<String>,
    pub platforms: Vec<String>,
    pub tenant_groups: Vec<String>,
    pub tenants: Vec<String>,
    pub cluster_groups: Vec<String>,
    pub clusters: Vec<String>,
    pub tags: Vec<String>,
}

impl Default for ConfigContextEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            weight: None,
            is_active: true,
            data: Value::Object(Default::default()),
            regions: Vec::new(),
            sites: Vec::new(),
            roles: Vec::new(),
            platforms: Vec::new(),
            tenant_groups: Vec::new(),
            tenants: Vec::new(),
            cluster_groups: Vec::new(),
            clusters: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl ConfigContextEntry {
    fn names(&self, axis: Axis) -> &[String] {
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
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComputedFieldEntry {
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

/// Whole-inventory document
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventorySnapshot {
    pub regions: Vec<RegionEntry>,
    pub sites: Vec<SiteEntry>,
    pub tenant_groups: Vec<NamedEntry>,
    pub tenants: Vec<TenantEntry>,
    pub cluster_groups: Vec<NamedEntry>,
    pub clusters: Vec<ClusterEntry>,
    pub platforms: Vec<NamedEntry>,
    pub device_roles: Vec<NamedEntry>,
    pub tags: Vec<NamedEntry>,
    pub devices: Vec<DeviceEntry>,
    pub virtual_machines: Vec<VirtualMachineEntry>,
    pub config_contexts: Vec<ConfigContextEntry>,
    pub computed_fields: Vec<ComputedFieldEntry>,
}

/// Row counts of an import, for logging and CLI output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub devices: usize,
    pub virtual_machines: usize,
    pub config_contexts: usize,
    pub computed_fields: usize,
}

fn parse_error<E: std::fmt::Display>(e: E) -> anyhow::Error {
    NetsotError::SnapshotError(format!("failed to parse snapshot: {}", e)).into()
}

impl InventorySnapshot {
    /// Parse a YAML or JSON snapshot
    ///
    /// A document opening with `{` goes through `serde_json` first, since the
    /// YAML parser rejects surrogate-pair `\u` escapes that JSON exporters
    /// emit for non-BMP characters. A flow-style YAML mapping that is not
    /// valid JSON still parses as YAML.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        if content.trim_start().starts_with('{') {
            return match serde_json::from_str(content) {
                Ok(snapshot) => Ok(snapshot),
                Err(json_err) => serde_yaml::from_str(content).map_err(|_| parse_error(json_err)),
            };
        }

        serde_yaml::from_str(content).map_err(parse_error)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NetsotError::SnapshotError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Create every entity of the snapshot in `store`
    pub fn import_into(&self, store: &MemoryPersistService) -> anyhow::Result<ImportSummary> {
        let importer = Importer { store };
        importer.organizational(self)?;
        importer.targets(self)?;
        importer.extras(self)?;

        let summary = ImportSummary {
            devices: self.devices.len(),
            virtual_machines: self.virtual_machines.len(),
            config_contexts: self.config_contexts.len(),
            computed_fields: self.computed_fields.len(),
        };
        info!(
            devices = summary.devices,
            virtual_machines = summary.virtual_machines,
            config_contexts = summary.config_contexts,
            computed_fields = summary.computed_fields,
            "Imported inventory snapshot"
        );
        Ok(summary)
    }
}

fn unknown(kind: &'static str, name: &str) -> anyhow::Error {
    NetsotError::SnapshotError(format!("unknown {} '{}'", kind, name)).into()
}

struct Importer<'a> {
    store: &'a MemoryPersistService,
}

impl Importer<'_> {
    fn region(&self, name: &str) -> anyhow::Result<Uuid> {
        self.store
            .region_find_by_name(name)
            .map(|r| r.id)
            .ok_or_else(|| unknown("region", name))
    }

    fn site(&self, name: &str) -> anyhow::Result<Uuid> {
        self.store
            .site_find_by_name(name)
            .map(|s| s.id)
            .ok_or_else(|| unknown("site", name))
    }

    fn tenant_group(&self, name: &str) -> anyhow::Result<Uuid> {
        self.store
            .tenant_group_find_by_name(name)
            .map(|g| g.id)
            .ok_or_else(|| unknown("tenant group", name))
    }

    fn tenant(&self, name: &str) -> anyhow::Result<Uuid> {
        self.store
            .tenant_find_by_name(name)
            .map(|t| t.id)
            .ok_or_else(|| unknown("tenant", name))
    }

    fn cluster_group(&self, name: &str) -> anyhow::Result<Uuid> {
        self.store
            .cluster_group_find_by_name(name)
            .map(|g| g.id)
            .ok_or_else(|| unknown("cluster group", name))
    }

    fn cluster(&self, name: &str) -> anyhow::Result<Uuid> {
        self.store
            .cluster_find_by_name(name)
            .map(|c| c.id)
            .ok_or_else(|| unknown("cluster", name))
    }

    fn platform(&self, name: &str) -> anyhow::Result<Uuid> {
        self.store
            .platform_find_by_name(name)
            .map(|p| p.id)
            .ok_or_else(|| unknown("platform", name))
    }

    fn role(&self, name: &str) -> anyhow::Result<Uuid> {
        self.store
            .device_role_find_by_name(name)
            .map(|r| r.id)
            .ok_or_else(|| unknown("device role", name))
    }

    fn tag(&self, name: &str) -> anyhow::Result<Uuid> {
        self.store
            .tag_find_by_name(name)
            .map(|t| t.id)
            .ok_or_else(|| unknown("tag", name))
    }

    fn resolve(&self, axis: Axis, name: &str) -> anyhow::Result<Uuid> {
        match axis {
            Axis::Region => self.region(name),
            Axis::Site => self.site(name),
            Axis::Role => self.role(name),
            Axis::Platform => self.platform(name),
            Axis::TenantGroup => self.tenant_group(name),
            Axis::Tenant => self.tenant(name),
            Axis::ClusterGroup => self.cluster_group(name),
            Axis::Cluster => self.cluster(name),
            Axis::Tag => self.tag(name),
        }
    }

    fn optional(
        &self,
        name: Option<&String>,
        lookup: impl Fn(&Self, &str) -> anyhow::Result<Uuid>,
    ) -> anyhow::Result<Option<Uuid>> {
        name.map(|n| lookup(self, n)).transpose()
    }

    fn organizational(&self, snapshot: &InventorySnapshot) -> anyhow::Result<()> {
        for entry in &snapshot.regions {
            let parent = self.optional(entry.parent.as_ref(), Self::region)?;
            self.store.region_create(&entry.name, parent)?;
        }
        for entry in &snapshot.sites {
            let region = self.optional(entry.region.as_ref(), Self::region)?;
            self.store.site_create(&entry.name, region)?;
        }
        for entry in &snapshot.tenant_groups {
            self.store.tenant_group_create(&entry.name)?;
        }
        for entry in &snapshot.tenants {
            let group = self.optional(entry.group.as_ref(), Self::tenant_group)?;
            self.store.tenant_create(&entry.name, group)?;
        }
        for entry in &snapshot.cluster_groups {
            self.store.cluster_group_create(&entry.name)?;
        }
        for entry in &snapshot.clusters {
            let group = self.optional(entry.group.as_ref(), Self::cluster_group)?;
            let site = self.optional(entry.site.as_ref(), Self::site)?;
            self.store.cluster_create(&entry.name, group, site)?;
        }
        for entry in &snapshot.platforms {
            self.store.platform_create(&entry.name)?;
        }
        for entry in &snapshot.device_roles {
            self.store.device_role_create(&entry.name)?;
        }
        for entry in &snapshot.tags {
            self.store.tag_create(&entry.name)?;
        }
        Ok(())
    }

    fn assign_tags(&self, target: TargetRef, tags: &[String]) -> anyhow::Result<()> {
        for name in tags {
            self.store.tag_assign(target, self.tag(name)?)?;
        }
        Ok(())
    }

    fn targets(&self, snapshot: &InventorySnapshot) -> anyhow::Result<()> {
        for entry in &snapshot.devices {
            let site = self.site(&entry.site)?;
            let role = self.role(&entry.role)?;
            let mut form = DeviceForm::new(&entry.name, site, role);
            form.platform = self.optional(entry.platform.as_ref(), Self::platform)?;
            form.tenant = self.optional(entry.tenant.as_ref(), Self::tenant)?;
            form.local_context_data = entry.local_context_data.clone();

            let device = self.store.device_create(form)?;
            self.assign_tags(TargetRef::device(device.id), &entry.tags)?;
        }

        for entry in &snapshot.virtual_machines {
            let mut form = VirtualMachineForm::new(&entry.name, self.cluster(&entry.cluster)?);
            form.role = self.optional(entry.role.as_ref(), Self::role)?;
            form.platform = self.optional(entry.platform.as_ref(), Self::platform)?;
            form.tenant = self.optional(entry.tenant.as_ref(), Self::tenant)?;
            form.local_context_data = entry.local_context_data.clone();

            let vm = self.store.virtual_machine_create(form)?;
            self.assign_tags(TargetRef::virtual_machine(vm.id), &entry.tags)?;
        }
        Ok(())
    }

    fn extras(&self, snapshot: &InventorySnapshot) -> anyhow::Result<()> {
        for entry in &snapshot.config_contexts {
            let mut associations = ContextAssociations::default();
            for axis in Axis::ALL {
                for name in entry.names(axis) {
                    associations.get_mut(axis).insert(self.resolve(axis, name)?);
                }
            }

            let form = ConfigContextForm {
                name: entry.name.clone(),
                description: entry.description.clone(),
                weight: entry.weight,
                is_active: Some(entry.is_active),
                data: entry.data.clone(),
                associations,
            };
            self.store.config_context_create(form)?;
        }

        for entry in &snapshot.computed_fields {
            let form = ComputedFieldForm {
                slug: entry.slug.clone(),
                label: entry.label.clone(),
                description: entry.description.clone(),
                content_type: entry.content_type,
                template: entry.template.clone(),
                fallback_value: entry.fallback_value.clone(),
                weight: entry.weight,
            };
            self.store.computed_field_create(form)?;
        }
        Ok(())
    }
}
