// In-memory persistence backend
// Holds every inventory table in concurrent maps keyed by id

mod tagged_items;

pub use tagged_items::TaggedItemIndex;

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use netsot_common::{ContentType, Feature, FeatureRegistry, NetsotError, is_valid_slug, slugify};

use crate::model::{
    Axis, Cluster, ClusterGroup, ComputedField, ComputedFieldForm, ConfigContext, ConfigContextForm,
    ContextData, Device, DeviceForm, DeviceRole, Platform, Region, Site, Tag, TargetAxes,
    TargetKind, TargetRef, Tenant, TenantGroup, VirtualMachine, VirtualMachineForm,
};
use crate::traits::{ExtrasPersistence, InventoryPersistence, PersistenceService};

/// Find the first row matching a predicate and clone it out of the map
fn find_by<T: Clone>(table: &DashMap<Uuid, T>, pred: impl Fn(&T) -> bool) -> Option<T> {
    table
        .iter()
        .find(|entry| pred(entry.value()))
        .map(|entry| entry.value().clone())
}

fn validate_name(kind: &'static str, name: &str) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        return Err(NetsotError::IllegalArgument(format!("{} name must not be empty", kind)).into());
    }
    Ok(())
}

fn require_exists<T>(table: &DashMap<Uuid, T>, kind: &'static str, id: Uuid) -> anyhow::Result<()> {
    if table.contains_key(&id) {
        Ok(())
    } else {
        Err(NetsotError::ObjectNotExist(kind, id.to_string()).into())
    }
}

fn require_optional<T>(
    table: &DashMap<Uuid, T>,
    kind: &'static str,
    id: Option<Uuid>,
) -> anyhow::Result<()> {
    match id {
        Some(id) => require_exists(table, kind, id),
        None => Ok(()),
    }
}

/// Local context data must be a JSON object when present
fn validate_local_context(value: Option<Value>) -> anyhow::Result<Option<ContextData>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(NetsotError::ValidationError(
            "local context data must be a JSON object".to_string(),
        )
        .into()),
    }
}

fn named_view(name: &str, slug: &str) -> Value {
    json!({ "name": name, "slug": slug })
}

/// In-memory inventory store
///
/// Cloning is cheap; clones share the same tables.
#[derive(Clone)]
pub struct MemoryPersistService {
    features: Arc<FeatureRegistry>,
    regions: Arc<DashMap<Uuid, Region>>,
    sites: Arc<DashMap<Uuid, Site>>,
    tenant_groups: Arc<DashMap<Uuid, TenantGroup>>,
    tenants: Arc<DashMap<Uuid, Tenant>>,
    cluster_groups: Arc<DashMap<Uuid, ClusterGroup>>,
    clusters: Arc<DashMap<Uuid, Cluster>>,
    platforms: Arc<DashMap<Uuid, Platform>>,
    device_roles: Arc<DashMap<Uuid, DeviceRole>>,
    tags: Arc<DashMap<Uuid, Tag>>,
    /// Key: tag slug, Value: tag id
    tag_slugs: Arc<DashMap<String, Uuid>>,
    devices: Arc<DashMap<Uuid, Device>>,
    /// Key: device name, Value: device id
    device_names: Arc<DashMap<String, Uuid>>,
    virtual_machines: Arc<DashMap<Uuid, VirtualMachine>>,
    /// Key: virtual machine name, Value: virtual machine id
    virtual_machine_names: Arc<DashMap<String, Uuid>>,
    config_contexts: Arc<DashMap<Uuid, ConfigContext>>,
    /// Key: config context name, Value: config context id
    config_context_names: Arc<DashMap<String, Uuid>>,
    computed_fields: Arc<DashMap<Uuid, ComputedField>>,
    /// Key: computed field slug, Value: computed field id
    computed_field_slugs: Arc<DashMap<String, Uuid>>,
    tagged_items: Arc<TaggedItemIndex>,
}

impl Default for MemoryPersistService {
    fn default() -> Self {
        Self::new(FeatureRegistry::default())
    }
}

impl MemoryPersistService {
    pub fn new(features: FeatureRegistry) -> Self {
        Self {
            features: Arc::new(features),
            regions: Arc::new(DashMap::new()),
            sites: Arc::new(DashMap::new()),
            tenant_groups: Arc::new(DashMap::new()),
            tenants: Arc::new(DashMap::new()),
            cluster_groups: Arc::new(DashMap::new()),
            clusters: Arc::new(DashMap::new()),
            platforms: Arc::new(DashMap::new()),
            device_roles: Arc::new(DashMap::new()),
            tags: Arc::new(DashMap::new()),
            tag_slugs: Arc::new(DashMap::new()),
            devices: Arc::new(DashMap::new()),
            device_names: Arc::new(DashMap::new()),
            virtual_machines: Arc::new(DashMap::new()),
            virtual_machine_names: Arc::new(DashMap::new()),
            config_contexts: Arc::new(DashMap::new()),
            config_context_names: Arc::new(DashMap::new()),
            computed_fields: Arc::new(DashMap::new()),
            computed_field_slugs: Arc::new(DashMap::new()),
            tagged_items: Arc::new(TaggedItemIndex::new()),
        }
    }

    // ========================================================================
    // Organizational objects
    // ========================================================================

    pub fn region_create(&self, name: &str, parent: Option<Uuid>) -> anyhow::Result<Region> {
        validate_name("region", name)?;
        require_optional(&self.regions, "region", parent)?;
        if self.region_find_by_name(name).is_some() {
            return Err(NetsotError::DuplicateName("region", name.to_string()).into());
        }

        let region = Region {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
            parent,
        };
        self.regions.insert(region.id, region.clone());
        Ok(region)
    }

    pub fn region_find_by_name(&self, name: &str) -> Option<Region> {
        find_by(&self.regions, |r| r.name == name)
    }

    /// The region followed by its ancestors, nearest first
    pub fn region_ancestors(&self, id: Uuid) -> Vec<Uuid> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(id);

        while let Some(region_id) = current {
            if !seen.insert(region_id) {
                break;
            }
            match self.regions.get(&region_id) {
                Some(region) => {
                    chain.push(region_id);
                    current = region.parent;
                }
                None => break,
            }
        }
        chain
    }

    pub fn site_create(&self, name: &str, region: Option<Uuid>) -> anyhow::Result<Site> {
        validate_name("site", name)?;
        require_optional(&self.regions, "region", region)?;
        if self.site_find_by_name(name).is_some() {
            return Err(NetsotError::DuplicateName("site", name.to_string()).into());
        }

        let site = Site {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
            region,
        };
        self.sites.insert(site.id, site.clone());
        Ok(site)
    }

    pub fn site_find_by_name(&self, name: &str) -> Option<Site> {
        find_by(&self.sites, |s| s.name == name)
    }

    pub fn tenant_group_create(&self, name: &str) -> anyhow::Result<TenantGroup> {
        validate_name("tenant group", name)?;
        if self.tenant_group_find_by_name(name).is_some() {
            return Err(NetsotError::DuplicateName("tenant group", name.to_string()).into());
        }

        let group = TenantGroup {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
        };
        self.tenant_groups.insert(group.id, group.clone());
        Ok(group)
    }

    pub fn tenant_group_find_by_name(&self, name: &str) -> Option<TenantGroup> {
        find_by(&self.tenant_groups, |g| g.name == name)
    }

    pub fn tenant_create(&self, name: &str, group: Option<Uuid>) -> anyhow::Result<Tenant> {
        validate_name("tenant", name)?;
        require_optional(&self.tenant_groups, "tenant group", group)?;
        if self.tenant_find_by_name(name).is_some() {
            return Err(NetsotError::DuplicateName("tenant", name.to_string()).into());
        }

        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
            group,
        };
        self.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    pub fn tenant_find_by_name(&self, name: &str) -> Option<Tenant> {
        find_by(&self.tenants, |t| t.name == name)
    }

    pub fn cluster_group_create(&self, name: &str) -> anyhow::Result<ClusterGroup> {
        validate_name("cluster group", name)?;
        if self.cluster_group_find_by_name(name).is_some() {
            return Err(NetsotError::DuplicateName("cluster group", name.to_string()).into());
        }

        let group = ClusterGroup {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
        };
        self.cluster_groups.insert(group.id, group.clone());
        Ok(group)
    }

    pub fn cluster_group_find_by_name(&self, name: &str) -> Option<ClusterGroup> {
        find_by(&self.cluster_groups, |g| g.name == name)
    }

    pub fn cluster_create(
        &self,
        name: &str,
        group: Option<Uuid>,
        site: Option<Uuid>,
    ) -> anyhow::Result<Cluster> {
        validate_name("cluster", name)?;
        require_optional(&self.cluster_groups, "cluster group", group)?;
        require_optional(&self.sites, "site", site)?;
        if self.cluster_find_by_name(name).is_some() {
            return Err(NetsotError::DuplicateName("cluster", name.to_string()).into());
        }

        let cluster = Cluster {
            id: Uuid::new_v4(),
            name: name.to_string(),
            group,
            site,
        };
        self.clusters.insert(cluster.id, cluster.clone());
        Ok(cluster)
    }

    pub fn cluster_find_by_name(&self, name: &str) -> Option<Cluster> {
        find_by(&self.clusters, |c| c.name == name)
    }

    pub fn platform_create(&self, name: &str) -> anyhow::Result<Platform> {
        validate_name("platform", name)?;
        if self.platform_find_by_name(name).is_some() {
            return Err(NetsotError::DuplicateName("platform", name.to_string()).into());
        }

        let platform = Platform {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
        };
        self.platforms.insert(platform.id, platform.clone());
        Ok(platform)
    }

    pub fn platform_find_by_name(&self, name: &str) -> Option<Platform> {
        find_by(&self.platforms, |p| p.name == name)
    }

    pub fn device_role_create(&self, name: &str) -> anyhow::Result<DeviceRole> {
        validate_name("device role", name)?;
        if self.device_role_find_by_name(name).is_some() {
            return Err(NetsotError::DuplicateName("device role", name.to_string()).into());
        }

        let role = DeviceRole {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
        };
        self.device_roles.insert(role.id, role.clone());
        Ok(role)
    }

    pub fn device_role_find_by_name(&self, name: &str) -> Option<DeviceRole> {
        find_by(&self.device_roles, |r| r.name == name)
    }

    // ========================================================================
    // Tags
    // ========================================================================

    pub fn tag_create(&self, name: &str) -> anyhow::Result<Tag> {
        validate_name("tag", name)?;
        let tag = Tag::new(name);
        if !is_valid_slug(&tag.slug) {
            return Err(NetsotError::IllegalArgument(format!(
                "tag name '{}' does not produce a usable slug",
                name
            ))
            .into());
        }

        match self.tag_slugs.entry(tag.slug.clone()) {
            Entry::Occupied(_) => {
                return Err(NetsotError::DuplicateName("tag", tag.slug).into());
            }
            Entry::Vacant(entry) => {
                entry.insert(tag.id);
            }
        }
        self.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    /// Look a tag up by exact name, falling back to its slug
    pub fn tag_find_by_name(&self, name: &str) -> Option<Tag> {
        find_by(&self.tags, |t| t.name == name).or_else(|| {
            self.tag_slugs
                .get(&slugify(name))
                .and_then(|id| self.tags.get(id.value()).map(|tag| tag.clone()))
        })
    }

    pub fn tag_assign(&self, target: TargetRef, tag: Uuid) -> anyhow::Result<()> {
        self.features
            .require(Feature::Tags, target.kind.content_type())?;
        require_exists(&self.tags, "tag", tag)?;
        self.require_target(target)?;

        if self.tagged_items.assign(target, tag) {
            debug!(%target, %tag, "Assigned tag");
        }
        Ok(())
    }

    pub fn tag_remove(&self, target: TargetRef, tag: Uuid) -> anyhow::Result<bool> {
        Ok(self.tagged_items.remove(target, tag))
    }

    // ========================================================================
    // Devices and virtual machines
    // ========================================================================

    fn require_target(&self, target: TargetRef) -> anyhow::Result<()> {
        let exists = match target.kind {
            TargetKind::Device => self.devices.contains_key(&target.id),
            TargetKind::VirtualMachine => self.virtual_machines.contains_key(&target.id),
        };
        if exists {
            Ok(())
        } else {
            Err(NetsotError::TargetNotExist(target.to_string()).into())
        }
    }

    pub fn device_create(&self, form: DeviceForm) -> anyhow::Result<Device> {
        validate_name("device", &form.name)?;
        require_exists(&self.sites, "site", form.site)?;
        require_exists(&self.device_roles, "device role", form.device_role)?;
        require_optional(&self.platforms, "platform", form.platform)?;
        require_optional(&self.tenants, "tenant", form.tenant)?;
        let local_context_data = validate_local_context(form.local_context_data)?;

        let device = Device {
            id: Uuid::new_v4(),
            name: form.name,
            site: form.site,
            device_role: form.device_role,
            platform: form.platform,
            tenant: form.tenant,
            local_context_data,
        };

        match self.device_names.entry(device.name.clone()) {
            Entry::Occupied(entry) => {
                return Err(NetsotError::DuplicateName("device", entry.key().clone()).into());
            }
            Entry::Vacant(entry) => {
                entry.insert(device.id);
            }
        }
        self.devices.insert(device.id, device.clone());
        Ok(device)
    }

    pub fn device_delete(&self, id: Uuid) -> bool {
        self.tagged_items.remove_target(TargetRef::device(id));
        match self.devices.remove(&id) {
            Some((_, device)) => {
                self.device_names.remove(&device.name);
                true
            }
            None => false,
        }
    }

    pub fn virtual_machine_create(
        &self,
        form: VirtualMachineForm,
    ) -> anyhow::Result<VirtualMachine> {
        validate_name("virtual machine", &form.name)?;
        require_exists(&self.clusters, "cluster", form.cluster)?;
        require_optional(&self.device_roles, "device role", form.role)?;
        require_optional(&self.platforms, "platform", form.platform)?;
        require_optional(&self.tenants, "tenant", form.tenant)?;
        let local_context_data = validate_local_context(form.local_context_data)?;

        let vm = VirtualMachine {
            id: Uuid::new_v4(),
            name: form.name,
            cluster: form.cluster,
            role: form.role,
            platform: form.platform,
            tenant: form.tenant,
            local_context_data,
        };

        match self.virtual_machine_names.entry(vm.name.clone()) {
            Entry::Occupied(entry) => {
                return Err(
                    NetsotError::DuplicateName("virtual machine", entry.key().clone()).into(),
                );
            }
            Entry::Vacant(entry) => {
                entry.insert(vm.id);
            }
        }
        self.virtual_machines.insert(vm.id, vm.clone());
        Ok(vm)
    }

    pub fn virtual_machine_delete(&self, id: Uuid) -> bool {
        self.tagged_items.remove_target(TargetRef::virtual_machine(id));
        match self.virtual_machines.remove(&id) {
            Some((_, vm)) => {
                self.virtual_machine_names.remove(&vm.name);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Config contexts
    // ========================================================================

    fn object_exists(&self, content_type: ContentType, id: Uuid) -> bool {
        match content_type {
            ContentType::Region => self.regions.contains_key(&id),
            ContentType::Site => self.sites.contains_key(&id),
            ContentType::DeviceRole => self.device_roles.contains_key(&id),
            ContentType::Platform => self.platforms.contains_key(&id),
            ContentType::TenantGroup => self.tenant_groups.contains_key(&id),
            ContentType::Tenant => self.tenants.contains_key(&id),
            ContentType::ClusterGroup => self.cluster_groups.contains_key(&id),
            ContentType::Cluster => self.clusters.contains_key(&id),
            ContentType::Tag => self.tags.contains_key(&id),
            ContentType::Device => self.devices.contains_key(&id),
            ContentType::VirtualMachine => self.virtual_machines.contains_key(&id),
            ContentType::ConfigContext => self.config_contexts.contains_key(&id),
        }
    }

    /// Check the form and return its data as a JSON object
    fn validate_context_form(&self, form: &ConfigContextForm) -> anyhow::Result<ContextData> {
        validate_name("config context", &form.name)?;

        let data = match &form.data {
            Value::Object(map) => map.clone(),
            other => {
                return Err(NetsotError::ValidationError(format!(
                    "config context data must be a JSON object, got {}",
                    json_type_name(other)
                ))
                .into());
            }
        };

        for axis in Axis::ALL {
            for id in form.associations.get(axis) {
                if !self.object_exists(axis.content_type(), *id) {
                    return Err(
                        NetsotError::ObjectNotExist(axis.as_str(), id.to_string()).into()
                    );
                }
            }
        }
        Ok(data)
    }

    fn computed_field_label_taken(&self, content_type: ContentType, label: &str) -> bool {
        self.computed_fields
            .iter()
            .any(|f| f.content_type == content_type && f.label == label)
    }

    pub fn computed_field_create(&self, form: ComputedFieldForm) -> anyhow::Result<ComputedField> {
        self.features
            .require(Feature::CustomFields, form.content_type)?;
        validate_name("computed field", &form.label)?;
        if form.template.trim().is_empty() {
            return Err(NetsotError::IllegalArgument(
                "computed field template must not be empty".to_string(),
            )
            .into());
        }

        let slug = form.slug_or_default();
        if !is_valid_slug(&slug) {
            return Err(NetsotError::IllegalArgument(format!("invalid slug '{}'", slug)).into());
        }
        if self.computed_field_label_taken(form.content_type, &form.label) {
            return Err(NetsotError::DuplicateName("computed field", form.label).into());
        }

        let field = ComputedField {
            id: Uuid::new_v4(),
            slug: slug.clone(),
            weight: form.weight_or_default(),
            label: form.label,
            description: form.description,
            content_type: form.content_type,
            template: form.template,
            fallback_value: form.fallback_value,
        };

        match self.computed_field_slugs.entry(slug) {
            Entry::Occupied(entry) => {
                return Err(
                    NetsotError::DuplicateName("computed field", entry.key().clone()).into(),
                );
            }
            Entry::Vacant(entry) => {
                entry.insert(field.id);
            }
        }
        self.computed_fields.insert(field.id, field.clone());
        Ok(field)
    }

    // ========================================================================
    // Target resolution helpers
    // ========================================================================

    fn site_regions(&self, site: Option<Uuid>) -> Vec<Uuid> {
        site.and_then(|id| self.sites.get(&id).and_then(|s| s.region))
            .map(|region| self.region_ancestors(region))
            .unwrap_or_default()
    }

    fn tenant_group_of(&self, tenant: Option<Uuid>) -> Option<Uuid> {
        tenant.and_then(|id| self.tenants.get(&id).and_then(|t| t.group))
    }

    fn tag_slugs_for(&self, target: TargetRef) -> Vec<String> {
        let mut slugs: Vec<String> = self
            .tagged_items
            .tags_for(target)
            .iter()
            .filter_map(|id| self.tags.get(id).map(|t| t.slug.clone()))
            .collect();
        slugs.sort();
        slugs
    }

    fn region_view(&self, id: Option<Uuid>) -> Value {
        id.and_then(|id| self.regions.get(&id).map(|r| named_view(&r.name, &r.slug)))
            .unwrap_or(Value::Null)
    }

    fn site_view(&self, id: Option<Uuid>) -> Value {
        id.and_then(|id| self.sites.get(&id).map(|s| named_view(&s.name, &s.slug)))
            .unwrap_or(Value::Null)
    }

    fn role_view(&self, id: Option<Uuid>) -> Value {
        id.and_then(|id| self.device_roles.get(&id).map(|r| named_view(&r.name, &r.slug)))
            .unwrap_or(Value::Null)
    }

    fn platform_view(&self, id: Option<Uuid>) -> Value {
        id.and_then(|id| self.platforms.get(&id).map(|p| named_view(&p.name, &p.slug)))
            .unwrap_or(Value::Null)
    }

    fn tenant_view(&self, id: Option<Uuid>) -> Value {
        id.and_then(|id| self.tenants.get(&id).map(|t| named_view(&t.name, &t.slug)))
            .unwrap_or(Value::Null)
    }

    fn tenant_group_view(&self, id: Option<Uuid>) -> Value {
        id.and_then(|id| self.tenant_groups.get(&id).map(|g| named_view(&g.name, &g.slug)))
            .unwrap_or(Value::Null)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ExtrasPersistence for MemoryPersistService {
    fn config_context_create(&self, form: ConfigContextForm) -> anyhow::Result<ConfigContext> {
        let data = self.validate_context_form(&form)?;
        let now = Utc::now();
        let context = ConfigContext {
            id: Uuid::new_v4(),
            weight: form.weight_or_default(),
            is_active: form.is_active_or_default(),
            name: form.name,
            description: form.description,
            data,
            associations: form.associations,
            created: now,
            last_updated: now,
        };

        match self.config_context_names.entry(context.name.clone()) {
            Entry::Occupied(entry) => {
                return Err(
                    NetsotError::DuplicateName("config context", entry.key().clone()).into()
                );
            }
            Entry::Vacant(entry) => {
                entry.insert(context.id);
            }
        }
        self.config_contexts.insert(context.id, context.clone());
        debug!(name = %context.name, weight = context.weight, "Created config context");
        Ok(context)
    }

    fn config_context_update(
        &self,
        id: Uuid,
        form: ConfigContextForm,
    ) -> anyhow::Result<ConfigContext> {
        let existing = self
            .config_contexts
            .get(&id)
            .map(|c| c.clone())
            .ok_or_else(|| NetsotError::ObjectNotExist("config context", id.to_string()))?;
        let data = self.validate_context_form(&form)?;

        if existing.name != form.name {
            match self.config_context_names.entry(form.name.clone()) {
                Entry::Occupied(entry) if *entry.get() != id => {
                    return Err(
                        NetsotError::DuplicateName("config context", form.name).into()
                    );
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(entry) => {
                    entry.insert(id);
                }
            }
            self.config_context_names.remove(&existing.name);
        }

        let updated = ConfigContext {
            id,
            weight: form.weight_or_default(),
            is_active: form.is_active_or_default(),
            name: form.name,
            description: form.description,
            data,
            associations: form.associations,
            created: existing.created,
            last_updated: Utc::now(),
        };
        self.config_contexts.insert(id, updated.clone());
        Ok(updated)
    }

    fn config_context_delete(&self, id: Uuid) -> anyhow::Result<bool> {
        match self.config_contexts.remove(&id) {
            Some((_, context)) => {
                self.config_context_names.remove(&context.name);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn config_context_find_by_name(&self, name: &str) -> anyhow::Result<Option<ConfigContext>> {
        Ok(self
            .config_context_names
            .get(name)
            .and_then(|id| self.config_contexts.get(id.value()).map(|c| c.clone())))
    }

    fn config_context_find_all(&self) -> anyhow::Result<Vec<ConfigContext>> {
        Ok(self
            .config_contexts
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn config_context_find_active(&self) -> anyhow::Result<Vec<ConfigContext>> {
        Ok(self
            .config_contexts
            .iter()
            .filter(|entry| entry.is_active)
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn tag_find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Tag>> {
        Ok(self
            .tag_slugs
            .get(slug)
            .and_then(|id| self.tags.get(id.value()).map(|t| t.clone())))
    }

    fn tags_for(&self, target: TargetRef) -> anyhow::Result<BTreeSet<Uuid>> {
        Ok(self.tagged_items.tags_for(target))
    }

    fn tagged_with(&self, tag: Uuid) -> anyhow::Result<BTreeSet<TargetRef>> {
        Ok(self.tagged_items.tagged_with(tag))
    }

    fn computed_field_find_by_content_type(
        &self,
        content_type: ContentType,
    ) -> anyhow::Result<Vec<ComputedField>> {
        let mut fields: Vec<ComputedField> = self
            .computed_fields
            .iter()
            .filter(|entry| entry.content_type == content_type)
            .map(|entry| entry.value().clone())
            .collect();
        fields.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.slug.cmp(&b.slug)));
        Ok(fields)
    }
}

impl InventoryPersistence for MemoryPersistService {
    fn device_find_by_name(&self, name: &str) -> anyhow::Result<Option<Device>> {
        Ok(self
            .device_names
            .get(name)
            .and_then(|id| self.devices.get(id.value()).map(|d| d.clone())))
    }

    fn virtual_machine_find_by_name(&self, name: &str) -> anyhow::Result<Option<VirtualMachine>> {
        Ok(self
            .virtual_machine_names
            .get(name)
            .and_then(|id| self.virtual_machines.get(id.value()).map(|vm| vm.clone())))
    }

    fn target_find_all(&self, kind: TargetKind) -> anyhow::Result<Vec<TargetRef>> {
        let mut named: Vec<(String, TargetRef)> = match kind {
            TargetKind::Device => self
                .devices
                .iter()
                .map(|d| (d.name.clone(), TargetRef::device(d.id)))
                .collect(),
            TargetKind::VirtualMachine => self
                .virtual_machines
                .iter()
                .map(|vm| (vm.name.clone(), TargetRef::virtual_machine(vm.id)))
                .collect(),
        };
        named.sort();
        Ok(named.into_iter().map(|(_, target)| target).collect())
    }

    fn target_axes(&self, target: TargetRef) -> anyhow::Result<Option<TargetAxes>> {
        let mut axes = match target.kind {
            TargetKind::Device => {
                let Some(device) = self.devices.get(&target.id).map(|d| d.clone()) else {
                    return Ok(None);
                };
                let mut axes = TargetAxes::new(target, &device.name);
                axes.regions = self.site_regions(Some(device.site));
                axes.site = Some(device.site);
                axes.role = Some(device.device_role);
                axes.platform = device.platform;
                axes.tenant = device.tenant;
                axes.tenant_group = self.tenant_group_of(device.tenant);
                axes.local_context_data = device.local_context_data;
                axes
            }
            TargetKind::VirtualMachine => {
                let Some(vm) = self.virtual_machines.get(&target.id).map(|v| v.clone()) else {
                    return Ok(None);
                };
                let cluster = self.clusters.get(&vm.cluster).map(|c| c.clone());
                let site = cluster.as_ref().and_then(|c| c.site);

                let mut axes = TargetAxes::new(target, &vm.name);
                axes.regions = self.site_regions(site);
                axes.site = site;
                axes.role = vm.role;
                axes.platform = vm.platform;
                axes.tenant = vm.tenant;
                axes.tenant_group = self.tenant_group_of(vm.tenant);
                axes.cluster = Some(vm.cluster);
                axes.cluster_group = cluster.and_then(|c| c.group);
                axes.local_context_data = vm.local_context_data;
                axes
            }
        };

        axes.tags = self.tagged_items.tags_for(target);
        Ok(Some(axes))
    }

    fn target_view(&self, target: TargetRef) -> anyhow::Result<Option<Value>> {
        let Some(axes) = self.target_axes(target)? else {
            return Ok(None);
        };

        let cluster = axes
            .cluster
            .and_then(|id| self.clusters.get(&id).map(|c| json!({ "name": c.name })))
            .unwrap_or(Value::Null);

        Ok(Some(json!({
            "id": target.id.to_string(),
            "kind": target.kind.as_str(),
            "name": axes.name,
            "region": self.region_view(axes.regions.first().copied()),
            "site": self.site_view(axes.site),
            "role": self.role_view(axes.role),
            "platform": self.platform_view(axes.platform),
            "tenant": self.tenant_view(axes.tenant),
            "tenant_group": self.tenant_group_view(axes.tenant_group),
            "cluster": cluster,
            "tags": self.tag_slugs_for(target),
        })))
    }
}

impl PersistenceService for MemoryPersistService {
    fn features(&self) -> &FeatureRegistry {
        &self.features
    }
}
