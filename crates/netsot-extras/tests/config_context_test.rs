// Integration tests for config context resolution
// Tests weighting, ordering, deep merge and bulk/per-object consistency

use std::sync::Arc;

use serde_json::{Value, json};
use uuid::Uuid;

use netsot_extras::ConfigContextService;
use netsot_persistence::{
    Axis, ConfigContextForm, DeviceForm, ExtrasPersistence, MemoryPersistService, TargetRef,
    VirtualMachineForm,
};

struct Fixture {
    store: MemoryPersistService,
    role: Uuid,
    region: Uuid,
    site: Uuid,
    platform: Uuid,
    tenant_group: Uuid,
    tenant: Uuid,
    tag: Uuid,
    tag2: Uuid,
    device: TargetRef,
}

impl Fixture {
    fn new() -> Self {
        let store = MemoryPersistService::default();
        let role = store.device_role_create("Device Role 1").unwrap().id;
        let region = store.region_create("Region", None).unwrap().id;
        let site = store.site_create("Site-1", Some(region)).unwrap().id;
        let platform = store.platform_create("Platform").unwrap().id;
        let tenant_group = store.tenant_group_create("Tenant Group").unwrap().id;
        let tenant = store.tenant_create("Tenant", Some(tenant_group)).unwrap().id;
        let tag = store.tag_create("Tag").unwrap().id;
        let tag2 = store.tag_create("Tag2").unwrap().id;
        let device = store
            .device_create(DeviceForm::new("Device 1", site, role))
            .unwrap();

        Self {
            store,
            role,
            region,
            site,
            platform,
            tenant_group,
            tenant,
            tag,
            tag2,
            device: TargetRef::device(device.id),
        }
    }

    fn context(&self, form: ConfigContextForm) {
        self.store.config_context_create(form).unwrap();
    }

    /// A fully related device carrying the given tags
    fn related_device(&self, name: &str, tags: &[Uuid]) -> TargetRef {
        let mut form = DeviceForm::new(name, self.site, self.role);
        form.platform = Some(self.platform);
        form.tenant = Some(self.tenant);
        let device = self.store.device_create(form).unwrap();
        let target = TargetRef::device(device.id);
        for tag in tags {
            self.store.tag_assign(target, *tag).unwrap();
        }
        target
    }

    fn relation_contexts(&self) {
        self.context(
            ConfigContextForm::new("site", 100, json!({"site": 1}))
                .with(Axis::Site, self.site),
        );
        self.context(
            ConfigContextForm::new("region", 100, json!({"region": 1}))
                .with(Axis::Region, self.region),
        );
        self.context(
            ConfigContextForm::new("platform", 100, json!({"platform": 1}))
                .with(Axis::Platform, self.platform),
        );
        self.context(
            ConfigContextForm::new("tenant group", 100, json!({"tenant_group": 1}))
                .with(Axis::TenantGroup, self.tenant_group),
        );
        self.context(
            ConfigContextForm::new("tenant", 100, json!({"tenant": 1}))
                .with(Axis::Tenant, self.tenant),
        );
        self.context(
            ConfigContextForm::new("tag", 100, json!({"tag": 1}))
                .with(Axis::Tag, self.tag),
        );
    }

    fn service(&self) -> ConfigContextService {
        ConfigContextService::new(Arc::new(self.store.clone()))
    }
}

fn rendered(service: &ConfigContextService, target: TargetRef) -> Value {
    Value::Object(service.get_config_context(target).unwrap())
}

fn annotated(service: &ConfigContextService, target: TargetRef) -> Value {
    let mut result = service.annotate(&[target]).unwrap();
    Value::Object(result.remove(&target).unwrap())
}

#[test]
fn test_higher_weight_wins() {
    let fx = Fixture::new();
    fx.context(ConfigContextForm::new("context 1", 101, json!({"a": 123, "b": 456, "c": 777})));
    fx.context(ConfigContextForm::new("context 2", 100, json!({"a": 123, "b": 456, "c": 789})));

    assert_eq!(
        rendered(&fx.service(), fx.device),
        json!({"a": 123, "b": 456, "c": 777})
    );
}

#[test]
fn test_name_ordering_after_weight() {
    let fx = Fixture::new();
    fx.context(ConfigContextForm::new("context 1", 100, json!({"a": 123, "b": 456, "c": 777})));
    fx.context(ConfigContextForm::new("context 2", 100, json!({"a": 123, "b": 456, "c": 789})));

    assert_eq!(
        rendered(&fx.service(), fx.device),
        json!({"a": 123, "b": 456, "c": 789})
    );
}

#[test]
fn test_annotation_same_as_get_for_object() {
    let fx = Fixture::new();
    fx.context(ConfigContextForm::new("context 1", 101, json!({"a": 123, "b": 456, "c": 777})));
    fx.context(ConfigContextForm::new("context 2", 100, json!({"a": 123, "b": 456, "c": 789})));
    fx.context(ConfigContextForm::new("context 3", 99, json!({"d": 1})));
    fx.context(ConfigContextForm::new("context 4", 99, json!({"d": 2})));

    let service = fx.service();
    assert_eq!(rendered(&service, fx.device), annotated(&service, fx.device));
    assert_eq!(
        rendered(&service, fx.device),
        json!({"a": 123, "b": 456, "c": 777, "d": 2})
    );
}

#[test]
fn test_annotation_same_as_get_for_object_device_relations() {
    let fx = Fixture::new();
    fx.relation_contexts();
    let device = fx.related_device("Device 2", &[fx.tag]);

    let service = fx.service();
    assert_eq!(rendered(&service, device), annotated(&service, device));
    assert_eq!(
        rendered(&service, device),
        json!({"site": 1, "region": 1, "platform": 1, "tenant_group": 1, "tenant": 1, "tag": 1})
    );
}

#[test]
fn test_annotation_same_as_get_for_object_virtualmachine_relations() {
    let fx = Fixture::new();
    fx.relation_contexts();

    let cluster_group = fx.store.cluster_group_create("Cluster Group").unwrap().id;
    fx.context(
        ConfigContextForm::new("cluster group", 100, json!({"cluster_group": 1}))
            .with(Axis::ClusterGroup, cluster_group),
    );
    let cluster = fx
        .store
        .cluster_create("Cluster", Some(cluster_group), None)
        .unwrap()
        .id;
    fx.context(
        ConfigContextForm::new("cluster", 100, json!({"cluster": 1}))
            .with(Axis::Cluster, cluster),
    );

    let mut form = VirtualMachineForm::new("VM 1", cluster);
    form.tenant = Some(fx.tenant);
    form.platform = Some(fx.platform);
    form.role = Some(fx.role);
    let vm = fx.store.virtual_machine_create(form).unwrap();
    let target = TargetRef::virtual_machine(vm.id);
    fx.store.tag_assign(target, fx.tag).unwrap();

    let service = fx.service();
    assert_eq!(rendered(&service, target), annotated(&service, target));

    // The cluster has no site, so site and region contexts do not apply
    assert_eq!(
        rendered(&service, target),
        json!({
            "platform": 1,
            "tenant_group": 1,
            "tenant": 1,
            "tag": 1,
            "cluster_group": 1,
            "cluster": 1
        })
    );
}

#[test]
fn test_cluster_axes_unconstrained_for_devices() {
    let fx = Fixture::new();
    let cluster = fx.store.cluster_create("Cluster", None, None).unwrap().id;
    fx.context(
        ConfigContextForm::new("cluster", 100, json!({"cluster": 1}))
            .with(Axis::Cluster, cluster),
    );

    let service = fx.service();
    assert_eq!(rendered(&service, fx.device), json!({"cluster": 1}));
    assert_eq!(annotated(&service, fx.device), json!({"cluster": 1}));
}

#[test]
fn test_multiple_tags_return_distinct_objects() {
    let fx = Fixture::new();
    fx.context(
        ConfigContextForm::new("tag", 100, json!({"tag": 1}))
            .with(Axis::Tag, fx.tag)
            .with(Axis::Tag, fx.tag2),
    );
    let device = fx.related_device("Device 3", &[fx.tag, fx.tag2]);

    let service = fx.service();
    assert_eq!(service.get_for_object(device).unwrap().len(), 1);
    assert_eq!(rendered(&service, device), annotated(&service, device));
}

#[test]
fn test_multiple_tags_return_distinct_objects_with_separate_config_contexts() {
    let fx = Fixture::new();
    fx.context(ConfigContextForm::new("tag-1", 100, json!({"tag": 1})).with(Axis::Tag, fx.tag));
    fx.context(ConfigContextForm::new("tag-2", 100, json!({"tag": 1})).with(Axis::Tag, fx.tag2));
    let device = fx.related_device("Device 3", &[fx.tag, fx.tag2]);

    let service = fx.service();
    assert_eq!(service.get_for_object(device).unwrap().len(), 2);
    assert_eq!(rendered(&service, device), annotated(&service, device));
}

#[test]
fn test_inactive_context_ignored() {
    let fx = Fixture::new();
    fx.context(ConfigContextForm::new("active", 100, json!({"a": 1})));
    fx.context(ConfigContextForm::new("inactive", 200, json!({"a": 2})).inactive());

    let service = fx.service();
    assert_eq!(rendered(&service, fx.device), json!({"a": 1}));
    assert_eq!(annotated(&service, fx.device), json!({"a": 1}));
}

#[test]
fn test_parent_region_applies_to_child_sites() {
    let fx = Fixture::new();
    let parent = fx.store.region_create("Parent", None).unwrap().id;
    let child = fx.store.region_create("Child", Some(parent)).unwrap().id;
    let site = fx.store.site_create("Site-2", Some(child)).unwrap().id;
    let device = fx
        .store
        .device_create(DeviceForm::new("Device 4", site, fx.role))
        .unwrap();
    let target = TargetRef::device(device.id);

    fx.context(
        ConfigContextForm::new("parent", 100, json!({"scope": "parent"}))
            .with(Axis::Region, parent),
    );

    let service = fx.service();
    assert_eq!(rendered(&service, target), json!({"scope": "parent"}));
    assert_eq!(annotated(&service, target), json!({"scope": "parent"}));

    // The original device sits in an unrelated region
    assert_eq!(rendered(&service, fx.device), json!({}));
}

#[test]
fn test_local_context_data_overrides() {
    let fx = Fixture::new();
    fx.context(ConfigContextForm::new(
        "base",
        100,
        json!({"ntp": {"primary": "a", "secondary": "b"}}),
    ));

    let mut form = DeviceForm::new("Device 5", fx.site, fx.role);
    form.local_context_data = Some(json!({"ntp": {"primary": "local"}, "extra": true}));
    let device = fx.store.device_create(form).unwrap();
    let target = TargetRef::device(device.id);

    let service = fx.service();
    let expected = json!({"ntp": {"primary": "local", "secondary": "b"}, "extra": true});
    assert_eq!(rendered(&service, target), expected);
    assert_eq!(annotated(&service, target), expected);
}

#[test]
fn test_annotate_batch() {
    let fx = Fixture::new();
    fx.relation_contexts();
    let tagged = fx.related_device("Device 2", &[fx.tag]);
    let untagged = fx.related_device("Device 3", &[]);

    let service = fx.service();
    let result = service.annotate(&[fx.device, tagged, untagged]).unwrap();
    assert_eq!(result.len(), 3);
    for (target, data) in result {
        assert_eq!(Value::Object(data), rendered(&service, target));
    }
}

#[test]
fn test_context_update_takes_effect() {
    let fx = Fixture::new();
    let ctx = fx
        .store
        .config_context_create(ConfigContextForm::new("ctx", 100, json!({"a": 1})))
        .unwrap();
    let service = fx.service();
    assert_eq!(rendered(&service, fx.device), json!({"a": 1}));

    fx.store
        .config_context_update(
            ctx.id,
            ConfigContextForm::new("ctx", 100, json!({"a": 2})).with(Axis::Tenant, fx.tenant),
        )
        .unwrap();
    assert_eq!(rendered(&service, fx.device), json!({}));
}
