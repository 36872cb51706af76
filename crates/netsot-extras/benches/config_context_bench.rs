// Benchmarks for config context resolution
// Compares per-object rendering with bulk annotation over one index

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;

use netsot_extras::{ConfigContextService, merge};
use netsot_persistence::{
    Axis, ConfigContextForm, ContextData, DeviceForm, ExtrasPersistence, InventoryPersistence,
    MemoryPersistService, TargetKind, TargetRef,
};

/// Store with `devices` devices spread over 10 sites and 4 tags, plus
/// `contexts` contexts scoped to a rotating axis
fn populate(devices: usize, contexts: usize) -> MemoryPersistService {
    let store = MemoryPersistService::default();
    let region = store.region_create("Region", None).unwrap().id;
    let role = store.device_role_create("Role").unwrap().id;
    let sites: Vec<_> = (0..10)
        .map(|i| store.site_create(&format!("site-{i}"), Some(region)).unwrap().id)
        .collect();
    let tags: Vec<_> = (0..4)
        .map(|i| store.tag_create(&format!("tag-{i}")).unwrap().id)
        .collect();

    for i in 0..contexts {
        let mut form = ConfigContextForm::new(
            &format!("context-{i}"),
            (i % 5) as u32,
            json!({"index": i, "ntp": {(format!("server-{}", i % 7)): "10.0.0.1"}}),
        );
        form = match i % 4 {
            0 => form,
            1 => form.with(Axis::Site, sites[i % sites.len()]),
            2 => form.with(Axis::Tag, tags[i % tags.len()]),
            _ => form.with(Axis::Region, region),
        };
        store.config_context_create(form).unwrap();
    }

    for i in 0..devices {
        let device = store
            .device_create(DeviceForm::new(&format!("device-{i}"), sites[i % sites.len()], role))
            .unwrap();
        store
            .tag_assign(TargetRef::device(device.id), tags[i % tags.len()])
            .unwrap();
    }
    store
}

fn bench_get_config_context(c: &mut Criterion) {
    let store = populate(1, 200);
    let target = store.target_find_all(TargetKind::Device).unwrap()[0];
    let service = ConfigContextService::new(Arc::new(store));

    c.bench_function("get_config_context_200_contexts", |b| {
        b.iter(|| service.get_config_context(black_box(target)))
    });
}

fn bench_per_object_vs_annotate(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_batch");

    for devices in [10usize, 100, 500] {
        let store = populate(devices, 200);
        let targets = store.target_find_all(TargetKind::Device).unwrap();
        let service = ConfigContextService::new(Arc::new(store));

        group.bench_with_input(
            BenchmarkId::new("per_object", devices),
            &targets,
            |b, targets| {
                b.iter(|| {
                    for target in targets {
                        black_box(service.get_config_context(*target).unwrap());
                    }
                })
            },
        );
        group.bench_with_input(
            BenchmarkId::new("annotate", devices),
            &targets,
            |b, targets| b.iter(|| black_box(service.annotate(targets).unwrap())),
        );
    }

    group.finish();
}

fn bench_deep_merge(c: &mut Criterion) {
    let documents: Vec<ContextData> = (0..50)
        .map(|i| match json!({"a": {"b": {(format!("k{}", i % 10)): i}}, "list": [i]}) {
            serde_json::Value::Object(map) => map,
            _ => ContextData::new(),
        })
        .collect();

    c.bench_function("deep_merge_50_documents", |b| {
        b.iter(|| merge(black_box(&documents)))
    });
}

criterion_group!(
    benches,
    bench_get_config_context,
    bench_per_object_vs_annotate,
    bench_deep_merge
);
criterion_main!(benches);
