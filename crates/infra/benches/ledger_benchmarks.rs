use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use assetdesk_core::Pagination;
use assetdesk_infra::store::InMemoryStore;
use assetdesk_infra::{Actor, AuditLogger, InventoryService, LedgerWriter, MoveRequest};
use assetdesk_inventory::{InventoryCategory, MovementType, NewInventoryItem, replay};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn new_item(sku: String) -> NewInventoryItem {
    NewInventoryItem {
        sku: sku.clone(),
        name: sku,
        category: InventoryCategory::Peripheral,
        unit: None,
        location: None,
        stock: 1_000_000,
        min_stock: 0,
        notes: None,
    }
}

fn bench_apply_movement(c: &mut Criterion) {
    let rt = runtime();
    let store = Arc::new(InMemoryStore::new());
    let audit = AuditLogger::new(store.clone());
    let inventory = InventoryService::new(store.clone(), audit.clone());
    let ledger = LedgerWriter::new(store, audit);
    let actor = Actor::new("bench", None);

    let item = rt
        .block_on(inventory.create(new_item("BENCH-1".to_string()), &actor))
        .unwrap();

    let mut group = c.benchmark_group("ledger");
    group.throughput(Throughput::Elements(1));
    group.bench_function("apply_movement_in_memory", |b| {
        b.to_async(&rt).iter(|| async {
            let req = MoveRequest {
                movement_type: "IN".to_string(),
                qty: 1,
                reference: None,
                target_asset_id: None,
            };
            black_box(ledger.apply_movement(item.id, req, &actor).await.unwrap());
        })
    });
    group.bench_function("history_page", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(ledger.history(item.id, Pagination::default()).await.unwrap()) })
    });
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    for len in [100usize, 1_000, 10_000] {
        let history = (0..len)
            .map(|i| match i % 3 {
                0 => (MovementType::In, 5),
                1 => (MovementType::Out, 3),
                _ => (MovementType::Adjust, 50),
            })
            .collect::<Vec<_>>();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &history, |b, history| {
            b.iter(|| black_box(replay(0, history).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_apply_movement, bench_replay);
criterion_main!(benches);
