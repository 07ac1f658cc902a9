use criterion::{Criterion, criterion_group, criterion_main};
use domain::{BatchOrderProcessor, CatalogService, IngredientDemand, OrderPlacer, PlaceOrder};
use rust_decimal::Decimal;
use store::{IngredientId, InMemoryCafeStore, Money, NewInventoryItem, NewMenuItem, RecipeLine};

/// Seeds a store with enough stock that benchmark orders never run out.
async fn seeded_store() -> InMemoryCafeStore {
    let store = InMemoryCafeStore::new();
    let catalog = CatalogService::new(store.clone());

    let mut recipe = Vec::new();
    for (name, per_unit) in [("milk", 2), ("coffee", 1), ("sugar", 1)] {
        let item = catalog
            .create_inventory_item(NewInventoryItem {
                name: name.to_string(),
                stock_level: Decimal::from(1_000_000_000),
                reorder_level: Decimal::ONE,
            })
            .await
            .unwrap();
        recipe.push(RecipeLine::new(item.id, Decimal::new(per_unit, 1)));
    }

    catalog
        .create_menu_item(NewMenuItem {
            name: "latte".to_string(),
            description: "benchmark latte".to_string(),
            price: Money::from_cents(350),
            tags: vec!["coffee".to_string()],
            recipe,
        })
        .await
        .unwrap();
    store
}

fn bench_demand(c: &mut Criterion) {
    let recipe: Vec<RecipeLine> = (1..=8)
        .map(|i| RecipeLine::new(IngredientId::new(i), Decimal::new(i, 2)))
        .collect();

    c.bench_function("domain/demand_20_lines", |b| {
        b.iter(|| {
            let mut demand = IngredientDemand::new();
            for quantity in 1..=20 {
                demand.add_recipe(&recipe, quantity);
            }
            demand
        });
    });
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = rt.block_on(seeded_store());
    let placer = OrderPlacer::new(store);

    c.bench_function("domain/place_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                placer
                    .place_order(PlaceOrder::new("bench", vec![]).with_line("latte", 2))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_batch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = rt.block_on(seeded_store());
    let processor = BatchOrderProcessor::new(OrderPlacer::new(store));

    c.bench_function("domain/batch_10_orders", |b| {
        b.iter(|| {
            rt.block_on(async {
                let orders = (0..10)
                    .map(|i| PlaceOrder::new(format!("bench-{i}"), vec![]).with_line("latte", 1))
                    .collect();
                processor.process_batch(orders).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_demand, bench_place_order, bench_batch);
criterion_main!(benches);
