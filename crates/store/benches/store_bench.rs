use chrono::{Duration, Utc};
use common::{Money, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CatalogRecords, DEFAULT_DELIVERY_DAYS, NewOrder, Order, PaymentMethod, Product,
    ProductFilter, Quote, ResolvedLine, ShippingAddress, build_views,
};
use store::{CartStore, CatalogStore, InMemoryStore, OrderStore, SeedStore};

fn shipping() -> ShippingAddress {
    ShippingAddress {
        full_name: "Bench User".to_string(),
        phone: "9000000000".to_string(),
        alternate_phone: None,
        state: "KA".to_string(),
        city: "Bengaluru".to_string(),
        address: "1 Bench Street".to_string(),
        pincode: "560001".to_string(),
        address_type: "home".to_string(),
    }
}

fn order_for(product: &Product) -> Order {
    let view = build_views(CatalogRecords {
        products: vec![product.clone()],
        ..CatalogRecords::default()
    })
    .remove(0);
    let now = Utc::now();
    let quote = Quote::build(vec![ResolvedLine::new(view, 1)], now, DEFAULT_DELIVERY_DAYS).unwrap();
    Order::place(
        NewOrder {
            user_id: UserId::new(),
            quote,
            address: shipping(),
            method: PaymentMethod::Online,
            location: None,
            idempotency_key: None,
            payment_window: Duration::minutes(10),
        },
        now,
    )
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let product = Product::new("Bench Watch", Money::from_minor(100), Money::from_minor(120), u32::MAX);
    rt.block_on(async { store.upsert_product(&product).await.unwrap() });

    c.bench_function("store/place_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.place_order(&order_for(&product)).await.unwrap();
            });
        });
    });
}

fn bench_add_to_cart(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let user = UserId::new();
    let product = common::ProductId::new();

    c.bench_function("store/add_or_increment", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .add_or_increment(user, product, Utc::now())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_catalog_records_100(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    rt.block_on(async {
        for i in 0..100 {
            let product = Product::new(
                format!("Product {i}"),
                Money::from_minor(100),
                Money::from_minor(120),
                10,
            );
            store.upsert_product(&product).await.unwrap();
        }
    });

    c.bench_function("store/catalog_records_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .catalog_records(&ProductFilter::all().active())
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_place_order,
    bench_add_to_cart,
    bench_catalog_records_100,
);
criterion_main!(benches);
