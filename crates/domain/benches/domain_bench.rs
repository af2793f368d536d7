use std::collections::HashMap;

use chrono::{Duration, Utc};
use common::{Money, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    CartLine, CatalogRecords, DEFAULT_DELIVERY_DAYS, NewOrder, Order, PaymentMethod, Product,
    ProductView, Quote, Rating, ResolvedLine, ShippingAddress, build_views, summarize,
};

fn catalog(products: usize, ratings_per_product: usize) -> CatalogRecords {
    let products: Vec<Product> = (0..products)
        .map(|i| {
            Product::new(
                format!("Product {i}"),
                Money::from_minor(1_000 + i as i64),
                Money::from_minor(1_500 + i as i64),
                100,
            )
        })
        .collect();
    let ratings = products
        .iter()
        .flat_map(|p| {
            (0..ratings_per_product).map(|r| {
                Rating::new(UserId::new(), p.id, (r % 5 + 1) as u8, None, Utc::now()).unwrap()
            })
        })
        .collect();
    CatalogRecords {
        products,
        ratings,
        ..CatalogRecords::default()
    }
}

fn address() -> ShippingAddress {
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

fn bench_build_views(c: &mut Criterion) {
    let records = catalog(100, 20);

    c.bench_function("domain/build_views_100_products", |b| {
        b.iter(|| build_views(records.clone()));
    });
}

fn bench_cart_summary(c: &mut Criterion) {
    let views: Vec<ProductView> = build_views(catalog(50, 0));
    let user = UserId::new();
    let lines: Vec<CartLine> = views
        .iter()
        .map(|v| CartLine::new(user, v.id, Utc::now()))
        .collect();
    let by_id: HashMap<_, _> = views.into_iter().map(|v| (v.id, v)).collect();

    c.bench_function("domain/summarize_50_lines", |b| {
        b.iter(|| summarize(&lines, &by_id));
    });
}

fn bench_quote_and_place(c: &mut Criterion) {
    let views = build_views(catalog(10, 0));

    c.bench_function("domain/quote_and_place_10_lines", |b| {
        b.iter(|| {
            let lines = views
                .iter()
                .map(|v| ResolvedLine::new(v.clone(), 2))
                .collect();
            let now = Utc::now();
            let quote = Quote::build(lines, now, DEFAULT_DELIVERY_DAYS).unwrap();
            Order::place(
                NewOrder {
                    user_id: UserId::new(),
                    quote,
                    address: address(),
                    method: PaymentMethod::Online,
                    location: None,
                    idempotency_key: None,
                    payment_window: Duration::minutes(10),
                },
                now,
            )
        });
    });
}

criterion_group!(
    benches,
    bench_build_views,
    bench_cart_summary,
    bench_quote_and_place,
);
criterion_main!(benches);
