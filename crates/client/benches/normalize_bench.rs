use client::normalize::normalize;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

fn product_page(n: usize) -> Vec<u8> {
    let items: Vec<_> = (0..n)
        .map(|i| {
            json!({
                "_id": format!("p{i}"),
                "Name": format!("Product {i}"),
                "Price": "12.50",
                "category": {"_id": "c1", "name": "Cakes"},
                "images": ["Uploads/Product/a.png", "Uploads/Product/b.png"],
                "free_delivery": true
            })
        })
        .collect();
    json!({"success": true, "data": {"items": items, "total": n}}).to_string().into_bytes()
}

fn bench_normalize(c: &mut Criterion) {
    let small = product_page(20);
    let large = product_page(1000);
    c.bench_function("normalize_20_products", |b| {
        b.iter(|| normalize(200, Some("application/json"), black_box(&small)))
    });
    c.bench_function("normalize_1000_products", |b| {
        b.iter(|| normalize(200, Some("application/json"), black_box(&large)))
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
