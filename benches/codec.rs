use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_orient::{decode, encode, from_str, to_string, Record, RecordLink, Value};

#[derive(Serialize, Deserialize, Clone)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

fn sample_record() -> Record {
    Record::with_class("Person")
        .with_field("name", "Alice")
        .with_field("age", 30)
        .with_field("tags", vec![Value::from("a"), Value::from("b")])
        .with_field("friend", RecordLink::new(12, 345))
        .with_field(
            "address",
            Record::with_class("Address")
                .with_field("city", "Rome")
                .with_field("zip", 118i64),
        )
}

fn benchmark_decode_simple(c: &mut Criterion) {
    let text = r#"Person@name:"Alice",age:30,tags:["a","b"],friend:#12:345,address:(Address@city:"Rome",zip:118l)"#;

    c.bench_function("decode_simple_record", |b| b.iter(|| decode(black_box(text))));
}

fn benchmark_encode_simple(c: &mut Criterion) {
    let rec = sample_record();

    c.bench_function("encode_simple_record", |b| b.iter(|| encode(black_box(&rec))));
}

fn benchmark_serde_struct(c: &mut Criterion) {
    let user = User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    };
    let text = to_string(&user).unwrap();

    c.bench_function("serialize_struct", |b| b.iter(|| to_string(black_box(&user))));
    c.bench_function("deserialize_struct", |b| {
        b.iter(|| from_str::<User>(black_box(&text)))
    });
}

fn benchmark_embedded_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("embedded_collection");

    for size in [10, 50, 100, 500].iter() {
        let products: Vec<Value> = (0..*size)
            .map(|i| {
                let product = Product {
                    sku: format!("SKU-{:04}", i),
                    name: format!("Product {}", i),
                    price: 9.99 + i as f64,
                    quantity: i as u32,
                };
                serde_orient::to_value(&product).unwrap()
            })
            .collect();
        let rec = Record::with_class("Catalog").with_field("items", products);
        let text = encode(&rec).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", size), &rec, |b, rec| {
            b.iter(|| encode(black_box(rec)))
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &text, |b, text| {
            b.iter(|| decode(black_box(text)))
        });
    }

    group.finish();
}

fn benchmark_nesting(c: &mut Criterion) {
    let mut group = c.benchmark_group("nesting");

    for depth in [4, 16, 48].iter() {
        let text = format!("a:{}1{}", "(b:".repeat(*depth), ")".repeat(*depth));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &text, |b, text| {
            b.iter(|| decode(black_box(text)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_decode_simple,
    benchmark_encode_simple,
    benchmark_serde_struct,
    benchmark_embedded_collection,
    benchmark_nesting
);
criterion_main!(benches);
