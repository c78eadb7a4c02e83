// Search benchmarks for the predx word-vector store
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use predx_core::{Embedding, VectorStore};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_store(words: usize, dim: usize) -> (VectorStore, StdRng) {
    let mut rng = StdRng::seed_from_u64(1234);
    let mut store = VectorStore::new(dim);
    for index in 0..words {
        store.add_random(&format!("word{index}"), &mut rng).unwrap();
    }
    (store, rng)
}

fn benchmark_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest");

    let (mut store, mut rng) = seeded_store(10_000, 32);
    let query = Embedding::random(32, &mut rng);

    group.bench_function("exhaustive", |b| {
        b.iter(|| {
            let results = store.nearest(black_box(&query), 10, None).unwrap();
            black_box(results);
        });
    });

    store.build_ann_index(16, &mut rng).unwrap();
    group.bench_function("forest", |b| {
        b.iter(|| {
            let results = store.nearest_approx(black_box(&query), 10, None).unwrap();
            black_box(results);
        });
    });

    group.finish();
}

fn benchmark_fuzzy(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuzzy");

    let (store, _) = seeded_store(10_000, 32);

    group.bench_function("full_scan", |b| {
        b.iter(|| {
            let results = store.fuzzy(black_box("word512"), 10, 0.5, false);
            black_box(results);
        });
    });

    group.bench_function("stop_early", |b| {
        b.iter(|| {
            let results = store.fuzzy(black_box("word512"), 10, 0.5, true);
            black_box(results);
        });
    });

    group.finish();
}

fn benchmark_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    group.bench_function("add_random_1000", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(7);
            let mut store = VectorStore::new(32);
            for index in 0..1000 {
                store.add_random(&format!("word{index}"), &mut rng).unwrap();
            }
            black_box(store.len());
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_nearest, benchmark_fuzzy, benchmark_insert);
criterion_main!(benches);
