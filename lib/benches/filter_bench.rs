use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trine::{AppendStore, IndexStore, Store, Term, Triple};

fn generate_triples(n: usize) -> Vec<Triple> {
    (0..n)
        .map(|t| {
            Triple::new(
                Term::resource(format!("http://example.org/s/{}", t % (n / 10).max(1))),
                Term::resource(format!("http://example.org/p#{}", t % 20)),
                if t % 2 == 0 {
                    Term::resource(format!("http://example.org/o/{}", t))
                } else {
                    Term::literal(format!("value {}", t))
                },
            )
        })
        .collect()
}

fn fill<S: Store>(mut store: S, triples: &[Triple]) -> S {
    for t in triples {
        store.add(t.clone()).unwrap();
    }
    store
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_subject_predicate");
    for &n in &[1_000usize, 10_000, 100_000] {
        let triples = generate_triples(n);
        let append = fill(AppendStore::new(), &triples);
        let index = fill(IndexStore::new(), &triples);
        let s = Term::resource("http://example.org/s/3");
        let p = Term::resource("http://example.org/p#3");

        group.bench_with_input(BenchmarkId::new("append", n), &n, |b, _| {
            b.iter(|| append.filter(Some(black_box(&s)), Some(black_box(&p)), None).count())
        });
        group.bench_with_input(BenchmarkId::new("index", n), &n, |b, _| {
            b.iter(|| index.filter(Some(black_box(&s)), Some(black_box(&p)), None).count())
        });
    }
    group.finish();
}

fn bench_object_scan(c: &mut Criterion) {
    let triples = generate_triples(10_000);
    let index = fill(IndexStore::new(), &triples);
    let o = Term::literal("value 4321");
    c.bench_function("index_filter_object_only", |b| {
        b.iter(|| index.filter(None, None, Some(black_box(&o))).count())
    });
}

fn bench_add(c: &mut Criterion) {
    let triples = generate_triples(10_000);
    c.bench_function("index_add_10k", |b| {
        b.iter(|| fill(IndexStore::new(), black_box(&triples)).count())
    });
}

criterion_group!(benches, bench_filter, bench_object_scan, bench_add);
criterion_main!(benches);
