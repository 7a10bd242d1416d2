use criterion::{black_box, criterion_group, criterion_main, Criterion};

use corevm::{Cell, Runtime, Series};

/// Interns a batch of distinct, never-before-seen names.
///
/// Each iteration reuses a fresh `Runtime` so the interner's load factor
/// (and the rehash it triggers) stays comparable across iterations rather
/// than accumulating entries run over run.
fn bench_intern_distinct_names(c: &mut Criterion) {
    c.bench_function("intern_1000_distinct_names", |b| {
        b.iter(|| {
            let mut rt = Runtime::new();
            for i in 0..1000 {
                let sym = rt.intern(&format!("name-{i}"));
                black_box(sym);
            }
        });
    });
}

/// Re-interning the same small set of names should be cheap: every call
/// after the first is a probe-and-return, no new entry or rehash.
fn bench_intern_repeated_name(c: &mut Criterion) {
    let mut rt = Runtime::new();
    c.bench_function("intern_same_name_1000_times", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(rt.intern("repeated"));
            }
        });
    });
}

/// A `recycle` cycle over a pool holding a long reachable chain plus an
/// equal amount of garbage, measuring the mark work-stack's throughput
/// rather than just the sweep's.
fn bench_recycle_mixed_pool(c: &mut Criterion) {
    c.bench_function("recycle_1000_live_1000_garbage", |b| {
        b.iter(|| {
            let mut rt = Runtime::new();
            let mut prev = None;
            for i in 0..1000i64 {
                let mut series = Series::singular(Cell::integer(i));
                if let Some(p) = prev {
                    series = Series::array([]);
                    series.link = corevm::Link::Facade(Some(p));
                }
                let id = rt.alloc(series).unwrap();
                rt.manage(id);
                rt.guard(id);
                prev = Some(id);
            }
            for i in 0..1000i64 {
                let id = rt.alloc(Series::singular(Cell::integer(i))).unwrap();
                rt.manage(id);
            }
            let stats = rt.recycle();
            black_box(stats);
        });
    });
}

criterion_group!(benches, bench_intern_distinct_names, bench_intern_repeated_name, bench_recycle_mixed_pool);
criterion_main!(benches);
