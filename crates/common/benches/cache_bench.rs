//! Tiered cache benchmarks
//!
//! Run with: `cargo bench --bench cache_bench -p tripline-common --features
//! runtime`

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tripline_common::cache::{TierConfig, TieredCache};
use tripline_common::resilience::MockClock;

fn config(max_entries: usize) -> TierConfig {
    TierConfig::builder().max_entries(max_entries).build().expect("valid tier config")
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiered_cache_insert");

    for size in [50, 100, 1000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("bounded", size), &size, |b, &size| {
            let cache: TieredCache<String, u64> = TieredCache::new(config(size));
            let mut counter = 0u64;
            b.iter(|| {
                cache.insert(black_box(format!("key_{counter}")), black_box(counter));
                counter = counter.wrapping_add(1);
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiered_cache_lookup");

    for size in [50, 100, 1000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("hit", size), &size, |b, &size| {
            let cache: TieredCache<String, u64> = TieredCache::new(config(size));
            let keys: Vec<String> = (0..size).map(|i| format!("key_{i}")).collect();
            for (i, key) in keys.iter().enumerate() {
                cache.insert(key.clone(), i as u64);
            }
            let mut counter = 0usize;
            b.iter(|| {
                let _ = black_box(cache.lookup(black_box(&keys[counter % size])));
                counter = counter.wrapping_add(1);
            });
        });

        group.bench_with_input(BenchmarkId::new("miss", size), &size, |b, &size| {
            let cache: TieredCache<String, u64> = TieredCache::new(config(size));
            let missing = "absent".to_string();
            b.iter(|| black_box(cache.lookup(black_box(&missing))));
        });
    }

    group.finish();
}

fn bench_stale_sweep(c: &mut Criterion) {
    c.bench_function("tiered_cache_insert_with_expired_sweep", |b| {
        let clock = MockClock::new();
        let cache: TieredCache<String, u64, MockClock> = TieredCache::with_clock(config(1000), clock.clone());
        let mut counter = 0u64;
        b.iter(|| {
            if counter % 100 == 0 {
                clock.advance_mins(31);
            }
            cache.insert(format!("key_{counter}"), counter);
            counter = counter.wrapping_add(1);
        });
    });
}

fn bench_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiered_cache_concurrent_reads");

    for threads in [2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            let cache: Arc<TieredCache<String, u64>> = Arc::new(TieredCache::new(config(100)));
            for i in 0..100u64 {
                cache.insert(format!("key_{i}"), i);
            }
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let cache = Arc::clone(&cache);
                        thread::spawn(move || {
                            for i in 0..100 {
                                let _ = black_box(cache.lookup(&format!("key_{}", (i + t) % 100)));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().expect("reader thread panicked");
                }
            });
        });
    }

    group.finish();
}

criterion_group!(basic, bench_insert, bench_lookup,);
criterion_group!(expiry, bench_stale_sweep,);
criterion_group!(concurrent, bench_concurrent_reads,);
criterion_main!(basic, expiry, concurrent);
