use std::sync::Arc;
use std::thread;
use std::time::Duration;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use freqcache::entry::CacheItem;
use freqcache::policy::lfu::LfuCache;

fn filled(capacity: u64) -> LfuCache<u64, u64> {
    let cache = LfuCache::new("bench", capacity as usize);
    for i in 0..capacity {
        cache.insert(i, Duration::ZERO, i);
    }
    cache
}

fn bench_lfu_insert_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfu");
    group.throughput(Throughput::Elements(1024 * 2));
    group.bench_function("insert_get", |b| {
        b.iter_batched(
            || filled(1024),
            |cache| {
                for i in 0..1024u64 {
                    cache.insert(std::hint::black_box(i + 10_000), Duration::ZERO, i);
                    let _ = std::hint::black_box(cache.get(&std::hint::black_box(i)));
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_lfu_get_hotset(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfu");
    group.throughput(Throughput::Elements(4096));
    group.bench_function("get_hotset", |b| {
        b.iter_batched(
            || filled(4096),
            |cache| {
                for i in 0..4096u64 {
                    let _ = std::hint::black_box(cache.get(&std::hint::black_box(i)));
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_lfu_eviction_churn_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfu_eviction_churn_sizes");
    for &capacity in &[256u64, 1024, 4096, 16384] {
        let inserts = capacity * 4;
        group.throughput(Throughput::Elements(inserts));
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            b.iter_batched(
                || filled(capacity),
                |cache| {
                    for i in 0..inserts {
                        cache.insert(std::hint::black_box(capacity + i), Duration::ZERO, i);
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_lfu_loader_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfu");
    group.throughput(Throughput::Elements(1024));
    group.bench_function("loader_miss", |b| {
        b.iter_batched(
            || {
                let cache = filled(256);
                cache.set_data_loader(|key, _| Some(CacheItem::new(*key, Duration::ZERO, *key)));
                cache
            },
            |cache| {
                for i in 0..1024u64 {
                    let _ = std::hint::black_box(cache.get(&std::hint::black_box(10_000 + i)));
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_lfu_most_accessed(c: &mut Criterion) {
    let cache = filled(4096);
    for i in 0..4096u64 {
        for _ in 0..(i % 16) {
            let _ = cache.get(&i);
        }
    }
    let mut group = c.benchmark_group("lfu");
    group.bench_function("most_accessed_100", |b| {
        b.iter(|| std::hint::black_box(cache.most_accessed(std::hint::black_box(100))))
    });
    group.finish();
}

fn bench_lfu_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("lfu_contended");
    for &threads in &[2usize, 4, 8] {
        group.throughput(Throughput::Elements((threads * 1024) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter_batched(
                || Arc::new(filled(1024)),
                |cache| {
                    let handles: Vec<_> = (0..threads as u64)
                        .map(|t| {
                            let cache = Arc::clone(&cache);
                            thread::spawn(move || {
                                for i in 0..1024u64 {
                                    if i % 4 == 0 {
                                        cache.insert(t * 100_000 + i, Duration::ZERO, i);
                                    } else {
                                        let _ = cache.get(&(i % 512));
                                    }
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        let _ = handle.join();
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_lfu_insert_get,
    bench_lfu_get_hotset,
    bench_lfu_eviction_churn_sizes,
    bench_lfu_loader_miss,
    bench_lfu_most_accessed,
    bench_lfu_contended
);
criterion_main!(benches);
