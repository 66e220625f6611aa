use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use executors::pool::{Config as PoolConfig, Pool};
use std::{hint::black_box, time::Duration};

// Benchmark 1: submit + get round trip
fn bench_submit_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_get");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("default", size), &size, |b, &size| {
            let pool = Pool::with_config(PoolConfig::default().with_name("bench")).unwrap();

            b.iter(|| {
                let futures: Vec<_> = (0..size)
                    .map(|i| pool.submit(move || black_box(i)).unwrap())
                    .collect();

                for future in futures {
                    black_box(future.get(Duration::from_secs(10)).unwrap());
                }
            });

            pool.shutdown();
        });
    }

    group.finish();
}

// Benchmark 2: queue capacity vs throughput
fn bench_queue_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_capacity");
    let size = 5000;
    group.throughput(Throughput::Elements(size as u64));

    for capacity in [0, 16, 1024] {
        group.bench_with_input(
            BenchmarkId::new("capacity", capacity),
            &capacity,
            |b, &capacity| {
                let pool = Pool::with_config(
                    PoolConfig::cpu_bound()
                        .with_name("bench-capacity")
                        .with_queue_capacity(capacity),
                )
                .unwrap();

                b.iter(|| {
                    let futures: Vec<_> = (0..size)
                        .map(|i: u64| pool.submit(move || black_box(i.wrapping_mul(31))).unwrap())
                        .collect();

                    for future in futures {
                        black_box(future.get(Duration::from_secs(10)).unwrap());
                    }
                });

                pool.shutdown();
            },
        );
    }

    group.finish();
}

// Benchmark 3: panic containment overhead
fn bench_panic_isolation(c: &mut Criterion) {
    std::panic::set_hook(Box::new(|_| {}));

    c.bench_function("panicking_work", |b| {
        let pool = Pool::new("bench-panic", 4, 256).unwrap();

        b.iter(|| {
            let future = pool.submit(|| -> u32 { panic!("bench") }).unwrap();
            black_box(future.get(Duration::from_secs(10)).unwrap_err());
        });

        pool.shutdown();
    });

    let _ = std::panic::take_hook();
}

criterion_group!(
    benches,
    bench_submit_get,
    bench_queue_capacity,
    bench_panic_isolation
);
criterion_main!(benches);
