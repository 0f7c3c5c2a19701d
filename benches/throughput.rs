use backoff_breaker::Breaker;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

#[derive(Debug)]
struct BenchError;

fn runtime() -> tokio::runtime::Runtime {
    // A worker thread reaps the timer tasks each call arms
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .unwrap()
}

fn bench_execute_success(c: &mut Criterion) {
    let rt = runtime();
    let _guard = rt.enter();
    let breaker = Breaker::<BenchError>::builder()
        .on_call(|breaker| breaker.success())
        .build()
        .unwrap();

    c.bench_function("execute_success", |b| {
        b.iter(|| {
            breaker.execute();
            black_box(breaker.failure_count())
        });
    });
}

fn bench_execute_open(c: &mut Criterion) {
    let rt = runtime();
    let _guard = rt.enter();
    let breaker = Breaker::<BenchError>::builder()
        .max_retries(0)
        .reset_timeout(Duration::from_secs(3600))
        .build()
        .unwrap();
    breaker.failure(Some(BenchError));

    c.bench_function("execute_open_trip", |b| {
        b.iter(|| {
            breaker.execute();
            black_box(breaker.state())
        });
    });
}

fn bench_state_derivation(c: &mut Criterion) {
    let rt = runtime();
    let _guard = rt.enter();
    let breaker = Breaker::<BenchError>::builder().build().unwrap();

    c.bench_function("state_read", |b| {
        b.iter(|| black_box(breaker.state()));
    });
}

criterion_group!(
    benches,
    bench_execute_success,
    bench_execute_open,
    bench_state_derivation
);
criterion_main!(benches);
