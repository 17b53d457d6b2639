use criterion::{Criterion, criterion_group, criterion_main};
use dripline::{Clock, QuantaClock, StdClock, SystemClock};

fn time_single_threaded(c: &mut Criterion) {
    let mut group = c.benchmark_group("dripline");
    group
        .sample_size(100)
        .bench_function("std-time-getting-instant", |b| {
            let clock = StdClock::default();
            b.iter(|| clock.now());
        })
        .bench_function("system-time-getting-now", |b| {
            b.iter(|| SystemClock.now());
        })
        .bench_function("quanta-time-getting-instant", |b| {
            let clock = QuantaClock::default();
            b.iter(|| clock.now());
        });
    group.finish();
}

criterion_group!(time_benches, time_single_threaded);
criterion_main!(time_benches);
