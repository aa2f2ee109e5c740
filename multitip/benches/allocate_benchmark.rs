//! Allocation benchmarks: cost of draining a full rack at several block sizes.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use multitip::TipRackAllocator;
use std::hint::black_box;

fn drain_rack(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain_rack");
    for n in [1usize, 3, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut rack = TipRackAllocator::standard();
                while let Ok(slot) = rack.allocate(black_box(n)) {
                    black_box(slot);
                }
            });
        });
    }
    group.finish();
}

fn snapshot(c: &mut Criterion) {
    let mut rack = TipRackAllocator::standard();
    for _ in 0..20 {
        let _ = rack.allocate(3);
    }
    c.bench_function("snapshot", |b| b.iter(|| black_box(rack.snapshot())));
}

criterion_group!(benches, drain_rack, snapshot);
criterion_main!(benches);
