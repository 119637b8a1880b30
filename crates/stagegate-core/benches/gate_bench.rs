//! # Stage Gate Benchmarks
//!
//! Run with: `cargo bench -p stagegate-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use stagegate_core::{Dimensions, Orientation, PreviewTransform, StageGate, crop_to_surface};
use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Ready,
    Sized,
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_deferred_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("deferred_dispatch");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let gate = StageGate::new([Stage::Ready, Stage::Sized]).expect("gate");
            let counter = Rc::new(Cell::new(0u64));
            b.iter(|| {
                gate.reset();
                for _ in 0..size {
                    let n = Rc::clone(&counter);
                    gate.run(Stage::Ready, move || n.set(n.get() + 1))
                        .expect("run");
                }
                gate.mark_completed(Stage::Ready).expect("mark");
                black_box(counter.get())
            });
        });
    }

    group.finish();
}

fn bench_immediate_run(c: &mut Criterion) {
    let gate = StageGate::new([Stage::Ready]).expect("gate");
    gate.mark_completed(Stage::Ready).expect("mark");
    let counter = Rc::new(Cell::new(0u64));

    c.bench_function("immediate_run", |b| {
        b.iter(|| {
            let n = Rc::clone(&counter);
            gate.run(Stage::Ready, move || n.set(n.get() + 1))
                .expect("run");
        });
    });
}

fn bench_geometry(c: &mut Criterion) {
    c.bench_function("preview_transform", |b| {
        b.iter(|| {
            black_box(PreviewTransform::compute(
                black_box(Dimensions::new(1920, 1080)),
                black_box(Dimensions::new(1080, 2280)),
                Orientation::Portrait,
            ))
        });
    });

    c.bench_function("crop_to_surface", |b| {
        b.iter(|| {
            black_box(crop_to_surface(
                black_box(Dimensions::new(4032, 3024)),
                black_box(Dimensions::new(1080, 2280)),
            ))
        });
    });
}

criterion_group!(
    benches,
    bench_deferred_dispatch,
    bench_immediate_run,
    bench_geometry,
);

criterion_main!(benches);
