use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gapkern::graph::builder::parallel_prefix_sum;
use gapkern::graph::{Builder, Generator};
use gapkern::{AtomicBitmap, ParallelVector, SlidingQueue};
use rayon::prelude::*;

fn bench_bitmap(c: &mut Criterion) {
    let size = 1 << 20;
    let bm = AtomicBitmap::new(size);
    let mut group = c.benchmark_group("Bitmap");

    group.bench_function("set_bit_atomic", |b| {
        b.iter(|| {
            (0..size).into_par_iter().filter(|i| i % 3 == 0).for_each(|i| bm.set_bit_atomic(i));
            black_box(&bm);
        })
    });
    group.bench_function("set_bit/word_chunks", |b| {
        b.iter(|| {
            (0..size / 64).into_par_iter().for_each(|w| {
                for i in (w * 64..(w + 1) * 64).filter(|i| i % 3 == 0) {
                    bm.set_bit(i);
                }
            });
            black_box(&bm);
        })
    });
    group.bench_function("reset", |b| b.iter(|| bm.reset()));
    group.finish();
}

fn bench_queue(c: &mut Criterion) {
    let size = 1 << 20;
    let mut group = c.benchmark_group("Sliding Queue");

    group.bench_function("buffered_parallel_push", |b| {
        b.iter(|| {
            let mut queue = SlidingQueue::with_capacity(size);
            (0..size as u32).into_par_iter().for_each_init(|| queue.buffer(), |local, i| local.push(i));
            queue.slide_window();
            black_box(queue.len())
        })
    });
    group.bench_function("push_atomic", |b| {
        b.iter(|| {
            let mut v = ParallelVector::<u32>::with_capacity(size);
            (0..size as u32).into_par_iter().for_each(|i| {
                let _ = v.push_atomic(i);
            });
            v.publish();
            black_box(v.len())
        })
    });
    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let generator = Generator::new(14, 16);
    let edges = generator.generate::<i32>(false);
    let degrees: Vec<usize> = (0..1 << 20).map(|i| i % 17).collect();
    let mut group = c.benchmark_group("Build");
    group.sample_size(20);

    group.bench_function("kronecker_edges", |b| b.iter(|| black_box(generator.kronecker_edges::<i32>())));
    group.bench_function("prefix_sum", |b| b.iter(|| black_box(parallel_prefix_sum(&degrees))));
    group.bench_function("build/directed", |b| b.iter(|| black_box(Builder::new().build(&edges))));
    group.bench_function("build/symmetrized", |b| {
        b.iter(|| black_box(Builder::new().symmetrize(true).build(&edges)))
    });
    group.finish();
}

criterion_group!(benches, bench_bitmap, bench_queue, bench_build);
criterion_main!(benches);
