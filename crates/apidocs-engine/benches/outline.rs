use apidocs_engine::build_outline;
use criterion::{Criterion, criterion_group, criterion_main};
mod common;

fn bench_outline(c: &mut Criterion) {
    let mut group = c.benchmark_group("outline");
    group.sample_size(20);

    let files = common::generate_documents(50);
    group.bench_function("build_outline", |b| {
        b.iter(|| build_outline(std::hint::black_box(&files)));
    });

    group.finish();
}

criterion_group!(benches, bench_outline);
criterion_main!(benches);
