use criterion::{black_box, criterion_group, criterion_main, Criterion};
use xnorpop::parallel::parallel_for;

fn bench_parallel_for(c: &mut Criterion) {
    c.bench_function("parallel_for_n100000_p8", |bencher| {
        bencher.iter(|| {
            parallel_for::<_, ()>(black_box(100_000), black_box(8), |_worker_id, index| {
                black_box(index.wrapping_mul(2654435761));
                Ok(())
            })
            .unwrap();
        });
    });
}

criterion_group!(benches, bench_parallel_for);
criterion_main!(benches);
