use criterion::{black_box, criterion_group, criterion_main, Criterion};
use xnorpop::matrix::Matrix;
use xnorpop::sampler::Rng;

fn bench_dot(c: &mut Criterion) {
    let mut rng = Rng::new_rng_from_global_seed();
    let a = Matrix::random(256, 4096, 0, &mut rng).unwrap();
    let b = Matrix::random(256, 4096, 0, &mut rng).unwrap();

    c.bench_function("dot_256x4096", |bencher| {
        bencher.iter(|| black_box(&a).dot(black_box(&b)).unwrap());
    });
}

fn bench_transpose(c: &mut Criterion) {
    let mut rng = Rng::new_rng_from_global_seed();
    let m = Matrix::random(512, 2048, 0, &mut rng).unwrap();

    c.bench_function("transpose_512x2048", |bencher| {
        bencher.iter(|| black_box(&m).transpose());
    });
}

criterion_group!(benches, bench_dot, bench_transpose);
criterion_main!(benches);
