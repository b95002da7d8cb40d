use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use trimatrix::{DistanceMatrix, SieveParams};

fn random_matrix(n: usize, sieve: usize) -> DistanceMatrix {
    let mut rng = StdRng::seed_from_u64(42);
    let mut m = DistanceMatrix::with_sieve(n, SieveParams::new(sieve)).unwrap();
    for _ in 0..m.n_elements() {
        m.add_element(rng.random::<f64>()).unwrap();
    }
    m
}

fn bench_find_min(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_min");

    let m = random_matrix(1000, 1);
    group.bench_function("n1000", |b| b.iter(|| black_box(&m).find_min()));

    let m = random_matrix(4000, 4);
    group.bench_function("n4000_sieve4", |b| b.iter(|| black_box(&m).find_min()));

    group.finish();
}

fn bench_populate(c: &mut Criterion) {
    let mut group = c.benchmark_group("populate");

    // Cheap synthetic metric: positions on a line.
    let coords: Vec<f64> = {
        let mut rng = StdRng::seed_from_u64(7);
        (0..2000).map(|_| rng.random::<f64>() * 100.0).collect()
    };
    let dist = |a: usize, b: usize| (coords[a] - coords[b]).abs();

    group.bench_function("serial_n2000", |b| {
        let mut m = DistanceMatrix::new(coords.len()).unwrap();
        b.iter(|| m.populate(dist))
    });

    #[cfg(feature = "parallel")]
    group.bench_function("parallel_n2000", |b| {
        let mut m = DistanceMatrix::new(coords.len()).unwrap();
        b.iter(|| m.par_populate(dist))
    });

    group.finish();
}

criterion_group!(benches, bench_find_min, bench_populate);
criterion_main!(benches);
