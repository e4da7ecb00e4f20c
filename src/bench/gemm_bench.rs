use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fastgemm::{Gemm, GemmConfig, MatrixMut, MatrixRef, MicroKernel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const INPUT_SIZES: &[(&str, usize)] = &[("n64", 64), ("n128", 128), ("n256", 256), ("n512", 512)];

fn make_matrix(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(-1.0f32..1.0)).collect()
}

fn bench_engine(c: &mut Criterion, name: &str, engine: &Gemm, prepacked: bool) {
    let mut group = c.benchmark_group(name);
    for &(label, n) in INPUT_SIZES {
        group.throughput(Throughput::Elements((n as u64).pow(3)));

        let a = make_matrix(n * n, 0xC0FF_EE42 ^ n as u64);
        let b = make_matrix(n * n, 0xBADC_0FFE ^ (n as u64).rotate_left(17));
        let mut out = vec![0.0f32; n * n];
        let sample = (n / 2) * n + (n / 2);

        let av = MatrixRef::row_major(&a, n, n).unwrap();
        let bv = MatrixRef::row_major(&b, n, n).unwrap();
        let packed = engine.pack_b(bv).unwrap();

        group.bench_function(BenchmarkId::new("random", label), |bench| {
            bench.iter(|| {
                let mut cv = MatrixMut::row_major(&mut out, n, n).unwrap();
                if prepacked {
                    engine.gemm_packed_b(1.0, black_box(av), &packed, 0.0, &mut cv).unwrap();
                } else {
                    engine.gemm(1.0, black_box(av), black_box(bv), 0.0, &mut cv).unwrap();
                }
                black_box(out[sample]);
            });
        });
    }
    group.finish();
}

fn bench_gemm(c: &mut Criterion) {
    let serial = GemmConfig::default().serial();
    for kernel in MicroKernel::available() {
        let engine = Gemm::new(kernel, serial).unwrap();
        bench_engine(c, &format!("sgemm_{}_1t", kernel.name()), &engine, false);
    }
    bench_engine(c, "sgemm_parallel", Gemm::global(), false);
    bench_engine(c, "sgemm_parallel_packed_b", Gemm::global(), true);
}

criterion_group!(benches, bench_gemm);
criterion_main!(benches);
