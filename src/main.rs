//! Benchmark runner for the GEMM paths.
//!
//! Usage: `fastgemm [SIZE...]` (default 256 512 1024). Set `RUST_LOG=debug`
//! to see the blocking plan of every call.

use fastgemm::{Gemm, GemmConfig, MatrixMut, MatrixRef, MicroKernel, gemm_naive};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let sizes: Vec<usize> = {
        let args: Vec<usize> = std::env::args().skip(1).filter_map(|s| s.parse().ok()).collect();
        if args.is_empty() { vec![256, 512, 1024] } else { args }
    };
    let iterations = 3;

    println!("=== SGEMM Benchmark ===\n");

    let detected = Gemm::global();
    let kernels: Vec<&str> = MicroKernel::available().iter().map(|k| k.name()).collect();
    println!("Kernels: {} (using {})\n", kernels.join(", "), detected.kernel().name());

    let portable = Gemm::new(MicroKernel::portable(), GemmConfig::default().serial())
        .expect("default config is valid");
    let serial = Gemm::new(*detected.kernel(), GemmConfig::default().serial())
        .expect("default config is valid");

    let mut all_results = Vec::new();

    for &size in &sizes {
        println!("Matrix: {}×{}", size, size);
        println!("{}", "-".repeat(50));

        let (m, n, k) = (size, size, size);
        let a: Vec<f32> = (0..m * k).map(|i| (i % 100) as f32 * 0.01).collect();
        let b: Vec<f32> = (0..k * n).map(|i| (i % 100) as f32 * 0.01).collect();
        let av = MatrixRef::row_major(&a, m, k).expect("A view");
        let bv = MatrixRef::row_major(&b, k, n).expect("B view");
        let packed = detected.pack_b(bv).expect("pack B");

        let mut results: Vec<(&str, (f64, f64))> = Vec::new();

        // The naive loop takes minutes past 1024.
        if size <= 1024 {
            results.push((
                "Naive (f64 acc)",
                bench_fn(m, n, k, 1, |c| gemm_naive(1.0, av, bv, 0.0, c)),
            ));
        }
        results.push((
            "Portable 1T",
            bench_fn(m, n, k, iterations, |c| {
                portable.gemm(1.0, av, bv, 0.0, c).expect("gemm")
            }),
        ));
        results.push((
            "SIMD 1T",
            bench_fn(m, n, k, iterations, |c| serial.gemm(1.0, av, bv, 0.0, c).expect("gemm")),
        ));
        results.push((
            "SIMD MT",
            bench_fn(m, n, k, iterations, |c| {
                detected.gemm(1.0, av, bv, 0.0, c).expect("gemm")
            }),
        ));
        results.push((
            "SIMD MT packed B",
            bench_fn(m, n, k, iterations, |c| {
                detected.gemm_packed_b(1.0, av, &packed, 0.0, c).expect("gemm")
            }),
        ));

        let baseline_time = results[0].1.0;
        for (i, (name, (time_ms, gflops))) in results.iter().enumerate() {
            let speedup = baseline_time / time_ms;
            println!(
                "{}. {:18} {:8.2} ms  {:6.2} GFLOPS  ({:.1}×)",
                i + 1,
                name,
                time_ms,
                gflops,
                speedup
            );
        }
        println!();

        all_results.push((size, results));
    }

    print_summary_table(&all_results);
}

/// Time `f` writing into a fresh zeroed C, averaged over `iterations`.
fn bench_fn<F>(m: usize, n: usize, k: usize, iterations: usize, f: F) -> (f64, f64)
where
    F: Fn(&mut MatrixMut<'_>),
{
    // Warmup
    let mut c = vec![0.0f32; m * n];
    f(&mut MatrixMut::row_major(&mut c, m, n).expect("C view"));

    let mut total = 0.0;
    for _ in 0..iterations {
        let mut c = vec![0.0f32; m * n];
        let mut cv = MatrixMut::row_major(&mut c, m, n).expect("C view");
        let start = Instant::now();
        f(&mut cv);
        total += start.elapsed().as_secs_f64();
    }

    let avg = total / iterations as f64;
    let gflops = 2.0 * (m * n * k) as f64 / avg / 1e9;
    (avg * 1000.0, gflops)
}

#[allow(clippy::type_complexity)]
fn print_summary_table(all_results: &[(usize, Vec<(&str, (f64, f64))>)]) {
    println!("{}", "=".repeat(70));
    println!("SUMMARY (GFLOPS)");
    println!("{}", "=".repeat(70));

    print!("{:<20}", "Method");
    for (size, _) in all_results {
        print!(" {:>12}", format!("{}³", size));
    }
    println!();
    println!("{}", "-".repeat(70));

    let methods: Vec<&str> = all_results
        .iter()
        .flat_map(|(_, results)| results.iter().map(|(name, _)| *name))
        .fold(Vec::new(), |mut seen, name| {
            if !seen.contains(&name) {
                seen.push(name);
            }
            seen
        });

    for method in methods {
        print!("{:<20}", method);
        for (_, results) in all_results {
            match results.iter().find(|(name, _)| *name == method) {
                Some((_, (_, gflops))) => print!(" {:>12.2}", gflops),
                None => print!(" {:>12}", "-"),
            }
        }
        println!();
    }

    println!("{}", "=".repeat(70));
}
