//! Single-precision GEMM in Rust: `C = alpha * A * B + beta * C`.
//!
//! The usual recipe behind fast BLAS: cache blocking over C, operand packing
//! into register-sized lanes, SIMD micro-kernels with FMA, and independent
//! tiles spread over a thread pool.
//!
//! ## Usage
//!
//! ```
//! use fastgemm::sgemm;
//!
//! // A is 2×3, B is 3×2, both row-major.
//! let a = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let b = [7.0f32, 8.0, 9.0, 10.0, 11.0, 12.0];
//! let mut c = [0.0f32; 4];
//!
//! sgemm(2, 2, 3, 1.0, &a, 3, 1, &b, 2, 1, 0.0, &mut c, 2).unwrap();
//! assert_eq!(c, [58.0, 64.0, 139.0, 154.0]);
//! ```
//!
//! When the same B is multiplied many times, pack it once:
//!
//! ```
//! use fastgemm::{Gemm, MatrixMut, MatrixRef};
//!
//! let (m, n, k) = (64, 48, 32);
//! let a = vec![1.0f32; m * k];
//! let b = vec![0.5f32; k * n];
//! let mut c = vec![0.0f32; m * n];
//!
//! let engine = Gemm::global();
//! let packed = engine.pack_b(MatrixRef::row_major(&b, k, n)?)?;
//! let mut cv = MatrixMut::row_major(&mut c, m, n)?;
//! engine.gemm_packed_b(1.0, MatrixRef::row_major(&a, m, k)?, &packed, 0.0, &mut cv)?;
//! assert!(c.iter().all(|&v| v == 16.0));
//! # Ok::<(), fastgemm::GemmError>(())
//! ```
//!
//! ## What's inside
//!
//! - 12×8 AVX2 + FMA (or plain AVX), 12×16 AVX-512 and 8×12 NEON micro-kernels
//! - a portable scalar kernel with the same tile shape
//! - MC/NC/KC cache blocking, packing that tolerates any input strides
//! - B pre-packing with bit-identical results to the on-the-fly path
//! - rayon parallelism sized by a per-tile cost estimate

pub mod blocked;
pub mod config;
pub mod engine;
pub mod error;
pub mod kernels;
pub mod matrix;
pub mod threaded;

pub use blocked::{PackedB, PackedLayout};
pub use config::GemmConfig;
pub use engine::Gemm;
pub use error::{GemmError, Result};
pub use kernels::MicroKernel;
pub use matrix::naive::gemm_naive;
pub use matrix::{MatrixMut, MatrixRef};

/// C = alpha * A * B + beta * C on flat buffers.
///
/// A is `m × k` with element `(i, p)` at `a[i * lda0 + p * lda1]`, B is
/// `k × n` with `(p, j)` at `b[p * ldb0 + j * ldb1]`, C is `m × n` row-major
/// with row stride `ldc`. Transposes are just swapped strides.
///
/// Uses the process-wide engine ([`Gemm::global`]).
#[allow(clippy::too_many_arguments)]
pub fn sgemm(
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    lda0: usize,
    lda1: usize,
    b: &[f32],
    ldb0: usize,
    ldb1: usize,
    beta: f32,
    c: &mut [f32],
    ldc: usize,
) -> Result<()> {
    let a = MatrixRef::labeled("A", a, m, k, lda0, lda1)?;
    let b = MatrixRef::labeled("B", b, k, n, ldb0, ldb1)?;
    let mut c = MatrixMut::new(c, m, n, ldc)?;
    Gemm::global().gemm(alpha, a, b, beta, &mut c)
}

/// Same as [`sgemm`] with B pre-packed by [`pack_b_kernel`].
#[allow(clippy::too_many_arguments)]
pub fn sgemm_packed_b(
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    lda0: usize,
    lda1: usize,
    packed_b: &[f32],
    beta: f32,
    c: &mut [f32],
    ldc: usize,
) -> Result<()> {
    let a = MatrixRef::labeled("A", a, m, k, lda0, lda1)?;
    let mut c = MatrixMut::new(c, m, n, ldc)?;
    Gemm::global().gemm_packed_b_slice(alpha, a, packed_b, beta, &mut c)
}

/// Bytes needed to pre-pack a `k × n` B.
pub fn pack_b_size(n: usize, k: usize) -> usize {
    Gemm::global().pack_b_len(n, k) * size_of::<f32>()
}

/// Packs a `k × n` B (strides `ldb0`, `ldb1`) into `packed`, which must hold
/// at least [`pack_b_size`] bytes worth of floats.
pub fn pack_b_kernel(
    b: &[f32],
    packed: &mut [f32],
    n: usize,
    k: usize,
    ldb0: usize,
    ldb1: usize,
) -> Result<()> {
    let b = MatrixRef::labeled("B", b, k, n, ldb0, ldb1)?;
    Gemm::global().pack_b_into(b, packed).map(|_| ())
}
