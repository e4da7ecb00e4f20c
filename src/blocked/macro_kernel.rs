//! Macro-kernel: one packed cache block through the micro-kernel.

use crate::kernels::{MAX_TILE, MicroKernel};

/// Computes C[0:m, 0:n] += alpha * A_block × B_block for one K-chunk.
///
/// `packed_a` holds `ceil(m/MR)` bands of `k` lanes (see
/// [`pack_panel`](super::pack::pack_panel)), `packed_b` likewise with NR.
/// Walks the block MR rows × NR columns at a time. Full tiles go straight to
/// the micro-kernel; edge tiles (`m - i < MR` or `n - j < NR`) are computed
/// in an MR×NR scratch tile seeded with the valid part of C and only that
/// part is copied back, so rows and columns synthesized by packing never
/// reach C.
///
/// # Safety
///
/// Caller must ensure `c.add(i * ldc + j)` is valid for read/write for every
/// `i < m`, `j < n`, and that no other thread touches that region meanwhile.
#[allow(unsafe_op_in_unsafe_fn)]
#[allow(clippy::too_many_arguments)]
pub unsafe fn macro_kernel(
    kernel: &MicroKernel,
    m: usize,
    n: usize,
    k: usize,
    packed_a: &[f32],
    packed_b: &[f32],
    alpha: f32,
    c: *mut f32,
    ldc: usize,
) {
    let (mr, nr) = (kernel.mr(), kernel.nr());
    assert!(packed_a.len() >= m.div_ceil(mr) * mr * k, "packed A too short");
    assert!(packed_b.len() >= n.div_ceil(nr) * nr * k, "packed B too short");

    let mut tile = [0.0f32; MAX_TILE];

    for i in (0..m).step_by(mr) {
        let rows = (m - i).min(mr);
        let a_panel = packed_a.as_ptr().add(i * k);

        for j in (0..n).step_by(nr) {
            let cols = (n - j).min(nr);
            let b_panel = packed_b.as_ptr().add(j * k);
            let c_tile = c.add(i * ldc + j);

            if rows == mr && cols == nr {
                kernel.run(a_panel, b_panel, c_tile, k, ldc, alpha);
                continue;
            }

            // Edge tile: go through scratch with row stride NR
            let scratch = &mut tile[..mr * nr];
            scratch.fill(0.0);
            for r in 0..rows {
                std::ptr::copy_nonoverlapping(c_tile.add(r * ldc), scratch.as_mut_ptr().add(r * nr), cols);
            }

            kernel.run(a_panel, b_panel, scratch.as_mut_ptr(), k, nr, alpha);

            for r in 0..rows {
                std::ptr::copy_nonoverlapping(scratch.as_ptr().add(r * nr), c_tile.add(r * ldc), cols);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocked::pack::{pack_panel, packed_len};
    use crate::matrix::MatrixRef;

    fn run_block(kernel: &MicroKernel, m: usize, n: usize, k: usize, ldc: usize) {
        let a: Vec<f32> = (0..m * k).map(|i| ((i % 11) as f32) - 5.0).collect();
        let b: Vec<f32> = (0..k * n).map(|i| ((i % 7) as f32) - 3.0).collect();
        let a_view = MatrixRef::row_major(&a, m, k).unwrap();
        let b_view = MatrixRef::row_major(&b, k, n).unwrap();

        let mut packed_a = vec![0.0; packed_len(m, k, kernel.mr())];
        let mut packed_b = vec![0.0; packed_len(n, k, kernel.nr())];
        pack_panel(a_view, kernel.mr(), &mut packed_a);
        pack_panel(b_view.t(), kernel.nr(), &mut packed_b);

        // Sentinel in the padding columns between rows of C.
        let mut c = vec![-7.0f32; m * ldc];
        unsafe {
            macro_kernel(kernel, m, n, k, &packed_a, &packed_b, 2.0, c.as_mut_ptr(), ldc);
        }

        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0f32;
                for p in 0..k {
                    acc += a[i * k + p] * b[p * n + j];
                }
                // Small integers: exact in any summation order.
                assert_eq!(
                    c[i * ldc + j],
                    -7.0 + 2.0 * acc,
                    "{} m={} n={} at ({}, {})",
                    kernel.name(),
                    m,
                    n,
                    i,
                    j
                );
            }
            for j in n..ldc {
                assert_eq!(c[i * ldc + j], -7.0, "padding column {} clobbered", j);
            }
        }
    }

    #[test]
    fn test_macro_kernel_full_and_edge_tiles() {
        for kernel in MicroKernel::available() {
            let (mr, nr) = (kernel.mr(), kernel.nr());
            for &(m, n) in &[
                (mr, nr),
                (2 * mr, 3 * nr),
                (1, 1),
                (mr - 1, nr + 1),
                (2 * mr + 5, 2 * nr - 3),
            ] {
                run_block(&kernel, m, n, 9, n + 3);
            }
        }
    }
}
