//! Portable MR×NR microkernel.

/// Computes an MR×NR tile: C[0:MR, 0:NR] += alpha * (A_packed × B_packed)
///
/// Plain nested loops with the same accumulation discipline as the SIMD
/// kernels: MR×NR independent sums over the whole K slice, then one
/// multiply by alpha and one add into C. Results agree with the vectorized
/// kernels to within rounding (they fuse the multiply-add, this doesn't).
///
/// # Safety
///
/// Caller must ensure:
/// - `a_pack` points to `k * MR` contiguous f32 values (packed A panel)
/// - `b_pack` points to `k * NR` contiguous f32 values (packed B panel)
/// - `c.add(row * ldc)` is valid for row in 0..MR, each allowing read/write of NR f32s
#[allow(unsafe_op_in_unsafe_fn)]
#[allow(clippy::needless_range_loop)]
pub unsafe fn kernel_scalar<const MR: usize, const NR: usize>(
    a_pack: *const f32,
    b_pack: *const f32,
    c: *mut f32,
    k: usize,
    ldc: usize,
    alpha: f32,
) {
    let a = std::slice::from_raw_parts(a_pack, k * MR);
    let b = std::slice::from_raw_parts(b_pack, k * NR);

    let mut acc = [[0.0f32; NR]; MR];
    for (a_lane, b_lane) in a.chunks_exact(MR).zip(b.chunks_exact(NR)) {
        for i in 0..MR {
            let a_val = a_lane[i];
            for j in 0..NR {
                acc[i][j] += a_val * b_lane[j];
            }
        }
    }

    for i in 0..MR {
        let row = std::slice::from_raw_parts_mut(c.add(i * ldc), NR);
        for j in 0..NR {
            row[j] += acc[i][j] * alpha;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_scalar_4x3() {
        // A = [[1, 2], [3, 4], [5, 6], [7, 8]], B = [[1, 0, 2], [0, 1, 3]]
        let a_pack = [1.0, 3.0, 5.0, 7.0, 2.0, 4.0, 6.0, 8.0];
        let b_pack = [1.0, 0.0, 2.0, 0.0, 1.0, 3.0];
        let mut c = [10.0f32; 12];

        unsafe {
            kernel_scalar::<4, 3>(a_pack.as_ptr(), b_pack.as_ptr(), c.as_mut_ptr(), 2, 3, 2.0);
        }

        let expected = [
            12.0, 14.0, 26.0, //
            16.0, 18.0, 46.0, //
            20.0, 22.0, 66.0, //
            24.0, 26.0, 86.0,
        ];
        assert_eq!(c, expected);
    }

    #[test]
    fn test_kernel_scalar_zero_k_leaves_c() {
        let empty: [f32; 0] = [];
        let mut c = [3.0f32; 96];
        unsafe {
            kernel_scalar::<12, 8>(empty.as_ptr(), empty.as_ptr(), c.as_mut_ptr(), 0, 8, 1.0);
        }
        assert!(c.iter().all(|&v| v == 3.0));
    }
}
