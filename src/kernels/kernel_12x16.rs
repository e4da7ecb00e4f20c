//! 12×16 AVX-512 microkernel for single-precision GEMM.

/// Computes a 12×16 tile: C[0:12, 0:16] += alpha * (A_packed × B_packed)
///
/// Uses 12 ZMM registers (512-bit) as accumulators. AVX-512 holds 16 f32
/// values per register, so each k step issues 12 FMAs covering 192 outputs
/// from a single B lane load.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX-512F (checked via `#[target_feature]`)
/// - `a_pack` points to `k * 12` contiguous f32 values (packed A panel)
/// - `b_pack` points to `k * 16` contiguous f32 values (packed B panel)
/// - `c.add(row * ldc)` is valid for row in 0..12, each allowing read/write of 16 f32s
#[target_feature(enable = "avx512f")]
#[allow(clippy::identity_op)]
#[allow(clippy::erasing_op)]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn kernel_12x16_avx512(
    a_pack: *const f32,
    b_pack: *const f32,
    c: *mut f32,
    k: usize,
    ldc: usize,
    alpha: f32,
) {
    use std::arch::x86_64::*;

    let mut s0 = _mm512_setzero_ps();
    let mut s1 = _mm512_setzero_ps();
    let mut s2 = _mm512_setzero_ps();
    let mut s3 = _mm512_setzero_ps();
    let mut s4 = _mm512_setzero_ps();
    let mut s5 = _mm512_setzero_ps();
    let mut s6 = _mm512_setzero_ps();
    let mut s7 = _mm512_setzero_ps();
    let mut s8 = _mm512_setzero_ps();
    let mut s9 = _mm512_setzero_ps();
    let mut s10 = _mm512_setzero_ps();
    let mut s11 = _mm512_setzero_ps();

    for p in 0..k {
        let a = a_pack.add(p * 12);
        let b_vec = _mm512_loadu_ps(b_pack.add(p * 16));

        s0 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(0)), b_vec, s0);
        s1 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(1)), b_vec, s1);
        s2 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(2)), b_vec, s2);
        s3 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(3)), b_vec, s3);
        s4 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(4)), b_vec, s4);
        s5 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(5)), b_vec, s5);
        s6 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(6)), b_vec, s6);
        s7 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(7)), b_vec, s7);
        s8 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(8)), b_vec, s8);
        s9 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(9)), b_vec, s9);
        s10 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(10)), b_vec, s10);
        s11 = _mm512_fmadd_ps(_mm512_set1_ps(*a.add(11)), b_vec, s11);
    }

    let v_alpha = _mm512_set1_ps(alpha);

    macro_rules! finale {
        ($s:ident, $row:expr) => {
            let dst = c.add($row * ldc);
            _mm512_storeu_ps(dst, _mm512_fmadd_ps($s, v_alpha, _mm512_loadu_ps(dst)));
        };
    }

    finale!(s0, 0);
    finale!(s1, 1);
    finale!(s2, 2);
    finale!(s3, 3);
    finale!(s4, 4);
    finale!(s5, 5);
    finale!(s6, 6);
    finale!(s7, 7);
    finale!(s8, 8);
    finale!(s9, 9);
    finale!(s10, 10);
    finale!(s11, 11);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_12x16_correctness() {
        if !is_x86_feature_detected!("avx512f") {
            println!("Skipping - AVX-512 not available");
            return;
        }

        let k = 16;
        let a: Vec<f32> = (0..12 * k).map(|i| (i % 11) as f32).collect();
        let b: Vec<f32> = (0..k * 16).map(|i| (i % 10) as f32).collect();
        let mut c = vec![0.0f32; 12 * 16];

        // Pack A
        let mut a_pack = vec![0.0; k * 12];
        for p in 0..k {
            for i in 0..12 {
                a_pack[p * 12 + i] = a[i * k + p];
            }
        }

        unsafe {
            kernel_12x16_avx512(a_pack.as_ptr(), b.as_ptr(), c.as_mut_ptr(), k, 16, 1.0);
        }

        // Naive reference
        let mut c_expected = vec![0.0f32; 12 * 16];
        for i in 0..12 {
            for j in 0..16 {
                for p in 0..k {
                    c_expected[i * 16 + j] += a[i * k + p] * b[p * 16 + j];
                }
            }
        }

        assert_eq!(c, c_expected);
    }
}
