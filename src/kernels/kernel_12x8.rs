//! 12×8 AVX microkernels for single-precision GEMM.
//!
//! `kernel_12x8_avx2` fuses multiply and add with FMA. `kernel_12x8_avx`
//! is the same tile for CPUs with AVX but no FMA (Sandy Bridge, Ivy Bridge)
//! and rounds after the multiply and again after the add.

/// Computes a 12×8 tile: C[0:12, 0:8] += alpha * (A_packed × B_packed)
///
/// Uses 12 AVX2 registers as accumulators (one per row of C, 8 floats
/// each), loads one B lane per k step and broadcasts the 12 A values into
/// FMAs. C is only touched once at the end: each accumulator is scaled by
/// alpha and fused into the existing row.
///
/// The 12×8 shape is chosen because:
/// - 12 accumulators × 256 bits = most of the 16 YMM registers
/// - 8 columns fill one AVX2 register (8 × f32)
/// - Leaves room for the B lane and A broadcasts
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2 and FMA (checked via `#[target_feature]`)
/// - `a_pack` points to `k * 12` contiguous f32 values (packed A panel)
/// - `b_pack` points to `k * 8` contiguous f32 values (packed B panel)
/// - `c.add(row * ldc)` is valid for row in 0..12, each allowing read/write of 8 f32s
#[target_feature(enable = "avx2,fma")]
#[allow(clippy::identity_op)]
#[allow(clippy::erasing_op)]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn kernel_12x8_avx2(
    a_pack: *const f32,
    b_pack: *const f32,
    c: *mut f32,
    k: usize,
    ldc: usize,
    alpha: f32,
) {
    use std::arch::x86_64::*;

    let mut s0 = _mm256_setzero_ps();
    let mut s1 = _mm256_setzero_ps();
    let mut s2 = _mm256_setzero_ps();
    let mut s3 = _mm256_setzero_ps();
    let mut s4 = _mm256_setzero_ps();
    let mut s5 = _mm256_setzero_ps();
    let mut s6 = _mm256_setzero_ps();
    let mut s7 = _mm256_setzero_ps();
    let mut s8 = _mm256_setzero_ps();
    let mut s9 = _mm256_setzero_ps();
    let mut s10 = _mm256_setzero_ps();
    let mut s11 = _mm256_setzero_ps();

    for p in 0..k {
        let a = a_pack.add(p * 12);
        let b_vec = _mm256_loadu_ps(b_pack.add(p * 8));

        s0 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(0)), b_vec, s0);
        s1 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(1)), b_vec, s1);
        s2 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(2)), b_vec, s2);
        s3 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(3)), b_vec, s3);
        s4 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(4)), b_vec, s4);
        s5 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(5)), b_vec, s5);
        s6 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(6)), b_vec, s6);
        s7 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(7)), b_vec, s7);
        s8 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(8)), b_vec, s8);
        s9 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(9)), b_vec, s9);
        s10 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(10)), b_vec, s10);
        s11 = _mm256_fmadd_ps(_mm256_broadcast_ss(&*a.add(11)), b_vec, s11);
    }

    let v_alpha = _mm256_set1_ps(alpha);

    // C[row] = s * alpha + C[row]
    macro_rules! finale {
        ($s:ident, $row:expr) => {
            let dst = c.add($row * ldc);
            _mm256_storeu_ps(dst, _mm256_fmadd_ps($s, v_alpha, _mm256_loadu_ps(dst)));
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

/// Computes a 12×8 tile like [`kernel_12x8_avx2`], using a separate
/// multiply and add per step.
///
/// # Safety
///
/// Same contract as [`kernel_12x8_avx2`], except the CPU only needs AVX.
#[target_feature(enable = "avx")]
#[allow(clippy::identity_op)]
#[allow(clippy::erasing_op)]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn kernel_12x8_avx(
    a_pack: *const f32,
    b_pack: *const f32,
    c: *mut f32,
    k: usize,
    ldc: usize,
    alpha: f32,
) {
    use std::arch::x86_64::*;

    let mut s = [_mm256_setzero_ps(); 12];

    for p in 0..k {
        let a = a_pack.add(p * 12);
        let b_vec = _mm256_loadu_ps(b_pack.add(p * 8));

        for (r, acc) in s.iter_mut().enumerate() {
            *acc = _mm256_add_ps(*acc, _mm256_mul_ps(_mm256_broadcast_ss(&*a.add(r)), b_vec));
        }
    }

    let v_alpha = _mm256_set1_ps(alpha);
    for (r, acc) in s.iter().enumerate() {
        let dst = c.add(r * ldc);
        _mm256_storeu_ps(dst, _mm256_add_ps(_mm256_loadu_ps(dst), _mm256_mul_ps(*acc, v_alpha)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs `kernel` on one 12×8 tile with k = 16, alpha 0.5 and C at 2.0,
    /// and checks it against a plain triple loop.
    unsafe fn check_12x8(kernel: unsafe fn(*const f32, *const f32, *mut f32, usize, usize, f32)) {
        let k = 16;
        let a: Vec<f32> = (0..12 * k).map(|i| (i % 13) as f32).collect();
        let b: Vec<f32> = (0..k * 8).map(|i| (i % 10) as f32).collect();
        let mut c = vec![2.0f32; 12 * 8];

        // Pack A: for each k position, store 12 consecutive row values
        let mut a_pack = vec![0.0; k * 12];
        for p in 0..k {
            for i in 0..12 {
                a_pack[p * 12 + i] = a[i * k + p];
            }
        }

        // B is k×8 row-major, which already is the packed layout
        unsafe {
            kernel(a_pack.as_ptr(), b.as_ptr(), c.as_mut_ptr(), k, 8, 0.5);
        }

        let mut c_expected = vec![2.0f32; 12 * 8];
        for i in 0..12 {
            for j in 0..8 {
                let mut acc = 0.0;
                for p in 0..k {
                    acc += a[i * k + p] * b[p * 8 + j];
                }
                c_expected[i * 8 + j] += 0.5 * acc;
            }
        }

        // Small integers: every partial sum is exact in f32.
        assert_eq!(c, c_expected);
    }

    #[test]
    fn test_kernel_12x8_correctness() {
        if !(is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")) {
            println!("Skipping - AVX2/FMA not available");
            return;
        }
        unsafe { check_12x8(kernel_12x8_avx2) };
    }

    #[test]
    fn test_kernel_12x8_avx_without_fma() {
        if !is_x86_feature_detected!("avx") {
            println!("Skipping - AVX not available");
            return;
        }
        unsafe { check_12x8(kernel_12x8_avx) };
    }
}
