//! 8×12 NEON microkernel for single-precision GEMM (AArch64).

/// Computes an 8×12 tile: C[0:8, 0:12] += alpha * (A_packed × B_packed)
///
/// AArch64 has 32 q-registers, so each output row keeps three 4-float
/// accumulators (24 in total). Each k step loads the 8 A values as two
/// vectors and the 12 B values as three, then uses lane-indexed FMA so no
/// broadcasts are needed.
///
/// # Safety
///
/// Caller must ensure:
/// - `a_pack` points to `k * 8` contiguous f32 values (packed A panel)
/// - `b_pack` points to `k * 12` contiguous f32 values (packed B panel)
/// - `c.add(row * ldc)` is valid for row in 0..8, each allowing read/write of 12 f32s
#[target_feature(enable = "neon")]
#[allow(clippy::identity_op)]
#[allow(clippy::erasing_op)]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn kernel_8x12_neon(
    a_pack: *const f32,
    b_pack: *const f32,
    c: *mut f32,
    k: usize,
    ldc: usize,
    alpha: f32,
) {
    use std::arch::aarch64::*;

    let zero = vdupq_n_f32(0.0);
    let (mut s00, mut s01, mut s02) = (zero, zero, zero);
    let (mut s10, mut s11, mut s12) = (zero, zero, zero);
    let (mut s20, mut s21, mut s22) = (zero, zero, zero);
    let (mut s30, mut s31, mut s32) = (zero, zero, zero);
    let (mut s40, mut s41, mut s42) = (zero, zero, zero);
    let (mut s50, mut s51, mut s52) = (zero, zero, zero);
    let (mut s60, mut s61, mut s62) = (zero, zero, zero);
    let (mut s70, mut s71, mut s72) = (zero, zero, zero);

    for p in 0..k {
        let a = a_pack.add(p * 8);
        let b = b_pack.add(p * 12);

        let b0 = vld1q_f32(b);
        let b1 = vld1q_f32(b.add(4));
        let b2 = vld1q_f32(b.add(8));

        let a0 = vld1q_f32(a);
        s00 = vfmaq_laneq_f32::<0>(s00, b0, a0);
        s01 = vfmaq_laneq_f32::<0>(s01, b1, a0);
        s02 = vfmaq_laneq_f32::<0>(s02, b2, a0);
        s10 = vfmaq_laneq_f32::<1>(s10, b0, a0);
        s11 = vfmaq_laneq_f32::<1>(s11, b1, a0);
        s12 = vfmaq_laneq_f32::<1>(s12, b2, a0);
        s20 = vfmaq_laneq_f32::<2>(s20, b0, a0);
        s21 = vfmaq_laneq_f32::<2>(s21, b1, a0);
        s22 = vfmaq_laneq_f32::<2>(s22, b2, a0);
        s30 = vfmaq_laneq_f32::<3>(s30, b0, a0);
        s31 = vfmaq_laneq_f32::<3>(s31, b1, a0);
        s32 = vfmaq_laneq_f32::<3>(s32, b2, a0);

        let a1 = vld1q_f32(a.add(4));
        s40 = vfmaq_laneq_f32::<0>(s40, b0, a1);
        s41 = vfmaq_laneq_f32::<0>(s41, b1, a1);
        s42 = vfmaq_laneq_f32::<0>(s42, b2, a1);
        s50 = vfmaq_laneq_f32::<1>(s50, b0, a1);
        s51 = vfmaq_laneq_f32::<1>(s51, b1, a1);
        s52 = vfmaq_laneq_f32::<1>(s52, b2, a1);
        s60 = vfmaq_laneq_f32::<2>(s60, b0, a1);
        s61 = vfmaq_laneq_f32::<2>(s61, b1, a1);
        s62 = vfmaq_laneq_f32::<2>(s62, b2, a1);
        s70 = vfmaq_laneq_f32::<3>(s70, b0, a1);
        s71 = vfmaq_laneq_f32::<3>(s71, b1, a1);
        s72 = vfmaq_laneq_f32::<3>(s72, b2, a1);
    }

    let v_alpha = vdupq_n_f32(alpha);

    // C[row][0..12] = C[row][0..12] + s * alpha
    macro_rules! finale {
        ($row:expr, $x0:ident, $x1:ident, $x2:ident) => {
            let dst = c.add($row * ldc);
            vst1q_f32(dst, vfmaq_f32(vld1q_f32(dst), $x0, v_alpha));
            vst1q_f32(dst.add(4), vfmaq_f32(vld1q_f32(dst.add(4)), $x1, v_alpha));
            vst1q_f32(dst.add(8), vfmaq_f32(vld1q_f32(dst.add(8)), $x2, v_alpha));
        };
    }

    finale!(0, s00, s01, s02);
    finale!(1, s10, s11, s12);
    finale!(2, s20, s21, s22);
    finale!(3, s30, s31, s32);
    finale!(4, s40, s41, s42);
    finale!(5, s50, s51, s52);
    finale!(6, s60, s61, s62);
    finale!(7, s70, s71, s72);
}
