//! Micro-kernels for the innermost loop of the GEMM.
//!
//! Each kernel computes one MR×NR tile of C += alpha * A_packed × B_packed,
//! keeping MR×NR running sums in registers over the whole K slice and
//! applying alpha once when the tile is written back. They're called by
//! the macro-kernel after the operands have been packed into lanes.
//!
//! Available kernels:
//! - `kernel_scalar`: portable fallback, any MR×NR (12×8, or 8×12 on aarch64)
//! - `kernel_12x8`: 12×8 tile, AVX2 + FMA (12 ymm accumulators), plus a
//!   plain-AVX variant with separate multiply and add for pre-Haswell CPUs
//! - `kernel_12x16`: 12×16 tile, AVX-512F (12 zmm accumulators)
//! - `kernel_8x12`: 8×12 tile, NEON (24 q-register accumulators)
//!
//! 32-bit ARM runs the scalar kernel: the `arm` NEON intrinsics in
//! `std::arch` are still unstable, so there is no 12×4 NEON kernel there.
//!
//! A kernel is picked once through [`MicroKernel::detect`] and carried around
//! as a plain value; nothing is dispatched through mutable globals.

use std::fmt;

pub mod kernel_scalar;

#[cfg(target_arch = "x86_64")]
pub mod kernel_12x16;
#[cfg(target_arch = "x86_64")]
pub mod kernel_12x8;

#[cfg(target_arch = "aarch64")]
pub mod kernel_8x12;

/// Largest MR×NR any kernel uses. Sizes the edge-tile scratch.
pub const MAX_TILE: usize = 12 * 16;

/// Signature shared by every micro-kernel.
///
/// `(a_pack, b_pack, c, k, ldc, alpha)`: `a_pack` holds `k` lanes of MR
/// floats, `b_pack` holds `k` lanes of NR floats, `c` addresses an MR×NR
/// tile with row stride `ldc`.
pub type KernelFn =
    unsafe fn(a_pack: *const f32, b_pack: *const f32, c: *mut f32, k: usize, ldc: usize, alpha: f32);

/// A micro-kernel together with its register tile shape.
#[derive(Clone, Copy)]
pub struct MicroKernel {
    name: &'static str,
    mr: usize,
    nr: usize,
    func: KernelFn,
}

#[cfg(not(target_arch = "aarch64"))]
const SCALAR: MicroKernel = MicroKernel {
    name: "scalar-12x8",
    mr: 12,
    nr: 8,
    func: kernel_scalar::kernel_scalar::<12, 8>,
};

#[cfg(target_arch = "aarch64")]
const SCALAR: MicroKernel = MicroKernel {
    name: "scalar-8x12",
    mr: 8,
    nr: 12,
    func: kernel_scalar::kernel_scalar::<8, 12>,
};

#[cfg(target_arch = "x86_64")]
const AVX2_12X8: MicroKernel = MicroKernel {
    name: "avx2-12x8",
    mr: 12,
    nr: 8,
    func: kernel_12x8::kernel_12x8_avx2,
};

#[cfg(target_arch = "x86_64")]
const AVX_12X8: MicroKernel = MicroKernel {
    name: "avx-12x8",
    mr: 12,
    nr: 8,
    func: kernel_12x8::kernel_12x8_avx,
};

#[cfg(target_arch = "x86_64")]
const AVX512_12X16: MicroKernel = MicroKernel {
    name: "avx512-12x16",
    mr: 12,
    nr: 16,
    func: kernel_12x16::kernel_12x16_avx512,
};

#[cfg(target_arch = "aarch64")]
const NEON_8X12: MicroKernel = MicroKernel {
    name: "neon-8x12",
    mr: 8,
    nr: 12,
    func: kernel_8x12::kernel_8x12_neon,
};

impl MicroKernel {
    /// Fastest kernel this CPU supports (AVX-512 > AVX2 > AVX > NEON > scalar).
    pub fn detect() -> Self {
        Self::available().into_iter().next().unwrap_or(SCALAR)
    }

    /// Scalar kernel with the same tile shape as the native SIMD kernel of
    /// this architecture's baseline (12×8 on x86, 8×12 on aarch64).
    pub fn portable() -> Self {
        SCALAR
    }

    /// Every kernel usable on this CPU, best first. The portable kernel is
    /// always last.
    pub fn available() -> Vec<Self> {
        #[allow(unused_mut)]
        let mut kernels = Vec::new();

        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx512f") {
                kernels.push(AVX512_12X16);
            }
            if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
                kernels.push(AVX2_12X8);
            }
            if is_x86_feature_detected!("avx") {
                kernels.push(AVX_12X8);
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            if std::arch::is_aarch64_feature_detected!("neon") {
                kernels.push(NEON_8X12);
            }
        }

        kernels.push(SCALAR);
        kernels
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Rows of C per call.
    #[inline]
    pub fn mr(&self) -> usize {
        self.mr
    }

    /// Columns of C per call.
    #[inline]
    pub fn nr(&self) -> usize {
        self.nr
    }

    /// Runs the kernel on one full MR×NR tile.
    ///
    /// # Safety
    ///
    /// - `a_pack` must be valid for reading `k * mr` floats
    /// - `b_pack` must be valid for reading `k * nr` floats
    /// - `c.add(row * ldc)` must be valid for reading and writing `nr` floats
    ///   for every row in `0..mr`
    #[inline]
    pub unsafe fn run(
        &self,
        a_pack: *const f32,
        b_pack: *const f32,
        c: *mut f32,
        k: usize,
        ldc: usize,
        alpha: f32,
    ) {
        // SAFETY: kernels are only handed out by `available()`, which checked
        // the CPU features; the pointer contract is the caller's.
        unsafe { (self.func)(a_pack, b_pack, c, k, ldc, alpha) }
    }
}

impl PartialEq for MicroKernel {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.mr == other.mr && self.nr == other.nr
    }
}

impl Eq for MicroKernel {}

impl fmt::Debug for MicroKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicroKernel")
            .field("name", &self.name)
            .field("mr", &self.mr)
            .field("nr", &self.nr)
            .finish()
    }
}
