//! The GEMM engine: validation, planning and dispatch.

use std::sync::OnceLock;

use tracing::{debug, info};

use crate::blocked::packed_b::{PackedPanels, pack_b_into};
use crate::blocked::{Blocking, PackedB, PackedLayout};
use crate::config::GemmConfig;
use crate::error::{GemmError, Result};
use crate::kernels::MicroKernel;
use crate::matrix::{MatrixMut, MatrixRef};
use crate::threaded::dispatch::{BSource, OutPtr, TileJob};

/// A micro-kernel plus the blocking knobs it runs with.
///
/// Cheap to copy; holds no buffers. Scratch is allocated per call and per
/// worker, so one engine can serve any number of threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gemm {
    kernel: MicroKernel,
    config: GemmConfig,
}

static GLOBAL: OnceLock<Gemm> = OnceLock::new();

impl Gemm {
    pub fn new(kernel: MicroKernel, config: GemmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { kernel, config })
    }

    /// Best kernel for this CPU with the default configuration.
    pub fn detect() -> Self {
        Self {
            kernel: MicroKernel::detect(),
            config: GemmConfig::default(),
        }
    }

    /// Process-wide engine used by the flat `sgemm*` functions. Built on
    /// first use and never changed afterwards.
    pub fn global() -> &'static Gemm {
        GLOBAL.get_or_init(|| {
            let engine = Self::detect();
            info!(
                kernel = engine.kernel.name(),
                mr = engine.kernel.mr(),
                nr = engine.kernel.nr(),
                "selected GEMM micro-kernel"
            );
            engine
        })
    }

    #[inline]
    pub fn kernel(&self) -> &MicroKernel {
        &self.kernel
    }

    #[inline]
    pub fn config(&self) -> &GemmConfig {
        &self.config
    }

    /// Blocking this engine would use for an `m × n × k` problem.
    pub fn blocking(&self, m: usize, n: usize, k: usize) -> Blocking {
        Blocking::new(m, n, k, &self.kernel, &self.config)
    }

    /// C = alpha * A * B + beta * C.
    ///
    /// A is M×K, B is K×N, C is M×N. With beta = 0 the prior contents of C
    /// are never read, so C may hold garbage or NaN.
    pub fn gemm(
        &self,
        alpha: f32,
        a: MatrixRef<'_>,
        b: MatrixRef<'_>,
        beta: f32,
        c: &mut MatrixMut<'_>,
    ) -> Result<()> {
        if a.cols() != b.rows() {
            return Err(GemmError::InvalidDimensions(format!(
                "A is {}x{} but B is {}x{}",
                a.rows(),
                a.cols(),
                b.rows(),
                b.cols()
            )));
        }
        check_output(a.rows(), b.cols(), c)?;
        self.dispatch(alpha, a, BSource::Raw(b), beta, c)
    }

    /// Geometry of a pre-packed B (K×N) for this engine.
    pub fn pack_b_layout(&self, n: usize, k: usize) -> PackedLayout {
        PackedLayout::new(n, k, &self.kernel, &self.config)
    }

    /// Floats a pre-packed K×N B occupies.
    pub fn pack_b_len(&self, n: usize, k: usize) -> usize {
        self.pack_b_layout(n, k).len()
    }

    /// Packs B once for repeated [`gemm_packed_b`](Self::gemm_packed_b) calls.
    pub fn pack_b(&self, b: MatrixRef<'_>) -> Result<PackedB> {
        PackedB::pack(b, self.pack_b_layout(b.cols(), b.rows()))
    }

    /// Packs B into a caller-provided buffer of at least
    /// [`pack_b_len`](Self::pack_b_len) floats.
    pub fn pack_b_into(&self, b: MatrixRef<'_>, dst: &mut [f32]) -> Result<PackedLayout> {
        let layout = self.pack_b_layout(b.cols(), b.rows());
        pack_b_into(b, &layout, dst)?;
        Ok(layout)
    }

    /// Same as [`gemm`](Self::gemm) with B taken from a [`PackedB`].
    ///
    /// Fails with [`GemmError::PackedLayoutMismatch`] if `packed` was built
    /// by an engine with a different kernel or configuration. Results are
    /// bit-identical to [`gemm`](Self::gemm) with the unpacked B.
    pub fn gemm_packed_b(
        &self,
        alpha: f32,
        a: MatrixRef<'_>,
        packed: &PackedB,
        beta: f32,
        c: &mut MatrixMut<'_>,
    ) -> Result<()> {
        self.gemm_prepacked(alpha, a, packed.panels(), beta, c)
    }

    /// Pre-packed path over a raw buffer filled by
    /// [`pack_b_into`](Self::pack_b_into) for an `n`-column B.
    pub fn gemm_packed_b_slice(
        &self,
        alpha: f32,
        a: MatrixRef<'_>,
        packed: &[f32],
        beta: f32,
        c: &mut MatrixMut<'_>,
    ) -> Result<()> {
        let layout = self.pack_b_layout(c.cols(), a.cols());
        self.gemm_prepacked(alpha, a, PackedPanels::new(packed, layout)?, beta, c)
    }

    fn gemm_prepacked(
        &self,
        alpha: f32,
        a: MatrixRef<'_>,
        panels: PackedPanels<'_>,
        beta: f32,
        c: &mut MatrixMut<'_>,
    ) -> Result<()> {
        let layout = *panels.layout();
        if a.cols() != layout.k {
            return Err(GemmError::InvalidDimensions(format!(
                "A is {}x{} but packed B has K={}",
                a.rows(),
                a.cols(),
                layout.k
            )));
        }
        check_output(a.rows(), layout.n, c)?;

        let ours = self.pack_b_layout(layout.n, layout.k);
        if layout != ours {
            return Err(GemmError::PackedLayoutMismatch {
                expected: layout.to_string(),
                actual: ours.to_string(),
            });
        }
        self.dispatch(alpha, a, BSource::Packed(panels), beta, c)
    }

    fn dispatch(
        &self,
        alpha: f32,
        a: MatrixRef<'_>,
        b: BSource<'_>,
        beta: f32,
        c: &mut MatrixMut<'_>,
    ) -> Result<()> {
        let plan = self.blocking(c.rows(), c.cols(), a.cols());
        let stripes = if self.config.parallel {
            plan.stripes(self.config.stripe_cost_unit)
        } else {
            1
        };
        debug!(
            kernel = self.kernel.name(),
            m = plan.m,
            n = plan.n,
            k = plan.k,
            mc = plan.mc,
            nc = plan.nc,
            kc = plan.kc,
            tiles = plan.tiles(),
            stripes,
            prepacked = matches!(b, BSource::Packed(_)),
            "gemm plan"
        );

        let job = TileJob {
            kernel: self.kernel,
            plan,
            alpha,
            beta,
            a,
            b,
            c: OutPtr::new(c.as_mut_ptr()),
            ldc: c.row_stride(),
            max_stack_bytes: self.config.max_stack_bytes,
        };
        // SAFETY: `c` is exclusively borrowed and was bounds-checked as an
        // m×n matrix with row stride `ldc` when the view was built.
        unsafe { job.run(stripes) }
    }
}

fn check_output(m: usize, n: usize, c: &MatrixMut<'_>) -> Result<()> {
    if c.rows() != m || c.cols() != n {
        return Err(GemmError::InvalidDimensions(format!(
            "C is {}x{}, expected {}x{}",
            c.rows(),
            c.cols(),
            m,
            n
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::naive::gemm_naive;

    fn inputs(m: usize, n: usize, k: usize) -> (Vec<f32>, Vec<f32>) {
        let a = (0..m * k).map(|i| ((i % 17) as f32 - 8.0) * 0.125).collect();
        let b = (0..k * n).map(|i| ((i % 13) as f32 - 6.0) * 0.25).collect();
        (a, b)
    }

    #[test]
    fn test_gemm_matches_naive() {
        let (m, n, k) = (37, 29, 41);
        let (a, b) = inputs(m, n, k);
        let av = MatrixRef::row_major(&a, m, k).unwrap();
        let bv = MatrixRef::row_major(&b, k, n).unwrap();

        let mut expected = vec![0.5f32; m * n];
        gemm_naive(1.25, av, bv, 2.0, &mut MatrixMut::row_major(&mut expected, m, n).unwrap());

        let mut c = vec![0.5f32; m * n];
        Gemm::detect()
            .gemm(1.25, av, bv, 2.0, &mut MatrixMut::row_major(&mut c, m, n).unwrap())
            .unwrap();

        for i in 0..m * n {
            assert!(
                (c[i] - expected[i]).abs() < 1e-3,
                "mismatch at {}: got {}, expected {}",
                i,
                c[i],
                expected[i]
            );
        }
    }

    #[test]
    fn test_shape_errors_leave_c_untouched() {
        let (a, b) = inputs(4, 5, 6);
        let av = MatrixRef::row_major(&a, 4, 6).unwrap();
        let bv = MatrixRef::row_major(&b, 6, 5).unwrap();
        let mut c = vec![3.0f32; 4 * 4];
        let mut cv = MatrixMut::row_major(&mut c, 4, 4).unwrap();

        let engine = Gemm::detect();
        assert!(matches!(
            engine.gemm(1.0, av, bv, 0.0, &mut cv),
            Err(GemmError::InvalidDimensions(_))
        ));
        assert!(matches!(
            engine.gemm(1.0, av, av, 0.0, &mut cv),
            Err(GemmError::InvalidDimensions(_))
        ));
        assert!(c.iter().all(|&v| v == 3.0));
    }

    #[test]
    fn test_packed_b_from_other_engine_rejected() {
        let (m, n, k) = (8, 300, 20);
        let (a, b) = inputs(m, n, k);
        let av = MatrixRef::row_major(&a, m, k).unwrap();
        let bv = MatrixRef::row_major(&b, k, n).unwrap();

        let narrow = Gemm::new(
            MicroKernel::portable(),
            GemmConfig {
                nc_ceiling: 64,
                ..GemmConfig::default()
            },
        )
        .unwrap();
        let packed = narrow.pack_b(bv).unwrap();

        let mut c = vec![0.0f32; m * n];
        let mut cv = MatrixMut::row_major(&mut c, m, n).unwrap();
        let err = Gemm::new(MicroKernel::portable(), GemmConfig::default())
            .unwrap()
            .gemm_packed_b(1.0, av, &packed, 0.0, &mut cv)
            .unwrap_err();
        assert!(matches!(err, GemmError::PackedLayoutMismatch { .. }), "{}", err);
        assert!(narrow.gemm_packed_b(1.0, av, &packed, 0.0, &mut cv).is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = GemmConfig {
            storage_bytes: 0,
            ..GemmConfig::default()
        };
        assert!(matches!(
            Gemm::new(MicroKernel::portable(), cfg),
            Err(GemmError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_huge_ceiling_rejected_before_gemm() {
        let cfg = GemmConfig {
            mc_ceiling: usize::MAX / 4,
            ..GemmConfig::default()
        };
        assert!(matches!(
            Gemm::new(MicroKernel::portable(), cfg),
            Err(GemmError::InvalidConfig(_))
        ));

        // The largest accepted ceilings still plan a small call without overflow.
        let cfg = GemmConfig {
            mc_ceiling: crate::config::MAX_CEILING,
            nc_ceiling: crate::config::MAX_CEILING,
            ..GemmConfig::default()
        };
        let engine = Gemm::new(MicroKernel::portable(), cfg).unwrap();
        assert_eq!(engine.config(), &cfg);

        let a = [1.0f32, 2.0, 3.0, 4.0];
        let b = [5.0f32, 6.0, 7.0, 8.0];
        let mut c = [0.0f32; 4];
        engine
            .gemm(
                1.0,
                MatrixRef::row_major(&a, 2, 2).unwrap(),
                MatrixRef::row_major(&b, 2, 2).unwrap(),
                0.0,
                &mut MatrixMut::row_major(&mut c, 2, 2).unwrap(),
            )
            .unwrap();
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_global_is_detected_once() {
        let first = Gemm::global();
        assert!(std::ptr::eq(first, Gemm::global()));
        assert_eq!(*first.kernel(), MicroKernel::detect());
    }
}
