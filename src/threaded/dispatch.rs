//! Tile dispatcher: beta scaling, K-chunk loop and the parallel-for.

use rayon::prelude::*;
use std::ops::Range;
use tracing::trace;

use crate::blocked::Blocking;
use crate::blocked::macro_kernel::macro_kernel;
use crate::blocked::pack::{pack_panel, packed_len};
use crate::blocked::packed_b::PackedPanels;
use crate::error::Result;
use crate::kernels::MicroKernel;
use crate::matrix::MatrixRef;

use super::scratch::Scratch;

/// Where a tile's B panels come from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BSource<'a> {
    /// Packed per tile and K-chunk into the worker's scratch.
    Raw(MatrixRef<'a>),
    /// Already packed, indexed in place.
    Packed(PackedPanels<'a>),
}

/// Base of C, shared with the workers. Tiles write disjoint regions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OutPtr(*mut f32);

// SAFETY: every worker writes only the C tiles it owns.
unsafe impl Send for OutPtr {}
unsafe impl Sync for OutPtr {}

impl OutPtr {
    pub(crate) fn new(ptr: *mut f32) -> Self {
        Self(ptr)
    }

    // A method (not `.0`) so closures capture the whole Sync wrapper.
    #[inline]
    fn get(self) -> *mut f32 {
        self.0
    }
}

/// One validated GEMM call, ready to run.
pub(crate) struct TileJob<'a> {
    pub kernel: MicroKernel,
    pub plan: Blocking,
    pub alpha: f32,
    pub beta: f32,
    pub a: MatrixRef<'a>,
    pub b: BSource<'a>,
    pub c: OutPtr,
    pub ldc: usize,
    pub max_stack_bytes: usize,
}

impl TileJob<'_> {
    /// Runs every tile, split into `stripes` contiguous ranges. One stripe
    /// runs on the calling thread.
    ///
    /// # Safety
    ///
    /// `c` must address an `m × n` matrix with row stride `ldc`, valid for
    /// read/write and not aliased for the duration of the call.
    pub(crate) unsafe fn run(&self, stripes: usize) -> Result<()> {
        if stripes <= 1 {
            // SAFETY: forwarded from the caller.
            return unsafe { self.run_stripe(0..self.plan.tiles()) };
        }

        (0..stripes).into_par_iter().try_for_each(|s| {
            let tiles = self.plan.stripe_range(s, stripes);
            // SAFETY: stripe ranges are disjoint, so are their C tiles.
            unsafe { self.run_stripe(tiles) }
        })
    }

    fn scratch_len(&self) -> usize {
        match self.b {
            BSource::Raw(_) => self.plan.packed_a_len() + self.plan.packed_b_len(),
            BSource::Packed(_) => self.plan.packed_a_len(),
        }
    }

    unsafe fn run_stripe(&self, tiles: Range<usize>) -> Result<()> {
        let mut scratch = Scratch::new(self.scratch_len(), self.max_stack_bytes)?;
        trace!(
            tiles = ?tiles,
            inline = scratch.is_inline(),
            "gemm stripe"
        );

        let (packed_a, packed_b) = scratch.as_mut_slice().split_at_mut(self.plan.packed_a_len());
        for idx in tiles {
            // SAFETY: forwarded from `run`.
            unsafe { self.run_tile(idx, packed_a, packed_b) };
        }
        Ok(())
    }

    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn run_tile(&self, idx: usize, packed_a: &mut [f32], packed_b: &mut [f32]) {
        let plan = &self.plan;
        let (mr, nr) = (plan.mr, plan.nr);
        let tile = plan.tile(idx);
        let c_tile = self.c.get().add(tile.i0 * self.ldc + tile.j0);

        scale_tile(c_tile, tile.mc, tile.nc, self.ldc, self.beta);

        for k0 in (0..plan.k).step_by(plan.kc) {
            let kc = (plan.k - k0).min(plan.kc);

            let a_len = packed_len(tile.mc, kc, mr);
            pack_panel(self.a.block(tile.i0, k0, tile.mc, kc), mr, &mut packed_a[..a_len]);

            let b_panel: &[f32] = match &self.b {
                BSource::Raw(b) => {
                    let b_len = packed_len(tile.nc, kc, nr);
                    pack_panel(b.block(k0, tile.j0, kc, tile.nc).t(), nr, &mut packed_b[..b_len]);
                    &packed_b[..b_len]
                }
                BSource::Packed(panels) => panels.panel(tile.j0, tile.nc, k0, kc),
            };

            macro_kernel(
                &self.kernel,
                tile.mc,
                tile.nc,
                kc,
                &packed_a[..a_len],
                b_panel,
                self.alpha,
                c_tile,
                self.ldc,
            );
        }
    }
}

/// C_tile *= beta, done once per tile before any accumulation.
///
/// beta = 0 overwrites, so NaN or garbage already in C never leaks through;
/// beta = 1 leaves C alone.
///
/// # Safety
///
/// `c.add(i * ldc + j)` valid for read/write for `i < rows`, `j < cols`.
#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn scale_tile(c: *mut f32, rows: usize, cols: usize, ldc: usize, beta: f32) {
    if beta == 1.0 {
        return;
    }
    for i in 0..rows {
        let row = std::slice::from_raw_parts_mut(c.add(i * ldc), cols);
        if beta == 0.0 {
            row.fill(0.0);
        } else {
            row.iter_mut().for_each(|v| *v *= beta);
        }
    }
}
