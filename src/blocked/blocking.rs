//! Blocking parameters and tile arithmetic.

use std::ops::Range;

use crate::config::GemmConfig;
use crate::kernels::MicroKernel;

#[inline]
pub(crate) fn round_up(x: usize, to: usize) -> usize {
    x.div_ceil(to) * to
}

/// One MC×NC region of C, in matrix coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub i0: usize,
    pub j0: usize,
    /// Actual rows, `<= MC`.
    pub mc: usize,
    /// Actual columns, `<= NC`.
    pub nc: usize,
}

/// Cache- and register-level block sizes for one problem.
///
/// Invariants: `mc % mr == 0`, `nc % nr == 0`, `1 <= kc <= k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blocking {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub mr: usize,
    pub nr: usize,
    pub mc: usize,
    pub nc: usize,
    pub kc: usize,
    pub m_tiles: usize,
    pub n_tiles: usize,
}

impl Blocking {
    pub fn new(m: usize, n: usize, k: usize, kernel: &MicroKernel, config: &GemmConfig) -> Self {
        let (mr, nr) = (kernel.mr(), kernel.nr());
        let mc = round_up(config.mc_ceiling.min(m).max(1), mr);
        let nc = Self::nc_for(n, nr, config);
        let kc = Self::kc_for(n, k, mr, nr, config);

        Self {
            m,
            n,
            k,
            mr,
            nr,
            mc,
            nc,
            kc,
            m_tiles: m.div_ceil(mc),
            n_tiles: n.div_ceil(nc),
        }
    }

    /// NC depends on N alone, so pre-packed B can be laid out without M.
    pub fn nc_for(n: usize, nr: usize, config: &GemmConfig) -> usize {
        round_up(config.nc_ceiling.min(n).max(1), nr)
    }

    /// KC sized so `KC * (MC + NC)` floats fit `storage_bytes`, using the MC
    /// ceiling rather than the actual MC. That keeps KC independent of M and
    /// identical between the raw-B and pre-packed-B paths.
    pub fn kc_for(n: usize, k: usize, mr: usize, nr: usize, config: &GemmConfig) -> usize {
        let mc_cap = round_up(config.mc_ceiling, mr);
        let nc = Self::nc_for(n, nr, config);
        let panel_bytes = mc_cap.saturating_add(nc).saturating_mul(size_of::<f32>());
        let kc = config.storage_bytes / panel_bytes;
        kc.max(config.kc_min).min(k)
    }

    /// Independent MC×NC tiles covering C.
    #[inline]
    pub fn tiles(&self) -> usize {
        self.m_tiles * self.n_tiles
    }

    /// Tile `idx`, row-major over the tile grid.
    pub fn tile(&self, idx: usize) -> Tile {
        let i0 = (idx / self.n_tiles) * self.mc;
        let j0 = (idx % self.n_tiles) * self.nc;
        Tile {
            i0,
            j0,
            mc: (self.m - i0).min(self.mc),
            nc: (self.n - j0).min(self.nc),
        }
    }

    /// Floats of packed A one worker needs.
    #[inline]
    pub fn packed_a_len(&self) -> usize {
        self.kc * self.mc
    }

    /// Floats of packed B one worker needs when B is packed on the fly.
    #[inline]
    pub fn packed_b_len(&self) -> usize {
        self.kc * self.nc
    }

    /// Micro-kernel calls per tile, the unit of the stripe estimate.
    #[inline]
    pub fn cost_per_tile(&self) -> usize {
        (self.k / self.kc) * (self.mc / self.mr) * (self.nc / self.nr)
    }

    /// How many stripes to split the tiles into: about one per
    /// `cost_unit` micro-kernel calls, at least 1, at most one per tile.
    pub fn stripes(&self, cost_unit: usize) -> usize {
        let total = self.tiles();
        let estimate = (total * self.cost_per_tile()) as f64 / cost_unit as f64;
        (estimate.round() as usize).clamp(1, total)
    }

    /// Tiles owned by `stripe` out of `stripes`.
    pub fn stripe_range(&self, stripe: usize, stripes: usize) -> Range<usize> {
        let total = self.tiles();
        (stripe * total / stripes)..((stripe + 1) * total / stripes)
    }
}
