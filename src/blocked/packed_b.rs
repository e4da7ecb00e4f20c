//! B packed once, ahead of time, for reuse across many GEMM calls.
//!
//! Layout: for each NC-wide column tile `j0` (left to right), for each
//! K-chunk `k0` (top to bottom), one panel in the [`pack_panel`] format with
//! lane NR. The panel of tile `j0`, chunk `k0` starts at
//! `j0 * K + round_up(nc_tile, NR) * k0`.

use std::fmt;

use super::blocking::{Blocking, round_up};
use super::pack::{pack_panel, packed_len};
use crate::config::GemmConfig;
use crate::error::{GemmError, Result};
use crate::kernels::MicroKernel;
use crate::matrix::MatrixRef;

/// Geometry a pre-packed B was built with. A buffer is only usable by an
/// engine that derives the same geometry for the same N and K.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedLayout {
    pub n: usize,
    pub k: usize,
    pub nr: usize,
    pub nc: usize,
    pub kc: usize,
}

impl PackedLayout {
    pub fn new(n: usize, k: usize, kernel: &MicroKernel, config: &GemmConfig) -> Self {
        let nr = kernel.nr();
        Self {
            n,
            k,
            nr,
            nc: Blocking::nc_for(n, nr, config),
            kc: Blocking::kc_for(n, k, kernel.mr(), nr, config),
        }
    }

    /// Floats needed: `ceil(N / NC) * NC * K`.
    #[inline]
    pub fn len(&self) -> usize {
        self.n.div_ceil(self.nc) * self.nc * self.k
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset of the panel for column tile `j0` (width `nc_tile`) and
    /// K-chunk `k0`.
    #[inline]
    pub fn panel_offset(&self, j0: usize, nc_tile: usize, k0: usize) -> usize {
        j0 * self.k + round_up(nc_tile, self.nr) * k0
    }
}

impl fmt::Display for PackedLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N={} K={} NR={} NC={} KC={}",
            self.n, self.k, self.nr, self.nc, self.kc
        )
    }
}

/// Packs all of `b` (K×N) into `dst` following `layout`.
pub fn pack_b_into(b: MatrixRef<'_>, layout: &PackedLayout, dst: &mut [f32]) -> Result<()> {
    if b.rows() != layout.k || b.cols() != layout.n {
        return Err(GemmError::InvalidDimensions(format!(
            "B is {}x{}, layout expects {}x{}",
            b.rows(),
            b.cols(),
            layout.k,
            layout.n
        )));
    }
    let required = layout.len();
    if dst.len() < required {
        return Err(GemmError::PackedBufferTooSmall {
            required,
            len: dst.len(),
        });
    }

    for j0 in (0..layout.n).step_by(layout.nc) {
        let nc = (layout.n - j0).min(layout.nc);
        for k0 in (0..layout.k).step_by(layout.kc) {
            let kc = (layout.k - k0).min(layout.kc);
            let start = layout.panel_offset(j0, nc, k0);
            let end = start + packed_len(nc, kc, layout.nr);
            pack_panel(b.block(k0, j0, kc, nc).t(), layout.nr, &mut dst[start..end]);
        }
    }
    Ok(())
}

/// Owned pre-packed B.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedB {
    data: Vec<f32>,
    layout: PackedLayout,
}

impl PackedB {
    /// Allocates and packs `b` for the given geometry.
    pub fn pack(b: MatrixRef<'_>, layout: PackedLayout) -> Result<Self> {
        let len = layout.len();
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| GemmError::Allocation {
                bytes: len.saturating_mul(size_of::<f32>()),
            })?;
        data.resize(len, 0.0);
        pack_b_into(b, &layout, &mut data)?;
        Ok(Self { data, layout })
    }

    #[inline]
    pub fn layout(&self) -> &PackedLayout {
        &self.layout
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    pub(crate) fn panels(&self) -> PackedPanels<'_> {
        PackedPanels {
            data: &self.data,
            layout: self.layout,
        }
    }
}

/// Borrowed pre-packed B, either from a [`PackedB`] or a caller's buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PackedPanels<'a> {
    data: &'a [f32],
    layout: PackedLayout,
}

impl<'a> PackedPanels<'a> {
    pub(crate) fn new(data: &'a [f32], layout: PackedLayout) -> Result<Self> {
        let required = layout.len();
        if data.len() < required {
            return Err(GemmError::PackedBufferTooSmall {
                required,
                len: data.len(),
            });
        }
        Ok(Self { data, layout })
    }

    #[inline]
    pub(crate) fn layout(&self) -> &PackedLayout {
        &self.layout
    }

    /// Panel for column tile `j0` of width `nc`, K-chunk `k0` of depth `kc`.
    #[inline]
    pub(crate) fn panel(&self, j0: usize, nc: usize, k0: usize, kc: usize) -> &'a [f32] {
        let start = self.layout.panel_offset(j0, nc, k0);
        &self.data[start..start + packed_len(nc, kc, self.layout.nr)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> GemmConfig {
        // Forces several column tiles and K-chunks on a small B.
        GemmConfig {
            nc_ceiling: 16,
            storage_bytes: 2 * 1024,
            ..GemmConfig::default()
        }
    }

    #[test]
    fn test_layout_geometry() {
        let kernel = MicroKernel::portable();
        let layout = PackedLayout::new(37, 50, &kernel, &small_config());
        assert_eq!(layout.nr, kernel.nr());
        assert_eq!(layout.nc % layout.nr, 0);
        assert!(layout.kc < 50, "{}", layout);
        assert_eq!(layout.len(), 37usize.div_ceil(layout.nc) * layout.nc * 50);
        assert!(layout.to_string().starts_with("N=37 K=50"));
    }

    #[test]
    fn test_panels_match_on_the_fly_packing() {
        let kernel = MicroKernel::portable();
        let (k, n) = (50, 37);
        let data: Vec<f32> = (0..k * n).map(|i| i as f32).collect();
        let b = MatrixRef::row_major(&data, k, n).unwrap();
        let layout = PackedLayout::new(n, k, &kernel, &small_config());

        let packed = PackedB::pack(b, layout).unwrap();
        assert_eq!(packed.clone().into_vec(), packed.as_slice());
        let panels = packed.panels();

        for j0 in (0..n).step_by(layout.nc) {
            let nc = (n - j0).min(layout.nc);
            for k0 in (0..k).step_by(layout.kc) {
                let kc = (k - k0).min(layout.kc);
                let mut fresh = vec![0.0; packed_len(nc, kc, layout.nr)];
                pack_panel(b.block(k0, j0, kc, nc).t(), layout.nr, &mut fresh);
                assert_eq!(panels.panel(j0, nc, k0, kc), &fresh[..], "j0={} k0={}", j0, k0);
            }
        }
    }

    #[test]
    fn test_pack_b_errors() {
        let kernel = MicroKernel::portable();
        let data = vec![1.0f32; 6];
        let b = MatrixRef::row_major(&data, 2, 3).unwrap();
        let layout = PackedLayout::new(3, 2, &kernel, &GemmConfig::default());

        let mut short = vec![0.0; layout.len() - 1];
        assert!(matches!(
            pack_b_into(b, &layout, &mut short),
            Err(GemmError::PackedBufferTooSmall { .. })
        ));

        let wrong = PackedLayout::new(2, 3, &kernel, &GemmConfig::default());
        let mut dst = vec![0.0; wrong.len()];
        assert!(matches!(
            pack_b_into(b, &wrong, &mut dst),
            Err(GemmError::InvalidDimensions(_))
        ));

        assert!(PackedPanels::new(&short, layout).is_err());
    }
}
