//! Panel packing.
//!
//! Original: whatever strides the caller handed us.
//! Packed: bands of `lane` rows; inside a band, column j's `lane` values sit
//! next to each other, so the micro-kernel streams them with unit stride.

use crate::matrix::MatrixRef;

/// Floats written by [`pack_panel`] for a `rows × cols` source.
#[inline]
pub fn packed_len(rows: usize, cols: usize, lane: usize) -> usize {
    rows.div_ceil(lane) * lane * cols
}

/// Pack `src` into `dst` in lanes of `lane` elements.
///
/// Rows are grouped into bands of `lane`; for each band, `cols` lanes are
/// written, lane j holding `src(i, j)` for every row i of the band. A short
/// last band repeats its last valid row so every lane is full. The
/// macro-kernel never copies those rows' results back, so zero padding would
/// do just as well; repeating avoids a branch here and in the kernels.
///
/// A is packed with `lane = MR` from `A[i0.., k0..]`; B with `lane = NR`
/// from the transposed view `B[k0.., j0..]^T`.
///
/// # Panics
///
/// Panics if `dst` is shorter than [`packed_len`].
pub fn pack_panel(src: MatrixRef<'_>, lane: usize, dst: &mut [f32]) {
    let (rows, cols) = (src.rows(), src.cols());
    let len = packed_len(rows, cols, lane);
    assert!(
        dst.len() >= len,
        "pack buffer holds {} floats, need {}",
        dst.len(),
        len
    );

    for (band, out) in dst[..len].chunks_exact_mut(lane * cols).enumerate() {
        let i0 = band * lane;
        let valid = (rows - i0).min(lane);

        // Full band whose rows are adjacent: each lane is one straight copy.
        if valid == lane && src.row_stride() == 1 {
            for (j, lane_out) in out.chunks_exact_mut(lane).enumerate() {
                let Some(col) = src.contiguous_col(i0, j, lane) else {
                    unreachable!("unit row stride yields contiguous columns");
                };
                lane_out.copy_from_slice(col);
            }
            continue;
        }

        for r in 0..lane {
            let i = i0 + r.min(valid - 1);
            match src.contiguous_row(i) {
                Some(row) => {
                    for (j, &v) in row.iter().enumerate() {
                        out[j * lane + r] = v;
                    }
                }
                None => {
                    for j in 0..cols {
                        out[j * lane + r] = src.get(i, j);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_row_major_with_short_band() {
        // 5×3, lane 4: second band has one real row, padded with copies of it.
        let data: Vec<f32> = (0..15).map(|i| i as f32).collect();
        let src = MatrixRef::row_major(&data, 5, 3).unwrap();
        let mut dst = vec![-1.0; packed_len(5, 3, 4)];
        assert_eq!(dst.len(), 24);

        pack_panel(src, 4, &mut dst);

        let expected = [
            0.0, 3.0, 6.0, 9.0, // band 0, col 0
            1.0, 4.0, 7.0, 10.0, // band 0, col 1
            2.0, 5.0, 8.0, 11.0, // band 0, col 2
            12.0, 12.0, 12.0, 12.0, // band 1, col 0
            13.0, 13.0, 13.0, 13.0, //
            14.0, 14.0, 14.0, 14.0,
        ];
        assert_eq!(dst, expected);
    }

    #[test]
    fn test_pack_transposed_matches_strided() {
        // B (3×6 row-major) packed as B^T with lane 4 (the NR path).
        let data: Vec<f32> = (0..18).map(|i| i as f32 * 0.5).collect();
        let b = MatrixRef::row_major(&data, 3, 6).unwrap();
        let bt = b.t();
        let mut fast = vec![0.0; packed_len(6, 3, 4)];
        pack_panel(bt, 4, &mut fast);

        let mut expected = vec![0.0; fast.len()];
        for band in 0..2 {
            for j in 0..3 {
                for r in 0..4 {
                    let i = (band * 4 + r).min(5);
                    expected[band * 12 + j * 4 + r] = b.get(j, i);
                }
            }
        }
        assert_eq!(fast, expected);
    }

    #[test]
    fn test_pack_column_major_and_block() {
        let data: Vec<f32> = (0..48).map(|i| i as f32).collect();
        let col_major = MatrixRef::col_major(&data, 8, 6).unwrap();
        let block = col_major.block(2, 1, 5, 3);

        let mut dst = vec![0.0; packed_len(5, 3, 4)];
        pack_panel(block, 4, &mut dst);

        for band in 0..2 {
            for j in 0..3 {
                for r in 0..4 {
                    let i = (band * 4 + r).min(4);
                    assert_eq!(dst[band * 12 + j * 4 + r], block.get(i, j));
                }
            }
        }
    }

    #[test]
    fn test_full_contiguous_bands_fill_every_lane() {
        // Column-major, two full bands: every lane is a straight copy.
        let data: Vec<f32> = (0..24).map(|i| i as f32).collect();
        let src = MatrixRef::col_major(&data, 8, 3).unwrap();
        let mut dst = vec![f32::NAN; packed_len(8, 3, 4)];

        pack_panel(src, 4, &mut dst);

        assert!(dst.iter().all(|v| !v.is_nan()));
        for band in 0..2 {
            for j in 0..3 {
                let start = j * 8 + band * 4;
                assert_eq!(&dst[band * 12 + j * 4..][..4], &data[start..start + 4]);
            }
        }
    }

    #[test]
    fn test_pack_is_idempotent() {
        let data: Vec<f32> = (0..7 * 9).map(|i| (i as f32).sin()).collect();
        let src = MatrixRef::row_major(&data, 7, 9).unwrap();
        let mut first = vec![0.0; packed_len(7, 9, 12)];
        let mut second = vec![f32::NAN; first.len()];

        pack_panel(src, 12, &mut first);
        pack_panel(src, 12, &mut second);

        assert_eq!(
            first.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            second.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    #[should_panic(expected = "pack buffer")]
    fn test_pack_rejects_short_buffer() {
        let data = vec![0.0f32; 4];
        let src = MatrixRef::row_major(&data, 2, 2).unwrap();
        let mut dst = vec![0.0; 7];
        pack_panel(src, 4, &mut dst);
    }
}
