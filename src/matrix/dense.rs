//! Dense copies of strided views.
//!
//! The engine never materializes its operands; these are for tests and
//! benchmarks that want a plain row-major buffer to compare against.

use super::view::MatrixRef;

/// Copy `src` into a new row-major `rows × cols` buffer.
///
/// # Example
///
/// ```
/// use fastgemm::MatrixRef;
/// use fastgemm::matrix::dense::to_row_major;
///
/// let data = [1.0, 4.0,   // 2×3 matrix stored column-major
///             2.0, 5.0,
///             3.0, 6.0];
/// let view = MatrixRef::col_major(&data, 2, 3).unwrap();
///
/// assert_eq!(to_row_major(view), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// ```
pub fn to_row_major(src: MatrixRef<'_>) -> Vec<f32> {
    let mut out = Vec::with_capacity(src.rows() * src.cols());
    for i in 0..src.rows() {
        match src.contiguous_row(i) {
            Some(row) => out.extend_from_slice(row),
            None => out.extend((0..src.cols()).map(|j| src.get(i, j))),
        }
    }
    out
}

/// Row-major copy of `src^T` (`cols × rows`).
pub fn transpose(src: MatrixRef<'_>) -> Vec<f32> {
    to_row_major(src.t())
}
