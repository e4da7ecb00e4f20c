//! Strided matrix views plus the reference routines the fast path is
//! checked against.
//!
//! Views describe a 2D buffer by `(offset, rows, cols, row_stride,
//! col_stride)` so row-major, column-major, transposed and sub-block
//! operands all reach the engine without being copied.

pub mod dense;
pub mod naive;
pub mod view;

pub use view::{MatrixMut, MatrixRef};
