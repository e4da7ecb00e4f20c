//! Borrowed, strided views over `f32` buffers.

use crate::error::{GemmError, Result};

/// Number of elements a `rows × cols` view with the given strides touches,
/// counted from its first element. `None` on overflow.
fn span(rows: usize, cols: usize, row_stride: usize, col_stride: usize) -> Option<usize> {
    (rows - 1)
        .checked_mul(row_stride)?
        .checked_add((cols - 1).checked_mul(col_stride)?)?
        .checked_add(1)
}

/// Read-only view of a logically 2D matrix.
///
/// Element `(i, j)` lives at `data[offset + i * row_stride + j * col_stride]`.
/// Strides may be anything that keeps every element inside `data`, including
/// zero (broadcast a row or column).
#[derive(Debug, Clone, Copy)]
pub struct MatrixRef<'a> {
    data: &'a [f32],
    offset: usize,
    rows: usize,
    cols: usize,
    row_stride: usize,
    col_stride: usize,
}

impl<'a> MatrixRef<'a> {
    /// Strided view over `data`.
    ///
    /// Fails if a dimension is zero or the last element falls outside `data`.
    pub fn new(
        data: &'a [f32],
        rows: usize,
        cols: usize,
        row_stride: usize,
        col_stride: usize,
    ) -> Result<Self> {
        Self::labeled("matrix", data, rows, cols, row_stride, col_stride)
    }

    /// Dense row-major view (`row_stride = cols`).
    pub fn row_major(data: &'a [f32], rows: usize, cols: usize) -> Result<Self> {
        Self::new(data, rows, cols, cols, 1)
    }

    /// Dense column-major view (`col_stride = rows`).
    pub fn col_major(data: &'a [f32], rows: usize, cols: usize) -> Result<Self> {
        Self::new(data, rows, cols, 1, rows)
    }

    pub(crate) fn labeled(
        what: &'static str,
        data: &'a [f32],
        rows: usize,
        cols: usize,
        row_stride: usize,
        col_stride: usize,
    ) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GemmError::InvalidDimensions(format!(
                "{what} is {rows}x{cols}, both dimensions must be positive"
            )));
        }
        let required = span(rows, cols, row_stride, col_stride).unwrap_or(usize::MAX);
        if required > data.len() {
            return Err(GemmError::OutOfBounds {
                what,
                required,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            offset: 0,
            rows,
            cols,
            row_stride,
            col_stride,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    #[inline]
    pub fn col_stride(&self) -> usize {
        self.col_stride
    }

    /// Transposed view. Swaps dimensions and strides, no data moves.
    pub fn t(self) -> Self {
        Self {
            rows: self.cols,
            cols: self.rows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
            ..self
        }
    }

    /// Sub-block starting at `(r0, c0)` with the given extent.
    ///
    /// # Panics
    ///
    /// Panics if the block does not lie inside this view or is empty.
    pub fn block(self, r0: usize, c0: usize, rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "empty block {}x{}", rows, cols);
        assert!(
            r0 + rows <= self.rows && c0 + cols <= self.cols,
            "block ({}, {}) + {}x{} exceeds {}x{} view",
            r0,
            c0,
            rows,
            cols,
            self.rows,
            self.cols
        );
        Self {
            offset: self.offset + r0 * self.row_stride + c0 * self.col_stride,
            rows,
            cols,
            ..self
        }
    }

    /// Element `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[self.offset + i * self.row_stride + j * self.col_stride]
    }

    /// Elements of row `i` at unit stride, if this view has unit column stride.
    #[inline]
    pub(crate) fn contiguous_row(&self, i: usize) -> Option<&'a [f32]> {
        if self.col_stride != 1 {
            return None;
        }
        let start = self.offset + i * self.row_stride;
        Some(&self.data[start..start + self.cols])
    }

    /// `len` elements of column `j` starting at row `i0`, if rows are
    /// adjacent in memory.
    #[inline]
    pub(crate) fn contiguous_col(&self, i0: usize, j: usize, len: usize) -> Option<&'a [f32]> {
        if self.row_stride != 1 {
            return None;
        }
        let start = self.offset + i0 + j * self.col_stride;
        Some(&self.data[start..start + len])
    }
}

/// Mutable view of the output matrix C.
///
/// Columns are contiguous; `row_stride` is the distance between rows and
/// must be at least `cols` so that no two elements share an address.
#[derive(Debug)]
pub struct MatrixMut<'a> {
    data: &'a mut [f32],
    rows: usize,
    cols: usize,
    row_stride: usize,
}

impl<'a> MatrixMut<'a> {
    pub fn new(data: &'a mut [f32], rows: usize, cols: usize, row_stride: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GemmError::InvalidDimensions(format!(
                "output is {rows}x{cols}, both dimensions must be positive"
            )));
        }
        if rows > 1 && row_stride < cols {
            return Err(GemmError::UnsupportedLayout(format!(
                "output row stride {row_stride} is smaller than its {cols} columns, rows would overlap"
            )));
        }
        let required = span(rows, cols, row_stride, 1).unwrap_or(usize::MAX);
        if required > data.len() {
            return Err(GemmError::OutOfBounds {
                what: "output",
                required,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            rows,
            cols,
            row_stride,
        })
    }

    /// Dense row-major output (`row_stride = cols`).
    pub fn row_major(data: &'a mut [f32], rows: usize, cols: usize) -> Result<Self> {
        Self::new(data, rows, cols, cols)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.row_stride + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        self.data[i * self.row_stride + j] = value;
    }

    /// Base pointer of element `(0, 0)`.
    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut f32 {
        self.data.as_mut_ptr()
    }
}
